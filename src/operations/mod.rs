//! Operations module
//!
//! Each subcommand maps to one operation here. Operations share a
//! [`RepoContext`] that ties the settings, the filesystem, and the engine to
//! one repository root.

pub mod files;
pub mod lfs;
pub mod ssh;
pub mod sync;
pub mod tree;

pub use files::*;
pub use lfs::*;
pub use ssh::*;
pub use sync::*;
pub use tree::*;

use crate::config::Settings;
use crate::git::ops::RepoOps;
use crate::git::{SparseCheckoutManager, VcsEngine};
use crate::guard::PathGuard;
use crate::system::System;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Everything an operation needs to act on the configured repository
pub struct RepoContext<'src> {
    system: &'src dyn System,
    engine: &'src dyn VcsEngine,
    settings: &'src Settings,
    guard: PathGuard,
}

impl<'src> RepoContext<'src> {
    /// Bind `settings` to a filesystem and an engine
    ///
    /// # Errors
    ///
    /// Returns an error if the repository root cannot be resolved.
    #[inline]
    pub fn new(
        system: &'src dyn System,
        engine: &'src dyn VcsEngine,
        settings: &'src Settings,
    ) -> Result<Self> {
        let root = settings.repo_root(system)?;
        Ok(Self {
            system,
            engine,
            settings,
            guard: PathGuard::new(root),
        })
    }

    #[must_use]
    #[inline]
    pub fn system(&self) -> &'src dyn System {
        self.system
    }

    #[must_use]
    #[inline]
    pub fn engine(&self) -> &'src dyn VcsEngine {
        self.engine
    }

    #[must_use]
    #[inline]
    pub fn settings(&self) -> &'src Settings {
        self.settings
    }

    #[must_use]
    #[inline]
    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    #[must_use]
    #[inline]
    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    /// Git porcelain bound to the repository root
    #[must_use]
    #[inline]
    pub fn ops(&self) -> RepoOps<'_> {
        RepoOps::new(self.engine, self.guard.root())
    }

    /// Sparse-checkout manager for the repository root
    #[must_use]
    #[inline]
    pub fn sparse(&self) -> SparseCheckoutManager<'src> {
        SparseCheckoutManager::new(self.system, self.engine, self.guard.root())
    }

    /// Whether the configured remote exists in the repository
    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.engine.is_repository(self.root())
            && self.ops().remote_url(&self.settings.remote_name).is_some()
    }

    /// Repository-relative, forward-slash form of a resolved path
    #[must_use]
    pub fn relative_git_path(&self, resolved: &Path) -> String {
        resolved
            .strip_prefix(self.root())
            .map(crate::utils::path::to_git_path)
            .unwrap_or_default()
    }

    /// Stage `pathspec`, commit if anything changed, and push when a remote
    /// is configured
    ///
    /// Returns whether a commit was made.
    ///
    /// # Errors
    ///
    /// Returns `GitFrontError::EngineCommand` if any git step fails.
    pub fn publish(&self, pathspec: &str, message: &str) -> Result<bool> {
        let ops = self.ops();
        ops.add(pathspec)?;
        let committed = ops.commit_if_changed(message)?;

        if !committed {
            return Ok(false);
        }

        if self.has_remote() {
            ops.push(&self.settings.remote_name, &self.settings.default_branch)?;
        } else {
            info!("No remote '{}' configured, skipping push", self.settings.remote_name);
        }
        Ok(true)
    }

    /// Commit message to use when the caller supplied none
    #[must_use]
    pub fn message_or_default<'msg>(&'msg self, message: Option<&'msg str>) -> &'msg str {
        match message.map(str::trim) {
            Some(message) if !message.is_empty() => message,
            _ => {
                debug!("Using default commit message");
                &self.settings.default_commit_message
            }
        }
    }

    /// Absolute install directory from the settings
    ///
    /// # Errors
    ///
    /// Returns `GitFrontError::Configuration` if `install_path` is not set.
    #[inline]
    pub fn install_root(&self) -> Result<PathBuf> {
        self.settings.install_root(self.system)
    }
}
