//! Workspace-scoped sparse checkout
//!
//! [`SparseCheckoutManager`] converges `.git/info/sparse-checkout` of one
//! repository to the patterns implied by a requested workspace. The file is
//! only rewritten, and the engine only asked to `reapply`, when the content on
//! disk differs from what the workspace needs.
//!
//! Every mutating sequence holds the repository's entry in [`RepoLocks`] so
//! two callers converging the same repository cannot interleave their
//! read-compare-write steps.

use crate::error::GitFrontError;
use crate::git::VcsEngine;
use crate::guard::{PathGuard, normalize_workspace};
use crate::system::System;
use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, info};

/// Config key git uses to turn sparse checkout on
pub const SPARSE_CHECKOUT_KEY: &str = "core.sparseCheckout";

/// Ordered sparse-checkout patterns (non-cone syntax)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet(Vec<String>);

impl PatternSet {
    /// Patterns for a normalized workspace
    ///
    /// The root workspace (`""`) checks everything out. Any other workspace
    /// `W` yields `W/*` followed by `!/*`; that pair only covers direct
    /// children of `W` and is kept exactly as is.
    #[must_use]
    pub fn for_workspace(workspace: &str) -> Self {
        if workspace.is_empty() {
            Self(vec!["/*".to_owned()])
        } else {
            Self(vec![format!("{workspace}/*"), "!/*".to_owned()])
        }
    }

    /// Patterns that check nothing out
    #[must_use]
    pub fn exclude_all() -> Self {
        Self(vec!["!/*".to_owned()])
    }

    /// The patterns, in order
    #[must_use]
    #[inline]
    pub fn patterns(&self) -> &[String] {
        &self.0
    }

    /// File content: one pattern per line, no trailing newline
    #[must_use]
    pub fn serialize(&self) -> String {
        self.0.join("\n")
    }
}

/// Sparse-checkout lifecycle of a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparseState {
    /// No repository metadata yet
    Uninitialized,
    /// Repository exists but sparse checkout is off or has no pattern file
    InitializedNoSparse,
    /// Sparse checkout is on and the pattern file exists
    SparseConfigured,
}

/// Per-repository mutual exclusion
#[derive(Debug, Default)]
pub struct RepoLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl RepoLocks {
    /// Process-wide registry
    #[must_use]
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<RepoLocks>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::default())))
    }

    /// The lock guarding `root`, created on first use
    #[must_use]
    pub fn lock_for(&self, root: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(root.to_path_buf()).or_default())
    }
}

/// Converges the sparse-checkout configuration of one repository
pub struct SparseCheckoutManager<'src> {
    system: &'src dyn System,
    engine: &'src dyn VcsEngine,
    guard: PathGuard,
    locks: Arc<RepoLocks>,
}

impl<'src> SparseCheckoutManager<'src> {
    /// Create a manager for the repository at `root`, sharing the global lock
    /// registry
    #[must_use]
    pub fn new(system: &'src dyn System, engine: &'src dyn VcsEngine, root: &Path) -> Self {
        Self::with_locks(system, engine, root, RepoLocks::global())
    }

    /// Create a manager with an explicit lock registry
    #[must_use]
    pub fn with_locks(
        system: &'src dyn System,
        engine: &'src dyn VcsEngine,
        root: &Path,
        locks: Arc<RepoLocks>,
    ) -> Self {
        Self {
            system,
            engine,
            guard: PathGuard::new(root),
            locks,
        }
    }

    /// Repository root this manager works on
    #[must_use]
    #[inline]
    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    /// `<root>/.git/info/sparse-checkout`
    #[must_use]
    pub fn pattern_file(&self) -> PathBuf {
        self.info_dir().join("sparse-checkout")
    }

    fn info_dir(&self) -> PathBuf {
        self.root().join(".git").join("info")
    }

    /// Current lifecycle state, read without taking the lock
    #[must_use]
    pub fn state(&self) -> SparseState {
        if !self.engine.is_repository(self.root()) {
            return SparseState::Uninitialized;
        }
        if self.sparse_flag_enabled() && self.system.exists(&self.pattern_file()) {
            SparseState::SparseConfigured
        } else {
            SparseState::InitializedNoSparse
        }
    }

    /// Create the root directory and repository metadata if missing
    ///
    /// # Errors
    ///
    /// Returns `GitFrontError::RepositoryInit` if the directory or the
    /// metadata cannot be created.
    pub fn ensure_repository(&self) -> Result<()> {
        let lock = self.locks.lock_for(self.root());
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.ensure_repository_locked()
    }

    /// Bring the repository to the state a workspace asks for
    ///
    /// Returns `true` when the pattern file was rewritten and reapplied,
    /// `false` when it already matched.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The workspace escapes the repository (`PathTraversal`)
    /// - The repository cannot be created (`RepositoryInit`)
    /// - The pattern file cannot be read or written (`FileIo`)
    /// - An engine command fails (`EngineCommand`)
    pub fn converge(&self, workspace: &str) -> Result<bool> {
        let workspace = self.checked_workspace(workspace)?;
        let expected = PatternSet::for_workspace(&workspace).serialize();

        let lock = self.locks.lock_for(self.root());
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let created = self.prepare_locked()?;
        let existing = if created {
            String::new()
        } else {
            self.read_pattern_file()?
        };

        if existing.trim() == expected {
            debug!(
                "Sparse checkout already matches workspace '{}'",
                display_workspace(&workspace)
            );
            return Ok(false);
        }

        self.write_pattern_file(&expected)?;
        self.reapply_locked()?;
        info!(
            "Updated sparse checkout for workspace '{}'",
            display_workspace(&workspace)
        );
        Ok(true)
    }

    /// Reset the repository so nothing is checked out
    ///
    /// Always writes `!/*` and always reapplies, whatever the file held before.
    ///
    /// # Errors
    ///
    /// Same as [`SparseCheckoutManager::converge`].
    pub fn initialize_empty(&self, workspace: &str) -> Result<()> {
        let workspace = self.checked_workspace(workspace)?;

        let lock = self.locks.lock_for(self.root());
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.prepare_locked()?;
        self.write_pattern_file(&PatternSet::exclude_all().serialize())?;
        self.reapply_locked()?;
        info!(
            "Reset sparse checkout to an empty tree (requested for '{}')",
            display_workspace(&workspace)
        );
        Ok(())
    }

    /// Ask the engine to re-evaluate the pattern file against the work tree
    ///
    /// # Errors
    ///
    /// Returns `GitFrontError::EngineCommand` if the engine fails.
    pub fn reapply(&self) -> Result<()> {
        let lock = self.locks.lock_for(self.root());
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.reapply_locked()
    }

    fn checked_workspace(&self, workspace: &str) -> Result<String> {
        let normalized = normalize_workspace(workspace)?;
        self.guard.resolve(&normalized)?;
        Ok(normalized)
    }

    /// Repository, flag and pattern file, in that order; returns whether the
    /// pattern file was created by this call
    fn prepare_locked(&self) -> Result<bool> {
        self.ensure_repository_locked()?;
        self.enable_sparse_checkout_locked()?;
        self.ensure_pattern_file_locked()
    }

    fn ensure_repository_locked(&self) -> Result<()> {
        let root = self.root();

        if !self.system.exists(root) {
            self.system.create_dir_all(root).map_err(|e| {
                GitFrontError::repository_init(format!(
                    "Failed to create repository directory {}: {e}",
                    root.display()
                ))
            })?;
            info!("Created repository directory: {}", root.display());
        }

        if self.engine.is_repository(root) {
            debug!("Repository already initialized at {}", root.display());
        } else {
            self.engine.init(root)?;
            info!("Initialized repository at {}", root.display());
        }

        Ok(())
    }

    fn sparse_flag_enabled(&self) -> bool {
        match self.engine.config_value(self.root(), SPARSE_CHECKOUT_KEY) {
            Ok(value) => value.is_some_and(|v| v.trim() == "true"),
            Err(e) => {
                // Absent on a fresh repository; not worth failing over
                debug!("Treating {SPARSE_CHECKOUT_KEY} as disabled: {e}");
                false
            }
        }
    }

    fn enable_sparse_checkout_locked(&self) -> Result<()> {
        if self.sparse_flag_enabled() {
            debug!("Sparse checkout already enabled");
            return Ok(());
        }
        self.engine
            .set_config_value(self.root(), SPARSE_CHECKOUT_KEY, "true")?;
        info!("Enabled sparse checkout");
        Ok(())
    }

    fn ensure_pattern_file_locked(&self) -> Result<bool> {
        let info_dir = self.info_dir();
        if !self.system.exists(&info_dir) {
            self.system.create_dir_all(&info_dir).map_err(|e| {
                GitFrontError::file_io(format!(
                    "Failed to create {}: {e}",
                    info_dir.display()
                ))
            })?;
        }

        if self.system.exists(&self.pattern_file()) {
            return Ok(false);
        }

        self.engine
            .run_raw(self.root(), &["sparse-checkout", "set", "--no-cone"])?;
        info!("Initialized sparse-checkout pattern file");
        Ok(true)
    }

    fn read_pattern_file(&self) -> Result<String> {
        let path = self.pattern_file();
        self.system.read_to_string(&path).map_err(|e| {
            GitFrontError::file_io(format!("Failed to read {}: {e}", path.display())).into()
        })
    }

    fn write_pattern_file(&self, content: &str) -> Result<()> {
        let path = self.pattern_file();
        self.system.write(&path, content.as_bytes()).map_err(|e| {
            GitFrontError::file_io(format!("Failed to write {}: {e}", path.display()))
        })?;
        debug!("Wrote sparse-checkout patterns: {content:?}");
        Ok(())
    }

    fn reapply_locked(&self) -> Result<()> {
        self.engine
            .run_raw(self.root(), &["sparse-checkout", "reapply"])?;
        debug!("Reapplied sparse checkout");
        Ok(())
    }
}

fn display_workspace(workspace: &str) -> &str {
    if workspace.is_empty() { "<root>" } else { workspace }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_set_for_workspace() {
        assert_eq!(PatternSet::for_workspace("").patterns(), ["/*"]);
        assert_eq!(
            PatternSet::for_workspace("docs").patterns(),
            ["docs/*", "!/*"]
        );
        assert_eq!(
            PatternSet::for_workspace("docs/api").serialize(),
            "docs/api/*\n!/*"
        );
        assert_eq!(PatternSet::exclude_all().serialize(), "!/*");
    }

    #[test]
    fn test_repo_locks_share_per_root() {
        let locks = RepoLocks::default();
        let a = locks.lock_for(Path::new("/repo"));
        let b = locks.lock_for(Path::new("/repo"));
        let c = locks.lock_for(Path::new("/other"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
