//! Path guard for repository-relative input
//!
//! Every path a caller hands to gitfront (a workspace, a file to write, a
//! folder to create or delete) goes through this module before it touches the
//! disk. Containment is checked component-wise, so `/repository` is never
//! considered inside `/repo`, and [`PathGuard::resolve_real`] additionally
//! compares canonical paths to catch symlinks that point out of the root.

use crate::error::GitFrontError;
use crate::system::System;
use crate::utils::path::{normalize_path, normalize_separators};
use anyhow::Result;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Resolves caller input against a fixed repository root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Create a guard for the given repository root
    #[must_use]
    #[inline]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: normalize_path(root.as_ref()),
        }
    }

    /// The normalized repository root
    #[must_use]
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join `relative` onto the root, normalize it, and require that the
    /// result stays inside the root
    ///
    /// An empty input resolves to the root itself.
    ///
    /// # Errors
    ///
    /// Returns `GitFrontError::PathTraversal` if the normalized path leaves
    /// the repository root.
    #[inline]
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let cleaned = normalize_separators(relative);
        let joined = normalize_path(&self.root.join(&cleaned));

        if !is_within_root(&self.root, &joined) {
            return Err(GitFrontError::path_traversal(format!(
                "'{relative}' resolves to '{}', outside of repository root '{}'",
                joined.display(),
                self.root.display()
            ))
            .into());
        }

        debug!("Resolved '{relative}' to {}", joined.display());
        Ok(joined)
    }

    /// Like [`PathGuard::resolve`], then compare the canonical form of the
    /// deepest existing ancestor of the target with the canonical root
    ///
    /// # Errors
    ///
    /// Returns `GitFrontError::PathTraversal` if either check fails.
    #[inline]
    pub fn resolve_real(&self, system: &dyn System, relative: &str) -> Result<PathBuf> {
        let resolved = self.resolve(relative)?;

        let Ok(canonical_root) = system.canonicalize(&self.root) else {
            // Nothing on disk yet, so nothing can be a symlink out of it
            return Ok(resolved);
        };

        let existing = resolved
            .ancestors()
            .find(|ancestor| system.exists(ancestor))
            .unwrap_or(self.root.as_path());

        if let Ok(canonical) = system.canonicalize(existing)
            && !is_within_root(&canonical_root, &canonical)
        {
            return Err(GitFrontError::path_traversal(format!(
                "'{relative}' passes through '{}', which resolves outside of repository root '{}'",
                existing.display(),
                canonical_root.display()
            ))
            .into());
        }

        Ok(resolved)
    }
}

/// Check whether `candidate` is `root` or one of its descendants
///
/// Both paths are compared component by component after lexical
/// normalization.
#[must_use]
#[inline]
pub fn is_within_root(root: &Path, candidate: &Path) -> bool {
    normalize_path(candidate).starts_with(normalize_path(root))
}

/// Strip any leading run of `../` or `..\` from a single path component
///
/// Only the literal prefix is removed; traversal embedded later in the name is
/// left for [`PathGuard::resolve`] to reject. A bare `..` becomes empty.
#[must_use]
pub fn sanitize_relative_segment(name: &str) -> String {
    let mut rest = name;
    loop {
        if let Some(stripped) = rest
            .strip_prefix("../")
            .or_else(|| rest.strip_prefix("..\\"))
        {
            rest = stripped;
        } else if rest == ".." {
            rest = "";
        } else {
            break;
        }
    }
    rest.to_owned()
}

/// Canonical form of a workspace string: forward slashes, no leading or
/// trailing separators, `.` segments removed
///
/// # Errors
///
/// Returns `GitFrontError::PathTraversal` if the workspace contains a `..`
/// segment after normalization.
pub fn normalize_workspace(workspace: &str) -> Result<String> {
    let unified = normalize_separators(workspace.trim());
    let trimmed = unified.trim_matches('/');
    let normalized = normalize_path(Path::new(trimmed));

    if normalized
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    {
        return Err(GitFrontError::path_traversal(format!(
            "Workspace '{workspace}' escapes the repository root"
        ))
        .into());
    }

    let segments: Vec<String> = normalized
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(segments.join("/"))
}
