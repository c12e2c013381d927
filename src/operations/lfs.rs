//! Git LFS setup

use crate::config::validation::validate_lfs_extension;
use crate::operations::RepoContext;
use anyhow::Result;
use serde::Serialize;

/// Outcome of `lfs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LfsConfigured {
    /// Extensions newly passed to `git lfs track`
    pub tracked: Vec<String>,
}

/// Install LFS in the repository and optionally track more extensions
///
/// # Errors
///
/// Returns `GitFrontError::Configuration` for an extension that does not
/// start with `.`, and `GitFrontError::EngineCommand` if git-lfs fails.
pub fn configure_lfs(ctx: &RepoContext<'_>, extensions: &[String]) -> Result<LfsConfigured> {
    for extension in extensions {
        validate_lfs_extension(extension)?;
    }

    ctx.sparse().ensure_repository()?;
    ctx.ops().lfs_track(extensions)?;

    Ok(LfsConfigured {
        tracked: extensions.to_vec(),
    })
}
