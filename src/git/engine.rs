//! Production version-control engine

use crate::error::GitFrontError;
use crate::git::VcsEngine;
use crate::process::run_bounded;
use anyhow::{Context as _, Result};
use git2::{ErrorCode, Repository};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default bound for a single `git` invocation
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Engine backed by libgit2 for metadata and by the `git` executable for
/// porcelain commands libgit2 does not offer (`sparse-checkout`, `lfs`,
/// network operations)
#[derive(Debug, Clone)]
pub struct GitEngine {
    timeout: Duration,
}

impl GitEngine {
    /// Create an engine whose subprocesses are bounded by `timeout`
    #[must_use]
    #[inline]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for GitEngine {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl VcsEngine for GitEngine {
    fn is_repository(&self, path: &Path) -> bool {
        Repository::open(path).is_ok()
    }

    fn init(&self, path: &Path) -> Result<()> {
        Repository::init(path).map_err(|e| {
            GitFrontError::repository_init(format!(
                "Failed to initialize repository at {}: {}",
                path.display(),
                e.message()
            ))
        })?;
        debug!("Initialized repository at {}", path.display());
        Ok(())
    }

    fn config_value(&self, path: &Path, key: &str) -> Result<Option<String>> {
        let read_error = |e: git2::Error| {
            GitFrontError::config_read(format!("Failed to read '{key}': {}", e.message()))
        };

        let repo = Repository::open(path).map_err(read_error)?;
        // Typed getters only work on a snapshot of a live config
        let snapshot = repo
            .config()
            .and_then(|mut config| config.snapshot())
            .map_err(read_error)?;

        match snapshot.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(read_error(e).into()),
        }
    }

    fn set_config_value(&self, path: &Path, key: &str, value: &str) -> Result<()> {
        let write_error = |e: git2::Error| {
            GitFrontError::engine_command(format!(
                "Failed to set '{key}' in {}: {}",
                path.display(),
                e.message()
            ))
        };

        let repo = Repository::open(path).map_err(write_error)?;
        let mut config = repo.config().map_err(write_error)?;
        config.set_str(key, value).map_err(write_error)?;
        Ok(())
    }

    fn run_raw(&self, path: &Path, args: &[&str]) -> Result<String> {
        let output = run_bounded("git", args, Some(path), self.timeout)?;

        if !output.success() {
            return Err(GitFrontError::engine_command(format!(
                "git {} failed with exit code {}: {}",
                args.join(" "),
                output.status.code().unwrap_or(-1),
                output.stderr.trim()
            ))
            .into());
        }

        Ok(output.stdout)
    }
}

/// Check if Git is available and meets minimum version requirements
///
/// # Errors
///
/// Returns an error if:
/// - The Git command is not found
/// - The Git command failed to execute properly
/// - The Git version is too old
#[inline]
pub fn check_git_availability() -> Result<()> {
    let output = run_bounded("git", &["--version"], None, Duration::from_secs(10))
        .context("Git command not found. Please ensure Git is installed and available in PATH")?;

    if !output.success() {
        return Err(
            GitFrontError::engine_command("Git command failed to execute properly").into(),
        );
    }

    // `sparse-checkout set --no-cone` and `reapply` need Git 2.27+
    if let Some(version_part) = output.stdout.split_whitespace().nth(2)
        && let Ok(version) = parse_git_version(version_part)
        && version < (2, 27, 0)
    {
        return Err(GitFrontError::engine_command(format!(
            "Git version {version_part} is too old. gitfront requires Git 2.27.0 or later for sparse checkout support"
        ))
        .into());
    }

    Ok(())
}

/// Parse Git version string into tuple (major, minor, patch)
///
/// # Errors
///
/// Returns an error if the version string is invalid
#[inline]
pub fn parse_git_version(version: &str) -> Result<(u32, u32, u32)> {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() >= 3 {
        let major = parts[0].parse().context("Invalid major version")?;
        let minor = parts[1].parse().context("Invalid minor version")?;
        // Vendor builds append suffixes such as "2.39.3 (Apple Git-146)"
        let patch_digits: String = parts[2].chars().take_while(char::is_ascii_digit).collect();
        let patch = patch_digits.parse().context("Invalid patch version")?;
        Ok((major, minor, patch))
    } else {
        Err(anyhow::anyhow!("Invalid version format"))
    }
}
