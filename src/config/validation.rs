//! Settings validation logic

use crate::config::Settings;
use crate::error::GitFrontError;
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

/// A pattern compiled on first use
pub type CompiledRegex = LazyLock<Result<Regex, regex::Error>>;

static REMOTE_URL_PATTERNS: LazyLock<Result<Vec<Regex>, regex::Error>> =
    LazyLock::new(|| {
        [
            r"^https?://\S+$",               // HTTPS: https://gitee.com/user/repo.git
            r"^ssh://\S+$",                  // SSH URL: ssh://git@host:22/user/repo.git
            r"^[\w.-]+@[\w.-]+:[\w./~-]+$", // SCP-like: git@gitee.com:user/repo.git
        ]
        .into_iter()
        .map(Regex::new)
        .collect()
    });

static REF_NAME: CompiledRegex =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]*$"));

static LFS_EXTENSION: CompiledRegex = LazyLock::new(|| Regex::new(r"^\.[A-Za-z0-9_]+$"));

/// Borrow a lazily compiled pattern, surfacing a compile failure as an error
///
/// # Errors
///
/// Returns the `regex::Error` the pattern failed to compile with.
pub fn compiled(regex: &'static CompiledRegex) -> Result<&'static Regex> {
    Ok(regex.as_ref().map_err(Clone::clone)?)
}

/// Validate complete settings
///
/// # Errors
///
/// Returns `GitFrontError::Configuration` if:
/// - `repo_path` is empty
/// - The remote URL is not a recognized git URL
/// - The remote name or default branch is not a valid ref name
/// - The command timeout is zero
/// - The SSH key name is not a plain file name
#[inline]
pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.repo_path.trim().is_empty() {
        return Err(GitFrontError::configuration("repo_path cannot be empty").into());
    }

    if let Some(url) = settings.remote_url.as_deref() {
        validate_remote_url(url)?;
    }

    validate_ref_name("remote_name", &settings.remote_name)?;
    validate_ref_name("default_branch", &settings.default_branch)?;

    if settings.default_commit_message.trim().is_empty() {
        return Err(
            GitFrontError::configuration("default_commit_message cannot be empty").into(),
        );
    }

    if settings.command_timeout_secs == 0 {
        return Err(
            GitFrontError::configuration("command_timeout_secs must be at least 1").into(),
        );
    }

    if settings.ssh.host.trim().is_empty() {
        return Err(GitFrontError::configuration("ssh.host cannot be empty").into());
    }

    let key_name = settings.ssh.key_name.as_str();
    if key_name.is_empty() || key_name.contains(['/', '\\']) || key_name.starts_with('.') {
        return Err(GitFrontError::configuration(format!(
            "ssh.key_name must be a plain file name, got '{key_name}'"
        ))
        .into());
    }

    Ok(())
}

/// Validate a remote URL format
///
/// # Errors
///
/// Returns `GitFrontError::Configuration` if the URL is not a supported
/// git remote.
#[inline]
pub fn validate_remote_url(url: &str) -> Result<()> {
    // Local paths are handed to git as-is
    if url.starts_with("file:") || url.starts_with('/') {
        return Ok(());
    }

    let patterns = REMOTE_URL_PATTERNS.as_ref().map_err(Clone::clone)?;
    if patterns.iter().any(|regex| regex.is_match(url)) {
        return Ok(());
    }

    Err(GitFrontError::configuration(format!(
        "Invalid remote URL format: '{url}'\n\
        Supported formats:\n\
        - HTTPS: https://gitee.com/my_organization/repo.git\n\
        - SSH: git@gitee.com:my_organization/repo.git\n\
        - Local: file:///path/to/repo or /path/to/repo"
    ))
    .into())
}

fn validate_ref_name(field: &str, value: &str) -> Result<()> {
    if !compiled(&REF_NAME)?.is_match(value) || value.contains("..") || value.ends_with('/') {
        return Err(GitFrontError::configuration(format!(
            "{field} is not a valid git ref name: '{value}'"
        ))
        .into());
    }
    Ok(())
}

/// Validate an extension handed to `lfs --add`
///
/// # Errors
///
/// Returns `GitFrontError::Configuration` unless the extension is a dot
/// followed by word characters, e.g. `.psd`.
#[inline]
pub fn validate_lfs_extension(extension: &str) -> Result<()> {
    if !extension.starts_with('.') {
        return Err(GitFrontError::configuration(format!(
            "LFS extension must start with '.', got '{extension}'"
        ))
        .into());
    }

    if !compiled(&LFS_EXTENSION)?.is_match(extension) {
        return Err(GitFrontError::configuration(format!(
            "Invalid LFS extension: '{extension}'"
        ))
        .into());
    }

    Ok(())
}
