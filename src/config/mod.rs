//! Configuration management module
//!
//! Handles the `gitfront.yaml` settings file: YAML parsing, JSON schema
//! validation, semantic checks, and writing updates back.

pub mod schema;
pub mod validation;
pub mod yaml;

use crate::error::GitFrontError;
use crate::system::System;
use crate::utils::path::normalize_path;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings file used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "./gitfront.yaml";

/// Contents of `gitfront.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Root of the managed repository
    pub repo_path: String,

    /// Remote to pull from and push to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    #[serde(default = "default_remote_name")]
    pub remote_name: String,

    #[serde(default = "default_branch")]
    pub default_branch: String,

    #[serde(default = "default_commit_message")]
    pub default_commit_message: String,

    /// Destination directory for `copy-to-install`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_path: Option<String>,

    /// Upper bound for a single `git` or `ssh-keygen` invocation
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    #[serde(default)]
    pub ssh: SshSettings,
}

/// SSH key and host used for the remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshSettings {
    #[serde(default = "default_ssh_host")]
    pub host: String,

    /// File name of the key under `~/.ssh`
    #[serde(default = "default_ssh_key_name")]
    pub key_name: String,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            host: default_ssh_host(),
            key_name: default_ssh_key_name(),
        }
    }
}

fn default_remote_name() -> String {
    "origin".to_owned()
}

fn default_branch() -> String {
    "master".to_owned()
}

fn default_commit_message() -> String {
    "Updated".to_owned()
}

const fn default_command_timeout_secs() -> u64 {
    120
}

fn default_ssh_host() -> String {
    "gitee.com".to_owned()
}

fn default_ssh_key_name() -> String {
    "gitee_id_rsa".to_owned()
}

impl Settings {
    /// Settings with every optional field at its default
    #[must_use]
    pub fn new<S: Into<String>>(repo_path: S) -> Self {
        Self {
            repo_path: repo_path.into(),
            remote_url: None,
            remote_name: default_remote_name(),
            default_branch: default_branch(),
            default_commit_message: default_commit_message(),
            install_path: None,
            command_timeout_secs: default_command_timeout_secs(),
            ssh: SshSettings::default(),
        }
    }

    /// Load settings from file
    ///
    /// # Errors
    ///
    /// Returns `GitFrontError::Configuration` if the file is missing,
    /// malformed, or fails validation.
    #[inline]
    pub fn load_from_file(system: &dyn System, path: &str) -> Result<Self> {
        yaml::load_settings(system, path)
    }

    /// Write settings back to `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the file cannot be
    /// written.
    #[inline]
    pub fn save_to_file(&self, system: &dyn System, path: &str) -> Result<()> {
        yaml::save_settings(system, path, self)
    }

    /// Validate settings against the schema and semantic rules
    ///
    /// # Errors
    ///
    /// Returns `GitFrontError::Configuration` describing the first problem.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        validation::validate_settings(self)
    }

    /// Absolute, normalized repository root
    ///
    /// # Errors
    ///
    /// Returns an error if `repo_path` is relative and the working directory
    /// cannot be determined.
    pub fn repo_root(&self, system: &dyn System) -> Result<PathBuf> {
        absolutize(system, &self.repo_path)
    }

    /// Absolute install directory
    ///
    /// # Errors
    ///
    /// Returns `GitFrontError::Configuration` if `install_path` is not set.
    pub fn install_root(&self, system: &dyn System) -> Result<PathBuf> {
        let install_path = self.install_path.as_deref().ok_or_else(|| {
            GitFrontError::configuration("install_path is not set in the configuration file")
        })?;
        absolutize(system, install_path)
    }

    /// Subprocess timeout
    #[must_use]
    #[inline]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

fn absolutize(system: &dyn System, path: &str) -> Result<PathBuf> {
    let path = Path::new(path);
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = system.current_dir().map_err(|e| {
        GitFrontError::configuration(format!("Failed to determine working directory: {e}"))
    })?;
    Ok(normalize_path(&cwd.join(path)))
}
