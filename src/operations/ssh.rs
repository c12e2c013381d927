//! SSH key management for the configured git host

use crate::config::SshSettings;
use crate::config::validation::{CompiledRegex, compiled};
use crate::error::GitFrontError;
use crate::process::run_bounded;
use crate::system::System;
use anyhow::Result;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

const SSH_DIR_MODE: u32 = 0o700;
const SSH_CONFIG_MODE: u32 = 0o600;

static EMAIL: CompiledRegex =
    LazyLock::new(|| Regex::new(r#"^[^\s@"']+@[^\s@"']+\.[^\s@"']+$"#));

/// Produces a key pair at a path
pub trait KeyGenerator {
    /// Write the private key to `key_path` and the public key to
    /// `key_path.pub`
    ///
    /// # Errors
    ///
    /// Returns an error if the key pair cannot be generated.
    fn generate(&self, key_path: &Path, email: &str) -> Result<()>;
}

/// [`KeyGenerator`] backed by the `ssh-keygen` executable
#[derive(Debug, Clone)]
pub struct SshKeygen {
    timeout: Duration,
}

impl SshKeygen {
    #[must_use]
    #[inline]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl KeyGenerator for SshKeygen {
    fn generate(&self, key_path: &Path, email: &str) -> Result<()> {
        let key_path = key_path.to_string_lossy().into_owned();
        let args = ["-t", "rsa", "-C", email, "-f", key_path.as_str(), "-N", ""];
        let output = run_bounded("ssh-keygen", &args, None, self.timeout)?;

        if !output.success() {
            return Err(GitFrontError::engine_command(format!(
                "ssh-keygen failed with exit code {}: {}",
                output.status.code().unwrap_or(-1),
                output.stderr.trim()
            ))
            .into());
        }
        Ok(())
    }
}

/// Answer of `ssh-keygen` and `ssh-public-key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SshKey {
    pub key_path: PathBuf,
    pub public_key: String,
}

/// `~/.ssh`
///
/// # Errors
///
/// Returns `GitFrontError::Configuration` if the home directory is unknown.
pub fn ssh_dir(system: &dyn System) -> Result<PathBuf> {
    let home = system.home_dir().map_err(|e| {
        GitFrontError::configuration(format!("Cannot determine home directory: {e}"))
    })?;
    Ok(home.join(".ssh"))
}

/// Host block pointing `ssh.host` at the configured key
#[must_use]
pub fn host_block(ssh: &SshSettings, key_path: &Path) -> String {
    format!(
        "# {host}\n\
        Host {host}\n\
        HostName {host}\n\
        PreferredAuthentications publickey\n\
        IdentityFile {key}\n",
        host = ssh.host,
        key = key_path.display()
    )
}

/// Make sure `<ssh_dir>/config` has a `Host` block for the configured host
///
/// Returns `true` when the file was created or extended. An existing block
/// for the host is left untouched, whatever it contains.
///
/// # Errors
///
/// Returns `GitFrontError::FileIo` if the file cannot be read or written.
pub fn ensure_ssh_config(system: &dyn System, ssh_dir: &Path, ssh: &SshSettings) -> Result<bool> {
    let config_path = ssh_dir.join("config");
    let block = host_block(ssh, &ssh_dir.join(&ssh.key_name));
    let io_error = |e: std::io::Error| {
        GitFrontError::file_io(format!("Failed to update {}: {e}", config_path.display()))
    };

    if !system.exists(&config_path) {
        system.write(&config_path, block.as_bytes()).map_err(io_error)?;
        system
            .set_mode(&config_path, SSH_CONFIG_MODE)
            .map_err(io_error)?;
        info!("Created SSH config with a block for {}", ssh.host);
        return Ok(true);
    }

    let existing = system.read_to_string(&config_path).map_err(io_error)?;
    let host_line = format!("Host {}", ssh.host);
    if existing.lines().any(|line| line.trim() == host_line) {
        debug!("SSH config already has a block for {}", ssh.host);
        return Ok(false);
    }

    let updated = format!("{}\n\n{block}", existing.trim_end());
    system.write(&config_path, updated.as_bytes()).map_err(io_error)?;
    info!("Added a block for {} to the SSH config", ssh.host);
    Ok(true)
}

/// Generate the configured key pair and return the public key
///
/// `~/.ssh` is created with mode 0700 and the SSH config gains a host block
/// for the configured host. An existing key is only replaced with `force`.
///
/// # Errors
///
/// Returns an error if:
/// - The email address is malformed (`Configuration`)
/// - The key exists and `force` is not set (`Configuration`)
/// - The directory, config, or key files cannot be written (`FileIo`)
/// - The generator fails
pub fn generate_key(
    system: &dyn System,
    generator: &dyn KeyGenerator,
    ssh: &SshSettings,
    email: &str,
    force: bool,
) -> Result<SshKey> {
    validate_email(email)?;

    let dir = ssh_dir(system)?;
    if !system.exists(&dir) {
        system.create_dir_all(&dir).map_err(|e| {
            GitFrontError::file_io(format!("Failed to create {}: {e}", dir.display()))
        })?;
        system.set_mode(&dir, SSH_DIR_MODE).map_err(|e| {
            GitFrontError::file_io(format!("Failed to restrict {}: {e}", dir.display()))
        })?;
        info!("Created {}", dir.display());
    }

    ensure_ssh_config(system, &dir, ssh)?;

    let key_path = dir.join(&ssh.key_name);
    let public_path = public_key_path(&key_path);
    if system.exists(&key_path) {
        if !force {
            return Err(GitFrontError::configuration(format!(
                "SSH key already exists at {}; pass --force to replace it",
                key_path.display()
            ))
            .into());
        }
        for path in [&key_path, &public_path] {
            if system.exists(path) {
                system.remove_file(path).map_err(|e| {
                    GitFrontError::file_io(format!("Failed to remove {}: {e}", path.display()))
                })?;
            }
        }
        debug!("Removed previous key pair at {}", key_path.display());
    }

    generator.generate(&key_path, email)?;
    info!("Generated SSH key {}", key_path.display());

    read_public_key(system, ssh)
}

/// Read the configured public key
///
/// # Errors
///
/// Returns `GitFrontError::FileIo` if no key has been generated yet.
pub fn read_public_key(system: &dyn System, ssh: &SshSettings) -> Result<SshKey> {
    let key_path = ssh_dir(system)?.join(&ssh.key_name);
    let public_path = public_key_path(&key_path);

    if !system.exists(&public_path) {
        return Err(GitFrontError::file_io(format!(
            "Public key not found at {}; generate one with `gitfront ssh-keygen` first",
            public_path.display()
        ))
        .into());
    }

    let public_key = system.read_to_string(&public_path).map_err(|e| {
        GitFrontError::file_io(format!("Failed to read {}: {e}", public_path.display()))
    })?;

    Ok(SshKey {
        key_path,
        public_key: public_key.trim().to_owned(),
    })
}

fn public_key_path(key_path: &Path) -> PathBuf {
    let mut name = key_path.as_os_str().to_owned();
    name.push(".pub");
    PathBuf::from(name)
}

fn validate_email(email: &str) -> Result<()> {
    if !compiled(&EMAIL)?.is_match(email) {
        return Err(
            GitFrontError::configuration(format!("Invalid email address: '{email}'")).into(),
        );
    }
    Ok(())
}
