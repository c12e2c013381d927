//! Git operations module
//!
//! Defines the version-control capability gitfront drives, its production
//! adapter, an in-memory mock, and the sparse-checkout core built on top.

pub mod engine;
pub mod mock;
pub mod ops;
pub mod sparse_checkout;

pub use engine::*;
pub use mock::MockEngine;
pub use sparse_checkout::*;

use anyhow::Result;
use std::path::Path;

/// Version-control capability used by every repository operation
///
/// # Implementations
/// - `GitEngine`: libgit2 for probing, init and config; the `git` executable
///   for raw commands
/// - `MockEngine`: records calls and simulates results for tests
pub trait VcsEngine: Send + Sync {
    /// Whether `path` holds version-control metadata
    fn is_repository(&self, path: &Path) -> bool;

    /// Initialize a repository at `path`
    fn init(&self, path: &Path) -> Result<()>;

    /// Read a repository config value; `Ok(None)` when the key is unset
    fn config_value(&self, path: &Path, key: &str) -> Result<Option<String>>;

    /// Write a repository config value
    fn set_config_value(&self, path: &Path, key: &str, value: &str) -> Result<()>;

    /// Run a raw engine command in `path` and return its stdout
    fn run_raw(&self, path: &Path, args: &[&str]) -> Result<String>;
}
