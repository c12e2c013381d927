//! File system utilities

use crate::error::GitFrontError;
use crate::system::System;
use anyhow::Result;
use std::path::Path;

/// Create parent directories for a file path if they don't exist
pub fn create_parent_directories(system: &dyn System, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent()
        && !parent.as_os_str().is_empty()
        && !system.exists(parent)
    {
        system.create_dir_all(parent).map_err(|e| {
            GitFrontError::file_io(format!(
                "Failed to create parent directories for {}: {e}",
                file_path.display()
            ))
        })?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir_exists(system: &dyn System, dir_path: &Path) -> Result<()> {
    if !system.exists(dir_path) {
        system.create_dir_all(dir_path).map_err(|e| {
            GitFrontError::file_io(format!(
                "Failed to create directory {}: {e}",
                dir_path.display()
            ))
        })?;
    } else if !system.is_dir(dir_path) {
        return Err(GitFrontError::file_io(format!(
            "Path exists but is not a directory: {}",
            dir_path.display()
        ))
        .into());
    }
    Ok(())
}
