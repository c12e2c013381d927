//! Guarded file operations inside the repository

use crate::error::GitFrontError;
use crate::guard::sanitize_relative_segment;
use crate::operations::RepoContext;
use crate::utils::fs::{create_parent_directories, ensure_dir_exists};
use crate::utils::path::to_git_path;
use anyhow::{Context as _, Result};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Marker file that lets git track an otherwise empty folder
pub const FOLDER_MARKER: &str = ".myignore";

/// Outcome of `write-file` and `delete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    /// Repository-relative path
    pub path: String,
    /// Whether a commit was made
    pub committed: bool,
}

/// Outcome of `create-folder`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderCreated {
    pub path: String,
    /// Whether commit and push both succeeded
    pub published: bool,
}

/// Outcome of `copy-to-install`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledFile {
    pub source: String,
    pub destination: PathBuf,
}

/// Outcome of `upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    /// Repository-relative path of the copy
    pub path: String,
    pub committed: bool,
}

/// Write `content` to a repository-relative file, then commit and push
///
/// # Errors
///
/// Returns an error if:
/// - The path is empty, targets `.git`, or escapes the root
/// - The file cannot be written (`FileIo`)
/// - A git step fails (`EngineCommand`)
pub fn write_file(
    ctx: &RepoContext<'_>,
    path: &str,
    content: &str,
    message: Option<&str>,
) -> Result<FileChange> {
    let target = resolve_entry(ctx, path)?;
    ctx.sparse().ensure_repository()?;

    if ctx.system().is_dir(&target) {
        return Err(GitFrontError::file_io(format!(
            "Cannot write file, path is a directory: {}",
            target.display()
        ))
        .into());
    }

    create_parent_directories(ctx.system(), &target)?;
    ctx.system()
        .write(&target, content.as_bytes())
        .map_err(|e| {
            GitFrontError::file_io(format!("Failed to write {}: {e}", target.display()))
        })?;
    info!("Wrote {} bytes to {}", content.len(), target.display());

    let relative = ctx.relative_git_path(&target);
    let committed = ctx.publish(&relative, ctx.message_or_default(message))?;

    Ok(FileChange {
        path: relative,
        committed,
    })
}

/// Create a folder under `base_dir` and publish it with a marker file
///
/// Leading `../` runs are stripped from `name` before the result goes
/// through the path guard. Commit and push failures are logged and reported
/// in [`FolderCreated::published`]; the folder itself is kept.
///
/// # Errors
///
/// Returns an error if:
/// - `name` is empty after sanitizing (`Configuration`)
/// - The folder would land outside the root (`PathTraversal`)
/// - The folder or marker cannot be created (`FileIo`)
pub fn create_folder(
    ctx: &RepoContext<'_>,
    name: &str,
    base_dir: Option<&str>,
) -> Result<FolderCreated> {
    let sanitized = sanitize_relative_segment(name.trim());
    if sanitized.trim_matches(['/', '\\']).is_empty() {
        return Err(GitFrontError::configuration(format!(
            "Folder name '{name}' is empty after removing parent references"
        ))
        .into());
    }
    if sanitized != name.trim() {
        debug!("Sanitized folder name '{name}' to '{sanitized}'");
    }

    let relative = match base_dir.map(str::trim).filter(|base| !base.is_empty()) {
        Some(base) => format!("{}/{sanitized}", base.trim_end_matches(['/', '\\'])),
        None => sanitized,
    };
    let folder = resolve_entry(ctx, &relative)?;
    ctx.sparse().ensure_repository()?;

    ensure_dir_exists(ctx.system(), &folder)?;
    let marker = folder.join(FOLDER_MARKER);
    if !ctx.system().exists(&marker) {
        ctx.system().write(&marker, b"").map_err(|e| {
            GitFrontError::file_io(format!("Failed to create {}: {e}", marker.display()))
        })?;
    }
    info!("Created folder {}", folder.display());

    let relative = ctx.relative_git_path(&folder);
    let message = format!("Add folder {relative}");
    let published = match ctx.publish(&relative, &message) {
        Ok(_) => true,
        Err(e) => {
            warn!("Folder created but not published: {e:#}");
            false
        }
    };

    Ok(FolderCreated {
        path: relative,
        published,
    })
}

/// Delete a repository-relative file or folder, then commit and push
///
/// # Errors
///
/// Returns an error if:
/// - The path is empty, targets `.git`, or escapes the root
/// - Nothing exists at the path, or removal fails (`FileIo`)
/// - A git step fails (`EngineCommand`)
pub fn delete_path(
    ctx: &RepoContext<'_>,
    path: &str,
    message: Option<&str>,
) -> Result<FileChange> {
    let target = resolve_entry(ctx, path)?;
    let system = ctx.system();

    if !system.exists(&target) {
        return Err(GitFrontError::file_io(format!(
            "Nothing to delete at {}",
            target.display()
        ))
        .into());
    }

    let removed = if system.is_dir(&target) {
        system.remove_dir_all(&target)
    } else {
        system.remove_file(&target)
    };
    removed.map_err(|e| {
        GitFrontError::file_io(format!("Failed to delete {}: {e}", target.display()))
    })?;
    info!("Deleted {}", target.display());

    let relative = ctx.relative_git_path(&target);
    let committed = ctx.publish(&relative, ctx.message_or_default(message))?;

    Ok(FileChange {
        path: relative,
        committed,
    })
}

/// Check out the directory holding `source`, pull, and copy the file to the
/// configured install directory
///
/// # Errors
///
/// Returns an error if:
/// - `install_path` is not configured (`Configuration`)
/// - The source escapes the root or is not a file
/// - Sparse checkout, pull or the copy fails
pub fn copy_to_install(ctx: &RepoContext<'_>, source: &str) -> Result<InstalledFile> {
    let install_root = ctx.install_root()?;
    let resolved = resolve_entry(ctx, source)?;

    let relative = ctx.relative_git_path(&resolved);
    let workspace = Path::new(&relative)
        .parent()
        .map(to_git_path)
        .unwrap_or_default();

    let sparse = ctx.sparse();
    if !sparse.converge(&workspace)? {
        sparse.reapply()?;
    }
    if ctx.has_remote() {
        ctx.ops()
            .pull(&ctx.settings().remote_name, &ctx.settings().default_branch)?;
    } else {
        debug!("No remote configured, using the local checkout");
    }

    if !ctx.system().is_file(&resolved) {
        return Err(GitFrontError::file_io(format!(
            "Source is not a file after checkout: {}",
            resolved.display()
        ))
        .into());
    }

    let file_name = resolved.file_name().with_context(|| {
        format!("Source has no file name: {}", resolved.display())
    })?;
    ensure_dir_exists(ctx.system(), &install_root)?;
    let destination = install_root.join(file_name);

    ctx.system().copy(&resolved, &destination).map_err(|e| {
        GitFrontError::file_io(format!(
            "Failed to copy {} to {}: {e}",
            resolved.display(),
            destination.display()
        ))
    })?;
    info!("Installed {} to {}", relative, destination.display());

    Ok(InstalledFile {
        source: relative,
        destination,
    })
}

/// Pull, copy a local file into `target_dir`, then commit and push it
///
/// The copy keeps the source's file name. Without a caller message the
/// commit reads `<default_commit_message>: <file name>`.
///
/// # Errors
///
/// Returns an error if:
/// - `source` is not a readable file (`FileIo`)
/// - `target_dir` escapes the root or targets `.git`
/// - The pull, the copy, or publishing fails
pub fn upload_file(
    ctx: &RepoContext<'_>,
    source: &Path,
    target_dir: &str,
    message: Option<&str>,
) -> Result<UploadedFile> {
    let system = ctx.system();
    if !system.is_file(source) {
        return Err(GitFrontError::file_io(format!(
            "Upload source is not a file: {}",
            source.display()
        ))
        .into());
    }
    let file_name = source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            GitFrontError::configuration(format!(
                "Upload source has no usable file name: {}",
                source.display()
            ))
        })?;

    let target_dir = target_dir.trim();
    let folder = if target_dir.trim_matches(['/', '\\']).is_empty() {
        ctx.root().to_path_buf()
    } else {
        resolve_entry(ctx, target_dir)?
    };
    ctx.sparse().ensure_repository()?;

    if ctx.has_remote() {
        ctx.ops()
            .pull(&ctx.settings().remote_name, &ctx.settings().default_branch)?;
    } else {
        debug!("No remote configured, uploading without pulling");
    }

    ensure_dir_exists(system, &folder)?;
    let target = folder.join(file_name);
    if system.is_dir(&target) {
        return Err(GitFrontError::file_io(format!(
            "Cannot upload over a directory: {}",
            target.display()
        ))
        .into());
    }
    system.copy(source, &target).map_err(|e| {
        GitFrontError::file_io(format!(
            "Failed to copy {} to {}: {e}",
            source.display(),
            target.display()
        ))
    })?;
    info!("Uploaded {} to {}", source.display(), target.display());

    let relative = ctx.relative_git_path(&target);
    let message = match message.map(str::trim).filter(|m| !m.is_empty()) {
        Some(message) => message.to_owned(),
        None => format!("{}: {file_name}", ctx.settings().default_commit_message),
    };
    let committed = ctx.publish(&relative, &message)?;

    Ok(UploadedFile {
        path: relative,
        committed,
    })
}

/// Resolve a caller path that must name an entry below the root, never the
/// root itself or repository metadata
fn resolve_entry(ctx: &RepoContext<'_>, path: &str) -> Result<PathBuf> {
    let resolved = ctx.guard().resolve_real(ctx.system(), path)?;

    let relative = resolved.strip_prefix(ctx.root()).unwrap_or(Path::new(""));
    match relative.components().next() {
        None => Err(GitFrontError::configuration(format!(
            "'{path}' refers to the repository root"
        ))
        .into()),
        Some(Component::Normal(first)) if first == ".git" => Err(GitFrontError::path_traversal(
            format!("'{path}' points into repository metadata"),
        )
        .into()),
        Some(_) => Ok(resolved),
    }
}
