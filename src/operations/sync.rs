//! Repository lifecycle and synchronization operations

use crate::config::validation::validate_remote_url;
use crate::error::GitFrontError;
use crate::git::SparseState;
use crate::git::ops::is_missing_remote_ref;
use crate::guard::normalize_workspace;
use crate::operations::RepoContext;
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// File committed to seed a remote that has no branch yet
pub const SEED_FILE: &str = "README.md";

/// Outcome of `init-repo`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoInitialized {
    pub root: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

/// Outcome of `sparse-update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SparseUpdate {
    /// Normalized workspace, empty for the repository root
    pub workspace: String,
    /// Whether the pattern file was rewritten
    pub changed: bool,
}

/// Outcome of `init-pull`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitPull {
    /// Whether the default branch was pulled from the remote
    pub pulled: bool,
    /// Whether the remote was empty and got a first commit instead
    pub seeded: bool,
}

/// Outcome of `safe-push`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushOutcome {
    pub committed: bool,
}

/// Answer of `workspace-info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceInfo {
    pub workspace: String,
    pub path: PathBuf,
    pub initialized: bool,
    pub sparse_state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    pub default_branch: String,
}

/// Create the repository if needed and point the remote at `remote_url`
/// (or the configured one)
///
/// # Errors
///
/// Returns an error if the URL is malformed, the repository cannot be
/// created, or the remote cannot be set.
pub fn init_repo(ctx: &RepoContext<'_>, remote_url: Option<&str>) -> Result<RepoInitialized> {
    ctx.sparse().ensure_repository()?;

    let remote_url = remote_url.or(ctx.settings().remote_url.as_deref());
    if let Some(url) = remote_url {
        validate_remote_url(url)?;
        ctx.ops().setup_remote(&ctx.settings().remote_name, url)?;
    }

    info!("Repository ready at {}", ctx.root().display());
    Ok(RepoInitialized {
        root: ctx.root().to_path_buf(),
        remote_url: remote_url.map(str::to_owned),
    })
}

/// Converge the sparse checkout on `workspace`
///
/// # Errors
///
/// See [`crate::git::SparseCheckoutManager::converge`].
pub fn sparse_update(ctx: &RepoContext<'_>, workspace: &str) -> Result<SparseUpdate> {
    let changed = ctx.sparse().converge(workspace)?;
    Ok(SparseUpdate {
        workspace: normalize_workspace(workspace)?,
        changed,
    })
}

/// Reset the sparse checkout so nothing is checked out
///
/// # Errors
///
/// See [`crate::git::SparseCheckoutManager::initialize_empty`].
pub fn sparse_init_empty(ctx: &RepoContext<'_>, workspace: &str) -> Result<SparseUpdate> {
    ctx.sparse().initialize_empty(workspace)?;
    Ok(SparseUpdate {
        workspace: normalize_workspace(workspace)?,
        changed: true,
    })
}

/// Reapply the existing patterns, then pull
///
/// The pattern file is left as it is; `workspace` is only checked against
/// the root. Use `sparse-update` to change what is checked out.
///
/// # Errors
///
/// Returns an error if the workspace escapes the root, no remote is
/// configured, or reapply or pull fails.
pub fn sparse_pull(ctx: &RepoContext<'_>, workspace: &str) -> Result<SparseUpdate> {
    let normalized = normalize_workspace(workspace)?;
    ctx.guard().resolve(&normalized)?;
    require_remote(ctx)?;

    ctx.sparse().reapply()?;
    ctx.ops()
        .pull(&ctx.settings().remote_name, &ctx.settings().default_branch)?;

    Ok(SparseUpdate {
        workspace: normalized,
        changed: false,
    })
}

/// Create the repository if needed and pull the default branch
///
/// When the remote has no such branch yet, commit a [`SEED_FILE`] and push
/// it with upstream tracking instead.
///
/// # Errors
///
/// Returns an error if no remote is configured, or if the pull fails for
/// any other reason than a missing remote branch.
pub fn init_pull(ctx: &RepoContext<'_>) -> Result<InitPull> {
    let settings = ctx.settings();

    if !ctx.engine().is_repository(ctx.root()) {
        ctx.sparse().ensure_repository()?;
        if let Some(url) = settings.remote_url.as_deref() {
            validate_remote_url(url)?;
            ctx.ops().setup_remote(&settings.remote_name, url)?;
        }
    }
    require_remote(ctx)?;

    let ops = ctx.ops();
    match ops.pull(&settings.remote_name, &settings.default_branch) {
        Ok(()) => Ok(InitPull {
            pulled: true,
            seeded: false,
        }),
        Err(err) if is_missing_remote_ref(&format!("{err:#}")) => {
            warn!(
                "Remote '{}' has no branch '{}', seeding it",
                settings.remote_name, settings.default_branch
            );
            seed_remote(ctx)?;
            Ok(InitPull {
                pulled: false,
                seeded: true,
            })
        }
        Err(err) => Err(err),
    }
}

fn seed_remote(ctx: &RepoContext<'_>) -> Result<()> {
    let settings = ctx.settings();
    let readme = ctx.root().join(SEED_FILE);

    if !ctx.system().exists(&readme) {
        let title = ctx
            .root()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        ctx.system()
            .write(&readme, format!("# {title}\n").as_bytes())
            .map_err(|e| {
                GitFrontError::file_io(format!("Failed to write {}: {e}", readme.display()))
            })?;
    }

    let ops = ctx.ops();
    ops.add(SEED_FILE)?;
    ops.commit_if_changed("Initial commit")?;
    ops.push_upstream(&settings.remote_name, &settings.default_branch)?;
    info!(
        "Seeded {}/{} with {SEED_FILE}",
        settings.remote_name, settings.default_branch
    );
    Ok(())
}

/// Pull, stage everything, commit if anything changed, and push
///
/// # Errors
///
/// Returns an error if no remote is configured or any git step fails.
pub fn safe_push(ctx: &RepoContext<'_>, message: Option<&str>) -> Result<PushOutcome> {
    require_remote(ctx)?;
    let settings = ctx.settings();
    let ops = ctx.ops();

    ops.pull(&settings.remote_name, &settings.default_branch)?;
    ops.add(".")?;
    let committed = ops.commit_if_changed(ctx.message_or_default(message))?;
    ops.push(&settings.remote_name, &settings.default_branch)?;

    Ok(PushOutcome { committed })
}

/// Describe the repository as seen from `workspace`
///
/// # Errors
///
/// Returns `GitFrontError::PathTraversal` if the workspace escapes the root.
pub fn workspace_info(ctx: &RepoContext<'_>, workspace: &str) -> Result<WorkspaceInfo> {
    let normalized = normalize_workspace(workspace)?;
    let path = ctx.guard().resolve(&normalized)?;

    let state = ctx.sparse().state();
    let initialized = state != SparseState::Uninitialized;
    let remote_url = initialized
        .then(|| ctx.ops().remote_url(&ctx.settings().remote_name))
        .flatten()
        .or_else(|| ctx.settings().remote_url.clone());

    Ok(WorkspaceInfo {
        workspace: normalized,
        path,
        initialized,
        sparse_state: match state {
            SparseState::Uninitialized => "uninitialized",
            SparseState::InitializedNoSparse => "initialized",
            SparseState::SparseConfigured => "sparse",
        },
        remote_url,
        default_branch: ctx.settings().default_branch.clone(),
    })
}

fn require_remote(ctx: &RepoContext<'_>) -> Result<()> {
    if ctx.has_remote() {
        return Ok(());
    }
    Err(GitFrontError::configuration(format!(
        "Remote '{}' is not configured; run `gitfront init-repo --remote-url <url>` first",
        ctx.settings().remote_name
    ))
    .into())
}
