//! CLI command implementations
//!
//! Every command produces a JSON value; printing is left to the caller.

use crate::cli::{Args, Command, ConfigCommand};
use crate::config::Settings;
use crate::config::validation::validate_remote_url;
use crate::error::GitFrontError;
use crate::git::{GitEngine, VcsEngine, check_git_availability};
use crate::operations::{
    RepoContext, SshKeygen, configure_lfs, copy_to_install, create_folder, delete_path,
    file_tree, generate_key, init_pull, init_repo, read_public_key, safe_push,
    sparse_init_empty, sparse_pull, sparse_update, upload_file, workspace_info, write_file,
};
use crate::system::System;
use anyhow::Result;
use serde_json::{Value, json};
use std::path::Path;
use tracing::{debug, info, warn};

/// Load settings, build the production engine, and run the command
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded, git is unavailable,
/// or the command fails.
pub fn execute(args: &Args, system: &dyn System) -> Result<Value> {
    if let Command::Config {
        action: ConfigCommand::SetRepoPath { path },
    } = &args.command
    {
        return set_repo_path(system, &args.config, path);
    }

    let settings = Settings::load_from_file(system, &args.config)?;
    if args.command.needs_git() {
        check_git_availability()?;
    }
    let engine = GitEngine::new(settings.command_timeout());

    execute_with(system, &engine, &settings, &args.config, &args.command)
}

/// Run `command` against explicit collaborators
///
/// # Errors
///
/// Returns the error of the underlying operation.
pub fn execute_with(
    system: &dyn System,
    engine: &dyn VcsEngine,
    settings: &Settings,
    config_path: &str,
    command: &Command,
) -> Result<Value> {
    let ctx = RepoContext::new(system, engine, settings)?;
    debug!("Running {command:?} against {}", ctx.root().display());

    let output = match command {
        Command::InitRepo { remote_url } => to_json(&init_repo(&ctx, remote_url.as_deref())?)?,
        Command::InitPull => to_json(&init_pull(&ctx)?)?,
        Command::WriteFile {
            path,
            content,
            message,
        } => to_json(&write_file(&ctx, path, content, message.as_deref())?)?,
        Command::CreateFolder { name, base_dir } => {
            to_json(&create_folder(&ctx, name, base_dir.as_deref())?)?
        }
        Command::Delete { path, message } => {
            to_json(&delete_path(&ctx, path, message.as_deref())?)?
        }
        Command::Upload {
            source,
            target_dir,
            message,
        } => to_json(&upload_file(&ctx, source, target_dir, message.as_deref())?)?,
        Command::CopyToInstall { source } => to_json(&copy_to_install(&ctx, source)?)?,
        Command::SparseUpdate { workspace } => to_json(&sparse_update(&ctx, workspace)?)?,
        Command::SparseInitEmpty { workspace } => {
            to_json(&sparse_init_empty(&ctx, workspace)?)?
        }
        Command::SparsePull { workspace } => to_json(&sparse_pull(&ctx, workspace)?)?,
        Command::SafePush { message } => to_json(&safe_push(&ctx, message.as_deref())?)?,
        Command::Lfs { add } => to_json(&configure_lfs(&ctx, add)?)?,
        Command::Tree { branch } => to_json(&file_tree(&ctx, branch.as_deref())?)?,
        Command::WorkspaceInfo { workspace } => to_json(&workspace_info(&ctx, workspace)?)?,
        Command::SshKeygen { email, force } => {
            let generator = SshKeygen::new(settings.command_timeout());
            to_json(&generate_key(system, &generator, &settings.ssh, email, *force)?)?
        }
        Command::SshPublicKey => to_json(&read_public_key(system, &settings.ssh)?)?,
        Command::Config { action } => execute_config(&ctx, config_path, action)?,
    };

    Ok(output)
}

fn execute_config(ctx: &RepoContext<'_>, config_path: &str, action: &ConfigCommand) -> Result<Value> {
    match action {
        ConfigCommand::Show => {
            let mut output = to_json(ctx.settings())?;
            if let Value::Object(fields) = &mut output {
                fields.insert("user".to_owned(), current_user(ctx));
            }
            Ok(output)
        }
        ConfigCommand::SetRepoPath { path } => set_repo_path(ctx.system(), config_path, path),
        ConfigCommand::SetRemoteUrl { url } => {
            validate_remote_url(url)?;
            let mut settings = ctx.settings().clone();
            settings.remote_url = Some(url.clone());
            settings.save_to_file(ctx.system(), config_path)?;

            let remote_updated = ctx.engine().is_repository(ctx.root());
            if remote_updated {
                ctx.ops().setup_remote(&settings.remote_name, url)?;
            }
            Ok(json!({ "remote_url": url, "remote_updated": remote_updated }))
        }
        ConfigCommand::SetUser { name, email } => {
            if name.trim().is_empty() || email.trim().is_empty() {
                return Err(
                    GitFrontError::configuration("User name and email cannot be empty").into(),
                );
            }
            ctx.sparse().ensure_repository()?;
            ctx.engine()
                .set_config_value(ctx.root(), "user.name", name.trim())?;
            ctx.engine()
                .set_config_value(ctx.root(), "user.email", email.trim())?;
            info!("Set repository user to {name} <{email}>");
            Ok(json!({ "name": name.trim(), "email": email.trim() }))
        }
    }
}

/// `user.name` and `user.email` as git resolves them for the repository,
/// empty when there is no repository or the value is unset
fn current_user(ctx: &RepoContext<'_>) -> Value {
    let read = |key: &str| -> String {
        if !ctx.engine().is_repository(ctx.root()) {
            return String::new();
        }
        match ctx.engine().config_value(ctx.root(), key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!("Could not read {key}: {e:#}");
                String::new()
            }
        }
    };
    json!({ "name": read("user.name"), "email": read("user.email") })
}

/// Write `repo_path` into the settings file, creating it with defaults when
/// it does not exist yet
///
/// # Errors
///
/// Returns an error if an existing file is invalid or cannot be written.
pub fn set_repo_path(system: &dyn System, config_path: &str, repo_path: &str) -> Result<Value> {
    let mut settings = if system.exists(Path::new(config_path)) {
        Settings::load_from_file(system, config_path)?
    } else {
        info!("Creating configuration file {config_path}");
        Settings::new(repo_path)
    };
    settings.repo_path = repo_path.to_owned();
    settings.save_to_file(system, config_path)?;

    let repo_root = settings.repo_root(system)?;
    Ok(json!({
        "repo_path": settings.repo_path,
        "repo_root": repo_root,
    }))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
