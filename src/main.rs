//! # `GitFront`
//!
//! `GitFront` drives a single server-managed git working copy from the
//! command line. Each subcommand prints one JSON document on stdout; logs go
//! to stderr.
//!
//! ## Features
//! - Scope the sparse checkout to one workspace, rewriting patterns only when they change.
//! - Write, create, and delete files with every path confined to the repository root.
//! - Commit, pull, and push with a fallback for branches that do not exist yet.
//! - Git LFS setup, branch file trees, and SSH key provisioning for the remote host.
//!
//! ## Usage
//!
//! ```sh
//! gitfront config set-repo-path /srv/docs
//! gitfront init-repo --remote-url git@gitee.com:team/docs.git
//! gitfront sparse-update --workspace guides/intro
//! ```
//!
//! See `gitfront --help` for every subcommand.

use clap::Parser as _;
use gitfront::cli::Args;
use gitfront::error::exit_code_of;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let args = Args::parse();

    // Initialize tracing subscriber based on verbose flag
    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match gitfront::run(&args) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{err:#}");
            std::process::exit(exit_code_of(&err));
        }
    }
}
