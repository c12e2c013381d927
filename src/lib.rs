//! `GitFront` - A command-line front end for a server-managed git working copy
//!
//! This library scopes a repository's sparse checkout to one workspace at a
//! time, guards every caller-supplied path against escaping the repository
//! root, and wraps the surrounding git chores (commit, push, pull, LFS, SSH
//! keys) behind one subcommand each.

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod guard;
pub mod operations;
pub mod process;
pub mod system;
pub mod utils;

use anyhow::{Context as _, Result};
use cli::Args;
use system::RealSystem;

/// Main entry point for the gitfront library
///
/// Runs the parsed command and prints its JSON result to stdout.
///
/// # Errors
///
/// Returns the error of the command; its exit code is available through
/// [`error::exit_code_of`].
pub fn run(args: &Args) -> Result<()> {
    let system = RealSystem::new();
    let output = cli::execute(args, &system)?;

    // Output to stdout (not using logging)
    let rendered = serde_json::to_string_pretty(&output).context("Failed to render output")?;
    println!("{rendered}");

    Ok(())
}
