use crate::config::DEFAULT_CONFIG_PATH;
use clap::{Parser, Subcommand};

/// Command-line arguments for gitfront
#[derive(Parser, Debug, Clone)]
#[command(name = "gitfront")]
#[command(about = "A command-line front end for a git repository with per-workspace sparse checkout")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(
        long,
        value_name = "PATH",
        env = "GITFRONT_CONFIG",
        default_value = DEFAULT_CONFIG_PATH,
        global = true
    )]
    pub config: String,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// One operation on the configured repository
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the repository if needed and configure the remote
    InitRepo {
        /// Remote URL; defaults to `remote_url` from the configuration
        #[arg(long, value_name = "URL")]
        remote_url: Option<String>,
    },

    /// Pull the default branch, seeding an empty remote with a README
    InitPull,

    /// Write a file, commit it and push
    WriteFile {
        /// Repository-relative file path
        #[arg(long, value_name = "PATH")]
        path: String,

        /// New file content
        #[arg(long)]
        content: String,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Create a folder with a marker file, commit it and push
    CreateFolder {
        /// Folder name; leading `../` is stripped
        #[arg(long)]
        name: String,

        /// Repository-relative parent folder
        #[arg(long, value_name = "PATH")]
        base_dir: Option<String>,
    },

    /// Delete a file or folder, commit and push
    Delete {
        /// Repository-relative path
        #[arg(long, value_name = "PATH")]
        path: String,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Pull, copy a local file into the repository, commit it and push
    Upload {
        /// Local file to copy
        #[arg(long, value_name = "FILE")]
        source: std::path::PathBuf,

        /// Repository-relative folder receiving the file; the root when empty
        #[arg(long, value_name = "PATH", default_value = "")]
        target_dir: String,

        /// Commit message; defaults to `<default_commit_message>: <file name>`
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Check out a file's folder, pull, and copy the file to `install_path`
    CopyToInstall {
        /// Repository-relative file path
        #[arg(long, value_name = "PATH")]
        source: String,
    },

    /// Converge the sparse checkout on a workspace
    SparseUpdate {
        /// Repository-relative workspace; empty for the whole repository
        #[arg(long)]
        workspace: String,
    },

    /// Reset the sparse checkout so nothing is checked out
    SparseInitEmpty {
        #[arg(long)]
        workspace: String,
    },

    /// Reapply the current sparse patterns, then pull
    ///
    /// The pattern file is not changed; run `sparse-update` for that.
    SparsePull {
        #[arg(long)]
        workspace: String,
    },

    /// Pull, commit everything and push
    SafePush {
        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Install Git LFS and track extensions
    Lfs {
        /// Extension to track, e.g. `.psd` (can be specified multiple times)
        #[arg(long = "add", value_name = ".EXT")]
        add: Vec<String>,
    },

    /// Print the file tree of a branch as JSON
    Tree {
        /// Branch to list; defaults to `default_branch`
        #[arg(long)]
        branch: Option<String>,
    },

    /// Describe the repository as seen from a workspace
    WorkspaceInfo {
        #[arg(long, default_value = "")]
        workspace: String,
    },

    /// Generate the SSH key used for the remote and print its public half
    SshKeygen {
        /// Comment embedded in the key
        #[arg(long)]
        email: String,

        /// Replace an existing key
        #[arg(long)]
        force: bool,
    },

    /// Print the public SSH key
    SshPublicKey,

    /// Inspect or update the configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Point the configuration at a repository, creating the file if needed
    SetRepoPath {
        /// Repository root
        path: String,
    },

    /// Change the remote URL and update the repository's remote
    SetRemoteUrl {
        url: String,
    },

    /// Set `user.name` and `user.email` in the repository
    SetUser {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,
    },
}

impl Command {
    /// Whether the command runs git
    #[must_use]
    pub const fn needs_git(&self) -> bool {
        !matches!(
            self,
            Self::SshKeygen { .. }
                | Self::SshPublicKey
                | Self::Config {
                    action: ConfigCommand::Show | ConfigCommand::SetRepoPath { .. },
                }
        )
    }
}
