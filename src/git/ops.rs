//! Porcelain git operations over a [`VcsEngine`]

use crate::error::GitFrontError;
use crate::git::VcsEngine;
use anyhow::Result;
use std::path::Path;
use tracing::{debug, info, warn};

/// One entry of `git ls-tree -r -z`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub kind: String,
    pub hash: String,
    pub path: String,
}

/// Git operations bound to one repository
#[derive(Clone, Copy)]
pub struct RepoOps<'src> {
    engine: &'src dyn VcsEngine,
    root: &'src Path,
}

impl<'src> RepoOps<'src> {
    #[must_use]
    #[inline]
    pub const fn new(engine: &'src dyn VcsEngine, root: &'src Path) -> Self {
        Self { engine, root }
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        self.engine.run_raw(self.root, args)
    }

    /// Pull `branch` from `remote`
    pub fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.git(&["pull", remote, branch])?;
        info!("Pulled {remote}/{branch}");
        Ok(())
    }

    /// Stage a path (use `.` for everything)
    pub fn add(&self, pathspec: &str) -> Result<()> {
        self.git(&["add", "--all", "--", pathspec])?;
        Ok(())
    }

    /// Commit staged changes; returns `false` when there was nothing to commit
    pub fn commit_if_changed(&self, message: &str) -> Result<bool> {
        let status = self.git(&["status", "--porcelain"])?;
        if status.trim().is_empty() {
            debug!("Nothing to commit");
            return Ok(false);
        }
        self.git(&["commit", "-m", message])?;
        info!("Committed: {message}");
        Ok(true)
    }

    /// Push `branch`; when the branch does not exist locally yet, create it
    /// and push with upstream tracking
    pub fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.push_with(&["push", remote, branch], remote, branch)
    }

    /// Push `branch` and record `remote` as its upstream
    pub fn push_upstream(&self, remote: &str, branch: &str) -> Result<()> {
        self.push_with(&["push", "--set-upstream", remote, branch], remote, branch)
    }

    fn push_with(&self, args: &[&str], remote: &str, branch: &str) -> Result<()> {
        match self.git(args) {
            Ok(_) => {
                info!("Pushed to {remote}/{branch}");
                Ok(())
            }
            Err(err) if is_missing_refspec(&err.to_string()) => {
                warn!("Branch {branch} does not exist locally, creating it");
                self.git(&["checkout", "-b", branch])?;
                self.git(&["push", "--set-upstream", remote, branch])?;
                info!("Created and pushed new branch {remote}/{branch}");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// URL of `remote`, if configured
    #[must_use]
    pub fn remote_url(&self, remote: &str) -> Option<String> {
        self.git(&["remote", "get-url", remote])
            .ok()
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty())
    }

    /// Add `remote` or repoint it at `url`
    pub fn setup_remote(&self, remote: &str, url: &str) -> Result<()> {
        match self.remote_url(remote) {
            None => {
                self.git(&["remote", "add", remote, url])?;
                info!("Added remote {remote}: {url}");
            }
            Some(current) if current == url => {
                debug!("Remote {remote} already points at {url}");
            }
            Some(_) => {
                self.git(&["remote", "set-url", remote, url])?;
                info!("Remote {remote} updated to {url}");
            }
        }
        Ok(())
    }

    /// Install LFS hooks and track each `*.ext`
    pub fn lfs_track(&self, extensions: &[String]) -> Result<()> {
        self.git(&["lfs", "install", "--local"])?;
        for extension in extensions {
            let pattern = format!("*{extension}");
            self.git(&["lfs", "track", &pattern])?;
            info!("Tracking {pattern} with LFS");
        }
        Ok(())
    }

    /// Every blob reachable from `branch`
    ///
    /// Records are NUL-terminated so paths come back verbatim, without
    /// `core.quotePath` escaping.
    pub fn ls_tree(&self, branch: &str) -> Result<Vec<TreeEntry>> {
        let output = self.git(&["ls-tree", "-r", "-z", branch])?;
        output
            .split('\0')
            .filter(|record| !record.trim().is_empty())
            .map(parse_ls_tree_line)
            .collect()
    }
}

fn is_missing_refspec(message: &str) -> bool {
    message.contains("src refspec") && message.contains("does not match any")
}

/// Whether a failed pull means the remote has no such branch yet
#[must_use]
pub fn is_missing_remote_ref(message: &str) -> bool {
    message.contains("couldn't find remote ref") || message.contains("not a valid object name")
}

/// Parse `<mode> SP <type> SP <hash> TAB <path>`
///
/// # Errors
///
/// Returns `GitFrontError::EngineCommand` for a malformed line.
pub fn parse_ls_tree_line(line: &str) -> Result<TreeEntry> {
    let malformed =
        || GitFrontError::engine_command(format!("Unexpected ls-tree output: {line:?}"));

    let (meta, path) = line.split_once('\t').ok_or_else(malformed)?;
    let mut fields = meta.split_whitespace();
    let (Some(mode), Some(kind), Some(hash), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(malformed().into());
    };

    Ok(TreeEntry {
        mode: mode.to_owned(),
        kind: kind.to_owned(),
        hash: hash.to_owned(),
        path: path.to_owned(),
    })
}
