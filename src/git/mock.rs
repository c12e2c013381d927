//! Mock version-control engine for testing

use crate::error::GitFrontError;
use crate::git::VcsEngine;
use crate::system::{MockSystem, System as _};
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// A call observed by [`MockEngine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Init(PathBuf),
    GetConfig(String),
    SetConfig(String, String),
    Raw(Vec<String>),
}

/// In-memory engine that records every call
///
/// Attach a [`MockSystem`] with [`MockEngine::with_system`] to have `init`
/// create `.git/info` and `sparse-checkout set` create the pattern file, the
/// way git does on disk.
///
/// Failures and canned stdout are keyed by the leading arguments of a raw
/// command, e.g. `"sparse-checkout reapply"` or `"push"`.
#[derive(Clone, Default)]
pub struct MockEngine {
    state: Arc<RwLock<MockEngineState>>,
}

#[derive(Default)]
struct MockEngineState {
    repositories: HashSet<PathBuf>,
    config: HashMap<(PathBuf, String), String>,
    calls: Vec<EngineCall>,
    failures: HashMap<String, String>,
    responses: HashMap<String, String>,
    config_read_fails: bool,
    system: Option<MockSystem>,
}

impl MockEngine {
    /// Create an engine that knows no repositories
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror repository side effects into `system`
    #[must_use]
    #[inline]
    pub fn with_system(self, system: MockSystem) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.system = Some(system);
        }
        self
    }

    /// Pretend `path` is already a repository
    #[must_use]
    #[inline]
    pub fn with_repository<P: AsRef<Path>>(self, path: P) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.repositories.insert(path.as_ref().to_path_buf());
        }
        self
    }

    /// Preset a config value
    #[must_use]
    #[inline]
    pub fn with_config<P: AsRef<Path>>(self, path: P, key: &str, value: &str) -> Self {
        if let Ok(mut state) = self.state.write() {
            state
                .config
                .insert((path.as_ref().to_path_buf(), key.to_owned()), value.to_owned());
        }
        self
    }

    /// Make every config read fail
    #[must_use]
    #[inline]
    pub fn with_failing_config_reads(self) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.config_read_fails = true;
        }
        self
    }

    /// Make raw commands starting with `command` fail with `message`
    #[must_use]
    #[inline]
    pub fn with_failure(self, command: &str, message: &str) -> Self {
        if let Ok(mut state) = self.state.write() {
            state
                .failures
                .insert(command.to_owned(), message.to_owned());
        }
        self
    }

    /// Make raw commands starting with `command` print `stdout`
    #[must_use]
    #[inline]
    pub fn with_response(self, command: &str, stdout: &str) -> Self {
        if let Ok(mut state) = self.state.write() {
            state
                .responses
                .insert(command.to_owned(), stdout.to_owned());
        }
        self
    }

    /// Remove a failure registered with [`MockEngine::with_failure`]
    #[inline]
    pub fn clear_failure(&self, command: &str) {
        if let Ok(mut state) = self.state.write() {
            state.failures.remove(command);
        }
    }

    /// Every call seen so far, in order
    #[must_use]
    #[inline]
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state
            .read()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    /// Raw commands seen so far, joined with spaces
    #[must_use]
    #[inline]
    pub fn raw_commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Raw(args) => Some(args.join(" ")),
                EngineCall::Init(_) | EngineCall::GetConfig(_) | EngineCall::SetConfig(..) => {
                    None
                }
            })
            .collect()
    }

    /// How many raw commands started with `prefix`
    #[must_use]
    #[inline]
    pub fn count_raw(&self, prefix: &str) -> usize {
        self.raw_commands()
            .iter()
            .filter(|command| command.starts_with(prefix))
            .count()
    }

    /// Forget recorded calls, keeping repositories and config
    #[inline]
    pub fn reset_calls(&self) {
        if let Ok(mut state) = self.state.write() {
            state.calls.clear();
        }
    }

    fn record(&self, call: EngineCall) {
        if let Ok(mut state) = self.state.write() {
            state.calls.push(call);
        }
    }

    fn lookup(map: &HashMap<String, String>, joined: &str) -> Option<String> {
        map.iter()
            .filter(|(prefix, _)| joined.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, value)| value.clone())
    }
}

impl VcsEngine for MockEngine {
    fn is_repository(&self, path: &Path) -> bool {
        self.state
            .read()
            .is_ok_and(|state| state.repositories.contains(path))
    }

    fn init(&self, path: &Path) -> Result<()> {
        self.record(EngineCall::Init(path.to_path_buf()));
        let mut state = self
            .state
            .write()
            .map_err(|e| GitFrontError::repository_init(e.to_string()))?;
        state.repositories.insert(path.to_path_buf());
        if let Some(system) = state.system.as_ref() {
            system
                .create_dir_all(&path.join(".git").join("info"))
                .map_err(|e| GitFrontError::repository_init(e.to_string()))?;
        }
        Ok(())
    }

    fn config_value(&self, path: &Path, key: &str) -> Result<Option<String>> {
        self.record(EngineCall::GetConfig(key.to_owned()));
        let state = self
            .state
            .read()
            .map_err(|e| GitFrontError::config_read(e.to_string()))?;
        if state.config_read_fails {
            return Err(GitFrontError::config_read(format!("cannot read '{key}'")).into());
        }
        Ok(state
            .config
            .get(&(path.to_path_buf(), key.to_owned()))
            .cloned())
    }

    fn set_config_value(&self, path: &Path, key: &str, value: &str) -> Result<()> {
        self.record(EngineCall::SetConfig(key.to_owned(), value.to_owned()));
        let mut state = self
            .state
            .write()
            .map_err(|e| GitFrontError::engine_command(e.to_string()))?;
        state
            .config
            .insert((path.to_path_buf(), key.to_owned()), value.to_owned());
        Ok(())
    }

    fn run_raw(&self, path: &Path, args: &[&str]) -> Result<String> {
        self.record(EngineCall::Raw(
            args.iter().map(|arg| (*arg).to_owned()).collect(),
        ));
        let joined = args.join(" ");

        let state = self
            .state
            .read()
            .map_err(|e| GitFrontError::engine_command(e.to_string()))?;

        if let Some(message) = Self::lookup(&state.failures, &joined) {
            return Err(GitFrontError::engine_command(message).into());
        }

        if joined.starts_with("sparse-checkout set")
            && let Some(system) = state.system.as_ref()
        {
            let info = path.join(".git").join("info");
            system
                .create_dir_all(&info)
                .and_then(|()| system.write(&info.join("sparse-checkout"), b"/*\n!/*/\n"))
                .map_err(|e| GitFrontError::engine_command(e.to_string()))?;
        }

        Ok(Self::lookup(&state.responses, &joined).unwrap_or_default())
    }
}
