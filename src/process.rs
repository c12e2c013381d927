//! Bounded execution of external programs
//!
//! Every subprocess gitfront starts (`git`, `ssh-keygen`) goes through
//! [`run_bounded`], which captures output and kills the child once the
//! configured timeout elapses.

use crate::error::GitFrontError;
use anyhow::{Context as _, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured result of a finished subprocess
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited successfully
    #[must_use]
    #[inline]
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Run `program` with `args` in `working_dir`, waiting at most `timeout`
///
/// # Errors
///
/// Returns an error if:
/// - The program cannot be started
/// - The program does not finish within `timeout` (`GitFrontError::EngineCommand`)
///
/// A non-zero exit status is not an error here; callers inspect
/// [`ProcessOutput::success`].
pub fn run_bounded(
    program: &str,
    args: &[&str],
    working_dir: Option<&Path>,
    timeout: Duration,
) -> Result<ProcessOutput> {
    let mut command = Command::new(program);
    command
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = working_dir {
        command.current_dir(dir);
    }

    debug!("Running {program} {}", args.join(" "));
    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to execute {program} {}", args.join(" ")))?;

    // Drain both pipes on their own threads so a chatty child cannot block
    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let status = wait_with_deadline(&mut child, timeout).map_err(|e| {
        GitFrontError::engine_command(format!("{program} {}: {e}", args.join(" ")))
    })?;

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
    })
}

fn spawn_reader<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> std::io::Result<ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("timed out after {}s", timeout.as_secs_f32()),
            ));
        }
        thread::sleep(POLL_INTERVAL);
    }
}
