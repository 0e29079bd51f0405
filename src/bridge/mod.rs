//! Bridge command runner
//!
//! Executes one bridge-CLI command per call with a timeout and returns a
//! typed result. No retry happens at this layer; retry policy belongs to
//! callers.

use crate::types::SyncError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Default per-command timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured output and exit status of one bridge invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl BridgeOutput {
    /// True when the process exited with code zero
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Capability interface over the bridge CLI
///
/// Every component that talks to the device goes through this trait, so
/// tests can script the bridge without spawning processes.
pub trait CommandRunner {
    /// Run one bridge command, waiting at most `timeout` for completion
    fn run(&self, args: &[String], timeout: Duration) -> Result<BridgeOutput, SyncError>;
}

/// Production runner spawning the `adb` executable
///
/// Owns a small tokio runtime and exposes a synchronous facade; the child
/// is killed when its timeout expires.
pub struct AdbRunner {
    adb_path: PathBuf,
    runtime: Runtime,
}

impl AdbRunner {
    /// Create a runner and verify the bridge executable responds
    ///
    /// Probes with `version`; failure to start or a non-zero probe exit
    /// yields [`SyncError::BridgeUnavailable`].
    pub fn new(adb_path: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let runner = Self::unprobed(adb_path)?;
        let version = runner.run(&["version".to_string()], DEFAULT_TIMEOUT)?;
        if !version.success() {
            return Err(SyncError::BridgeUnavailable(format!(
                "{} exited with {:?} on version probe",
                runner.adb_path.display(),
                version.status
            )));
        }
        debug!(
            version = %version.stdout.lines().next().unwrap_or(""),
            "bridge available"
        );
        Ok(runner)
    }

    fn unprobed(adb_path: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SyncError::Io)?;
        Ok(Self {
            adb_path: adb_path.into(),
            runtime,
        })
    }
}

impl CommandRunner for AdbRunner {
    fn run(&self, args: &[String], timeout: Duration) -> Result<BridgeOutput, SyncError> {
        let command_line = display_command(&self.adb_path, args);
        debug!(command = %command_line, "running bridge command");

        self.runtime.block_on(async {
            let child = Command::new(&self.adb_path)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                // Reaps the child if the timeout drops the wait future.
                .kill_on_drop(true)
                .spawn()
                .map_err(|error| map_spawn_error(&command_line, error))?;

            match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(Ok(output)) => Ok(BridgeOutput {
                    status: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                }),
                Ok(Err(error)) => Err(SyncError::BridgeCommand {
                    command: command_line.clone(),
                    message: error.to_string(),
                }),
                Err(_) => Err(SyncError::BridgeTimeout {
                    command: command_line.clone(),
                    secs: timeout.as_secs(),
                }),
            }
        })
    }
}

fn map_spawn_error(command: &str, error: std::io::Error) -> SyncError {
    if error.kind() == ErrorKind::NotFound {
        SyncError::BridgeUnavailable(format!("executable not found for `{}`", command))
    } else {
        SyncError::BridgeCommand {
            command: command.to_string(),
            message: error.to_string(),
        }
    }
}

fn display_command(adb_path: &Path, args: &[String]) -> String {
    let mut line = adb_path.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
