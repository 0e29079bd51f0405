//! Transfer engine
//!
//! Pushes a batch of local files to the device, preserving relative
//! directory structure, with per-file retry and progress events. No item
//! failure aborts the batch; partial completion is a normal outcome.

use crate::bridge::{BridgeOutput, CommandRunner, DEFAULT_TIMEOUT};
use crate::types::{Device, SyncError, TransferBatchResult, TransferItem, TransferOutcome};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Marker the bridge prints in its transfer summary on success
///
/// Older bridge releases print the summary on stderr, newer ones on
/// stdout; presence on either stream decides success, independent of the
/// exit code. A clean exit without the marker is treated as failure.
const TRANSFER_SUMMARY_MARKER: &str = "bytes in";

/// Tuning knobs for a push batch
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Attempts per file, including the first
    pub max_attempts: u32,

    /// Fixed sleep between attempts
    pub retry_delay: Duration,

    /// Per-command timeout
    pub command_timeout: Duration,

    /// Checked between files; set to abort the remainder of the batch
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
            command_timeout: DEFAULT_TIMEOUT,
            cancel_flag: None,
        }
    }
}

impl TransferOptions {
    fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Events emitted while pushing a batch
#[derive(Debug)]
pub enum TransferEvent {
    /// Push attempt sequence started for a file
    FileStart {
        index: usize,
        total: usize,
        local: PathBuf,
        size: u64,
    },

    /// An attempt failed and will be retried after the backoff
    FileRetry {
        local: PathBuf,
        attempt: u32,
        error: SyncError,
    },

    /// File confirmed on the device
    FileSuccess {
        local: PathBuf,
        remote: String,
        bytes: u64,
    },

    /// All attempts exhausted; the batch continues with the next file
    FileFailed { local: PathBuf, reason: String },

    /// Batch finished (with or without failures)
    Complete { result: TransferBatchResult },
}

/// Optional callback used to receive transfer events
pub type TransferCallback = dyn Fn(&TransferEvent) + Send + Sync;

/// Push a batch of local files to the device
///
/// For each file: derive its [`TransferItem`], re-assert the remote parent
/// directory, push, and confirm via the transfer-summary marker. Failed
/// attempts retry up to `options.max_attempts` with a fixed backoff; a
/// file that exhausts its budget is recorded and the batch moves on.
/// Re-running the same batch is safe: directory creation is idempotent and
/// a re-push overwrites the prior remote file.
pub fn push_all(
    runner: &dyn CommandRunner,
    device: &Device,
    source_root: &Path,
    target_root: &str,
    files: &[PathBuf],
    options: &TransferOptions,
    on_event: Option<&TransferCallback>,
) -> TransferBatchResult {
    let mut result = TransferBatchResult::default();
    let total = files.len();

    for (idx, local) in files.iter().enumerate() {
        if options.is_cancelled() {
            warn!(
                remaining = total - idx,
                "transfer cancelled; skipping remaining files"
            );
            result.cancelled = true;
            break;
        }

        result.attempted += 1;

        let item = match resolve_item(source_root, target_root, local) {
            Ok(item) => item,
            Err(error) => {
                let reason = error.to_string();
                warn!(file = %local.display(), %reason, "file skipped");
                result.failed += 1;
                emit_event(
                    on_event,
                    TransferEvent::FileFailed {
                        local: local.clone(),
                        reason,
                    },
                );
                continue;
            }
        };

        emit_event(
            on_event,
            TransferEvent::FileStart {
                index: idx + 1,
                total,
                local: item.local.clone(),
                size: item.size,
            },
        );

        match push_with_retry(runner, device, &item, options, on_event) {
            TransferOutcome::Succeeded { remote } => {
                result.bytes_pushed += item.size;
                result.succeeded.push(remote.clone());
                emit_event(
                    on_event,
                    TransferEvent::FileSuccess {
                        local: item.local.clone(),
                        remote,
                        bytes: item.size,
                    },
                );
            }
            TransferOutcome::FailedAfterRetries { reason } => {
                result.failed += 1;
                warn!(file = %item.local.display(), %reason, "push failed after retries");
                emit_event(
                    on_event,
                    TransferEvent::FileFailed {
                        local: item.local.clone(),
                        reason,
                    },
                );
            }
        }
    }

    emit_event(
        on_event,
        TransferEvent::Complete {
            result: result.clone(),
        },
    );
    result
}

fn resolve_item(
    source_root: &Path,
    target_root: &str,
    local: &Path,
) -> Result<TransferItem, SyncError> {
    let size = fs::metadata(local)?.len();
    TransferItem::resolve(source_root, target_root, local, size)
}

fn push_with_retry(
    runner: &dyn CommandRunner,
    device: &Device,
    item: &TransferItem,
    options: &TransferOptions,
    on_event: Option<&TransferCallback>,
) -> TransferOutcome {
    let mut last_failure = String::from("no attempts made");

    for attempt in 1..=options.max_attempts.max(1) {
        match push_once(runner, device, item, options.command_timeout) {
            Ok(()) => {
                debug!(file = %item.local.display(), attempt, "push confirmed");
                return TransferOutcome::Succeeded {
                    remote: item.remote.clone(),
                };
            }
            Err(error) => {
                last_failure = error.to_string();
                if attempt < options.max_attempts {
                    emit_event(
                        on_event,
                        TransferEvent::FileRetry {
                            local: item.local.clone(),
                            attempt,
                            error,
                        },
                    );
                    thread::sleep(options.retry_delay);
                }
            }
        }
    }

    TransferOutcome::FailedAfterRetries {
        reason: last_failure,
    }
}

/// One mkdir-then-push sequence
///
/// The parent directory is re-asserted on every attempt; `mkdir -p` is
/// idempotent so retries and re-runs are safe.
fn push_once(
    runner: &dyn CommandRunner,
    device: &Device,
    item: &TransferItem,
    timeout: Duration,
) -> Result<(), SyncError> {
    let parent = item.remote_parent();
    let mkdir_args = vec![
        "-s".to_string(),
        device.id.clone(),
        "shell".to_string(),
        "mkdir".to_string(),
        "-p".to_string(),
        parent.clone(),
    ];
    let mkdir = runner.run(&mkdir_args, timeout)?;
    if !mkdir.success() {
        return Err(SyncError::BridgeCommand {
            command: format!("mkdir -p {}", parent),
            message: mkdir.stderr.trim().to_string(),
        });
    }

    let push_args = vec![
        "-s".to_string(),
        device.id.clone(),
        "push".to_string(),
        item.local.to_string_lossy().into_owned(),
        item.remote.clone(),
    ];
    let output = runner.run(&push_args, timeout)?;
    if push_succeeded(&output) {
        Ok(())
    } else {
        Err(SyncError::BridgeCommand {
            command: format!("push {}", item.local.display()),
            message: describe_push_failure(&output),
        })
    }
}

/// Success is decided by the transfer-summary marker, not exit status
fn push_succeeded(output: &BridgeOutput) -> bool {
    output.stderr.contains(TRANSFER_SUMMARY_MARKER)
        || output.stdout.contains(TRANSFER_SUMMARY_MARKER)
}

fn describe_push_failure(output: &BridgeOutput) -> String {
    let diagnostic = if output.stderr.trim().is_empty() {
        output.stdout.trim()
    } else {
        output.stderr.trim()
    };
    if diagnostic.is_empty() {
        format!("no transfer summary in output (exit {:?})", output.status)
    } else {
        diagnostic.to_string()
    }
}

fn emit_event(on_event: Option<&TransferCallback>, event: TransferEvent) {
    if let Some(callback) = on_event {
        callback(&event);
    }
}
