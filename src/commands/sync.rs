//! Main sync command
//!
//! Composes one run: resolve device, compute the candidate set, transfer,
//! notify the media index, and commit the sync timestamp only when every
//! item succeeded.

use crate::bridge::{AdbRunner, CommandRunner};
use crate::device::{self, DeviceChooser};
use crate::notify::notify_index;
use crate::scanner::{self, MediaConverter, NoConversion, ScanOptions, ScanOutcome};
use crate::state::{format_epoch, now_epoch_seconds, SyncStateStore};
use crate::transfer::{push_all, TransferEvent, TransferOptions};
use crate::types::SyncError;
use crate::ui::{ProgressReporter, StdinChooser};
use crate::Config;
use console::style;
use indicatif::HumanBytes;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Final accounting for a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files the transfer engine attempted
    pub attempted: usize,

    /// Files confirmed on the device
    pub succeeded: usize,

    /// Files that exhausted their retry budget
    pub failed: usize,

    /// Bytes of completed files
    pub bytes_pushed: u64,

    /// Sync timestamp was advanced
    pub committed: bool,
}

/// Run the sync operation with production collaborators
pub fn run(config: Config) -> Result<RunSummary, SyncError> {
    let runner = AdbRunner::new(&config.adb_path)?;
    run_with(&config, &runner, &StdinChooser, &NoConversion)
}

/// Run the sync operation with injected bridge, chooser, and converter
pub fn run_with(
    config: &Config,
    runner: &dyn CommandRunner,
    chooser: &dyn DeviceChooser,
    converter: &dyn MediaConverter,
) -> Result<RunSummary, SyncError> {
    // Committed on success; captured up front so files modified mid-run
    // stay eligible for the next incremental pass.
    let run_started_at = now_epoch_seconds();

    // Device-resolution failures abort before any transfer side effects.
    let devices = device::list_devices(runner, config.bridge_timeout)?;
    let target = device::resolve_target(devices, config.device.as_deref(), chooser)?;
    let target = device::enrich(runner, target, config.bridge_timeout);
    info!(device = %target.display_name(), "device selected");

    let store = SyncStateStore::new(&config.state_file);
    let since = if config.incremental { store.read()? } else { None };
    if let Some(last_sync) = since {
        info!(last_sync = %format_epoch(last_sync), "incremental sync");
    }

    let reporter = Arc::new(Mutex::new(ProgressReporter::new()));

    if let Ok(progress) = reporter.lock() {
        progress.start_scan();
    }
    let scan_progress: scanner::ScanProgress = {
        let reporter = Arc::clone(&reporter);
        Box::new(move |files: u64, bytes: u64| {
            if let Ok(progress) = reporter.lock() {
                progress.update_scan(files, bytes);
            }
        })
    };
    let scan_options = ScanOptions {
        exclude_patterns: config.exclude_patterns.clone(),
        convert_formats: config.convert_media,
    };
    let scan = scanner::scan_media(
        &config.source,
        since,
        &scan_options,
        converter,
        Some(&scan_progress),
    )?;
    if let Ok(progress) = reporter.lock() {
        progress.finish_scan(scan.count(), scan.total_bytes);
    }

    if scan.is_empty() {
        println!("Nothing to sync.");
        return Ok(RunSummary::default());
    }

    println!("{}", format_candidate_summary(&scan));

    if config.dry_run {
        println!("{}", format_dry_run(&scan, &config.source));
        println!("Dry-run mode: no changes were made.");
        return Ok(RunSummary::default());
    }

    if let Ok(mut progress) = reporter.lock() {
        progress.start_transfer(scan.total_bytes);
    }

    let source_root = config.source.clone();
    let progress_cb = {
        let reporter = Arc::clone(&reporter);
        move |event: &TransferEvent| match event {
            TransferEvent::FileStart { local, .. } => {
                if let Ok(progress) = reporter.lock() {
                    progress.set_current_file(local.strip_prefix(&source_root).unwrap_or(local.as_path()));
                }
            }
            TransferEvent::FileRetry { local, attempt, .. } => {
                if let Ok(progress) = reporter.lock() {
                    progress.file_retrying(local.strip_prefix(&source_root).unwrap_or(local.as_path()), *attempt);
                }
            }
            TransferEvent::FileSuccess { bytes, .. } => {
                if let Ok(mut progress) = reporter.lock() {
                    progress.complete_file(*bytes);
                }
            }
            TransferEvent::FileFailed { local, reason } => {
                if let Ok(progress) = reporter.lock() {
                    progress.file_error(local.strip_prefix(&source_root).unwrap_or(local.as_path()), reason);
                }
            }
            TransferEvent::Complete { result } => {
                if let Ok(progress) = reporter.lock() {
                    progress.finish_transfer(
                        result.succeeded.len(),
                        result.failed,
                        result.bytes_pushed,
                    );
                }
            }
        }
    };

    let transfer_options = TransferOptions {
        command_timeout: config.bridge_timeout,
        ..Default::default()
    };
    let result = push_all(
        runner,
        &target,
        &config.source,
        &config.target,
        &scan.files,
        &transfer_options,
        Some(&progress_cb),
    );

    let notify_stats = notify_index(
        runner,
        &target,
        &result.succeeded,
        config.batch_size,
        config.bridge_timeout,
    );
    if !notify_stats.all_delivered() {
        warn!(
            failed = notify_stats.batches_failed,
            "some index notifications failed; files are on the device but may not appear until a rescan"
        );
    }

    let commit = if result.all_succeeded() {
        store.write(run_started_at).map(|_| true)
    } else {
        info!(
            failed = result.failed,
            "sync state not advanced; remaining files stay eligible for the next run"
        );
        Ok(false)
    };

    let summary = RunSummary {
        attempted: result.attempted,
        succeeded: result.succeeded.len(),
        failed: result.failed,
        bytes_pushed: result.bytes_pushed,
        committed: matches!(commit, Ok(true)),
    };
    println!("{}", format_final_summary(&summary));

    // A failed state write surfaces after the summary; the prior record is
    // untouched, so the next run simply repeats this one.
    commit?;
    Ok(summary)
}

fn format_candidate_summary(scan: &ScanOutcome) -> String {
    format!(
        "Plan:\n  Files to push: {}\n  Total size: {}",
        scan.count(),
        HumanBytes(scan.total_bytes)
    )
}

fn format_dry_run(scan: &ScanOutcome, source_root: &Path) -> String {
    let mut lines = Vec::with_capacity(scan.count() + 1);
    lines.push("Dry-run candidates:".to_string());
    for file in &scan.files {
        let display = file.strip_prefix(source_root).unwrap_or(file.as_path());
        lines.push(format!("  PUSH      {}", display.display()));
    }
    lines.join("\n")
}

fn format_final_summary(summary: &RunSummary) -> String {
    let status = if summary.failed == 0 {
        style("complete").green()
    } else {
        style("incomplete").yellow()
    };
    let state_note = if summary.committed {
        "state committed"
    } else {
        "state unchanged"
    };
    format!(
        "Sync {}: {} attempted, {} succeeded, {} failed | {} pushed | {}",
        status,
        summary.attempted,
        summary.succeeded,
        summary.failed,
        HumanBytes(summary.bytes_pushed),
        state_note
    )
}
