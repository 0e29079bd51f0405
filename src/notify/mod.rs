//! Index notifier
//!
//! After successful pushes, tells the device's media index to rescan the
//! new paths so they appear in galleries without a reboot.

use crate::bridge::CommandRunner;
use crate::types::{Device, SyncError};
use std::time::Duration;
use tracing::{debug, warn};

/// Broadcast action understood by the device's media index
const MEDIA_SCAN_ACTION: &str = "android.intent.action.MEDIA_SCANNER_SCAN_FILE";

/// Default number of paths per broadcast
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Outcome of a notification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyStats {
    pub batches_sent: usize,
    pub batches_failed: usize,
}

impl NotifyStats {
    pub fn all_delivered(&self) -> bool {
        self.batches_failed == 0
    }
}

/// Notify the device's media index about confirmed remote paths
///
/// Paths are grouped into fixed-size batches; each batch is one broadcast
/// call. Batches are independent: a failed batch is logged and counted,
/// and the next batch is still attempted. Only paths whose push succeeded
/// may be passed here.
pub fn notify_index(
    runner: &dyn CommandRunner,
    device: &Device,
    remote_paths: &[String],
    batch_size: usize,
    timeout: Duration,
) -> NotifyStats {
    let mut stats = NotifyStats::default();
    if remote_paths.is_empty() {
        return stats;
    }

    for batch in remote_paths.chunks(batch_size.max(1)) {
        match send_batch(runner, device, batch, timeout) {
            Ok(()) => {
                stats.batches_sent += 1;
                debug!(paths = batch.len(), "media index notified");
            }
            Err(error) => {
                stats.batches_failed += 1;
                warn!(%error, paths = batch.len(), "index notification batch failed");
            }
        }
    }
    stats
}

fn send_batch(
    runner: &dyn CommandRunner,
    device: &Device,
    batch: &[String],
    timeout: Duration,
) -> Result<(), SyncError> {
    let args = vec![
        "-s".to_string(),
        device.id.clone(),
        "shell".to_string(),
        "am".to_string(),
        "broadcast".to_string(),
        "-a".to_string(),
        MEDIA_SCAN_ACTION.to_string(),
        "-d".to_string(),
        uri_list(batch),
    ];
    let output = runner
        .run(&args, timeout)
        .map_err(|error| SyncError::NotificationFailed(error.to_string()))?;
    if output.success() {
        Ok(())
    } else {
        Err(SyncError::NotificationFailed(format!(
            "broadcast exited with {:?}: {}",
            output.status,
            output.stderr.trim()
        )))
    }
}

/// Space-joined `file://` URI list carried as a single shell argument
///
/// Known compatibility risk: a path containing a space splits into two
/// URIs on the device side. Preserved as-is for bridge compatibility.
fn uri_list(paths: &[String]) -> String {
    paths
        .iter()
        .map(|path| format!("file://{}", path))
        .collect::<Vec<_>>()
        .join(" ")
}
