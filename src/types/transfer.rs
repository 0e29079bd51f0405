//! TransferItem - a single file scheduled for push to the device

use super::SyncError;
use std::path::{Component, Path, PathBuf};

/// A local file resolved against the source/target root pair
#[derive(Debug, Clone, PartialEq)]
pub struct TransferItem {
    /// Absolute local path
    pub local: PathBuf,

    /// Path relative to the source root
    pub relative: PathBuf,

    /// Destination path on the device, always `/`-joined
    pub remote: String,

    /// File size in bytes
    pub size: u64,
}

impl TransferItem {
    /// Resolve a local file into a transfer item
    ///
    /// The relative path must stay inside `source_root`: `..` segments or
    /// absolute components are rejected rather than silently escaping the
    /// target directory on the device.
    pub fn resolve(
        source_root: &Path,
        target_root: &str,
        local: &Path,
        size: u64,
    ) -> Result<Self, SyncError> {
        let relative = local.strip_prefix(source_root).map_err(|_| {
            SyncError::Scan(format!(
                "{} is outside the source root {}",
                local.display(),
                source_root.display()
            ))
        })?;

        if relative.components().any(|component| {
            !matches!(component, Component::Normal(_) | Component::CurDir)
        }) {
            return Err(SyncError::Scan(format!(
                "{} escapes the source root",
                local.display()
            )));
        }

        Ok(Self {
            local: local.to_path_buf(),
            relative: relative.to_path_buf(),
            remote: device_path(target_root, relative),
            size,
        })
    }

    /// Remote parent directory, for idempotent `mkdir -p`
    pub fn remote_parent(&self) -> String {
        match self.remote.rsplit_once('/') {
            Some((parent, _)) if !parent.is_empty() => parent.to_string(),
            _ => "/".to_string(),
        }
    }
}

/// Join a device target root and a host-relative path with `/` separators
///
/// Host platforms may use `\`; device paths never do.
fn device_path(target_root: &str, relative: &Path) -> String {
    let mut remote = target_root.trim_end_matches('/').to_string();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            remote.push('/');
            remote.push_str(&part.to_string_lossy());
        }
    }
    remote
}

/// Per-item transfer result
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    /// File confirmed on the device at `remote`
    Succeeded { remote: String },

    /// All attempts exhausted; `reason` is the last failure
    FailedAfterRetries { reason: String },
}

/// Aggregated result of a push batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferBatchResult {
    /// Remote paths of confirmed pushes, in completion order
    pub succeeded: Vec<String>,

    /// Items that exhausted their retry budget
    pub failed: usize,

    /// Items attempted (cancelled items are not attempted)
    pub attempted: usize,

    /// Bytes of completed files only
    pub bytes_pushed: u64,

    /// Run was cancelled between files
    pub cancelled: bool,
}

impl TransferBatchResult {
    /// True when every attempted item succeeded and nothing was skipped
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && !self.cancelled
    }
}
