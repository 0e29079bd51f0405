//! Sync state store
//!
//! Persists the "last successful sync" timestamp as a single float Unix
//! epoch in a small text file. Read at run start, written once at run
//! end, and only when the run had zero failed items. The store has no
//! locking; single-writer usage is the orchestrator's responsibility.

use crate::types::SyncError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// File-backed store for the last-sync timestamp
#[derive(Debug, Clone)]
pub struct SyncStateStore {
    path: PathBuf,
}

impl SyncStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the last successful sync timestamp
    ///
    /// A missing file means no prior sync (full-sync semantics). A present
    /// but unparsable record is reported and treated the same way: a full
    /// re-sync is safe, trusting a garbled timestamp is not.
    pub fn read(&self) -> Result<Option<f64>, SyncError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(SyncError::Io(error)),
        };

        match contents.trim().parse::<f64>() {
            Ok(epoch) => {
                debug!(last_sync = %format_epoch(epoch), "loaded sync state");
                Ok(Some(epoch))
            }
            Err(_) => {
                warn!(
                    path = %self.path.display(),
                    "sync-state file is unreadable; treating as no prior sync"
                );
                Ok(None)
            }
        }
    }

    /// Persist the timestamp via temp-file plus rename
    ///
    /// The rename keeps the prior record intact when the write fails
    /// part-way.
    pub fn write(&self, epoch_seconds: f64) -> Result<(), SyncError> {
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, epoch_seconds.to_string()).map_err(SyncError::PersistState)?;
        fs::rename(&tmp_path, &self.path).map_err(SyncError::PersistState)?;
        debug!(last_sync = %format_epoch(epoch_seconds), "sync state committed");
        Ok(())
    }
}

/// Wall-clock time as float Unix epoch seconds
pub fn now_epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}

/// Human-readable rendering of an epoch timestamp for log lines
pub fn format_epoch(epoch_seconds: f64) -> String {
    chrono::DateTime::from_timestamp(epoch_seconds as i64, 0)
        .map(|timestamp| timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| epoch_seconds.to_string())
}
