//! Error types for droidsync

use std::io;
use thiserror::Error;

/// Error types for droidsync operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The bridge executable could not be located or started
    #[error("Bridge unavailable: {0}")]
    BridgeUnavailable(String),

    /// A bridge command did not complete within its timeout
    #[error("Bridge command timed out after {secs}s: {command}")]
    BridgeTimeout { command: String, secs: u64 },

    /// A bridge command could not be executed to completion
    #[error("Bridge command failed: {command}: {message}")]
    BridgeCommand { command: String, message: String },

    /// No device in a selectable state is attached
    #[error("No devices connected. Connect a device and try again")]
    NoDevicesFound,

    /// Device selection was cancelled by the interactive collaborator
    #[error("Device selection cancelled")]
    SelectionCancelled,

    /// A serial requested on the command line is not attached and ready
    #[error("Device not found or not ready: {0}")]
    DeviceNotFound(String),

    /// Source tree scanning failed
    #[error("Scan error: {0}")]
    Scan(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The sync-state record could not be persisted
    #[error("Failed to persist sync state: {0}")]
    PersistState(#[source] io::Error),

    /// A media-index notification batch failed
    #[error("Index notification failed: {0}")]
    NotificationFailed(String),
}

impl SyncError {
    /// Check if this error originates at the bridge process boundary
    pub fn is_bridge_error(&self) -> bool {
        matches!(
            self,
            SyncError::BridgeUnavailable(_)
                | SyncError::BridgeTimeout { .. }
                | SyncError::BridgeCommand { .. }
        )
    }

    /// Check if this error arose during device resolution
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            SyncError::NoDevicesFound
                | SyncError::SelectionCancelled
                | SyncError::DeviceNotFound(_)
        )
    }

    /// Check if this error aborts a run
    ///
    /// Notification failures are absorbed per batch: the files are already
    /// on the device, only index visibility is degraded.
    pub fn aborts_run(&self) -> bool {
        !matches!(self, SyncError::NotificationFailed(_))
    }
}
