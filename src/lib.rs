//! # droidsync - media sync to Android devices over adb
//!
//! Pushes a local directory tree of media files to a directory on an
//! attached Android device through the adb command-line bridge, with
//! incremental re-sync, per-file retry, and batched media-index
//! notification so new files appear without a rescan.

// Module declarations
pub mod bridge;
pub mod commands;
pub mod config;
pub mod device;
pub mod notify;
pub mod scanner;
pub mod state;
pub mod transfer;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use config::Config;
pub use types::{ConnectionState, Device, SyncError, TransferBatchResult, TransferItem, TransferOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
