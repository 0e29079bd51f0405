//! Core type definitions for droidsync

mod device;
mod error;
mod transfer;

pub use device::{ConnectionState, Device};
pub use error::SyncError;
pub use transfer::{TransferBatchResult, TransferItem, TransferOutcome};
