//! Device - identity and connection state of an attached device

use serde::{Deserialize, Serialize};

/// Connection state reported by the bridge's device listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Connected and authorized; selectable for sync
    Ready,

    /// Connected but not authorized on the device
    Unauthorized,

    /// Known to the bridge but offline
    Offline,

    /// Any other state token
    Unknown,
}

impl ConnectionState {
    /// Map a `devices -l` state token to a connection state
    pub fn from_token(token: &str) -> Self {
        match token {
            "device" => ConnectionState::Ready,
            "unauthorized" => ConnectionState::Unauthorized,
            "offline" => ConnectionState::Offline,
            _ => ConnectionState::Unknown,
        }
    }

    /// Only ready devices are eligible for selection
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Ready)
    }

    /// Human-readable label for listings and warnings
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Ready => "ready",
            ConnectionState::Unauthorized => "unauthorized",
            ConnectionState::Offline => "offline",
            ConnectionState::Unknown => "unknown",
        }
    }
}

/// An attached device as seen through the bridge
///
/// Identity is the serial `id`; `model` and `manufacturer` are display
/// metadata attached best-effort after selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Bridge serial identifier
    pub id: String,

    /// Connection state at listing time
    pub state: ConnectionState,

    /// Product model (e.g. "Pixel 7"), if enrichment succeeded
    pub model: Option<String>,

    /// Manufacturer (e.g. "Google"), if enrichment succeeded
    pub manufacturer: Option<String>,
}

impl Device {
    /// Create a device with no display metadata
    pub fn new(id: impl Into<String>, state: ConnectionState) -> Self {
        Self {
            id: id.into(),
            state,
            model: None,
            manufacturer: None,
        }
    }

    /// Display name combining available metadata with the serial
    pub fn display_name(&self) -> String {
        match (&self.manufacturer, &self.model) {
            (Some(manufacturer), Some(model)) => {
                format!("{} {} ({})", manufacturer, model, self.id)
            }
            (None, Some(model)) => format!("{} ({})", model, self.id),
            _ => self.id.clone(),
        }
    }
}
