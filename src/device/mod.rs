//! Device registry
//!
//! Lists attached devices through the bridge, resolves an unambiguous
//! target, and attaches display metadata best-effort.

use crate::bridge::CommandRunner;
use crate::types::{ConnectionState, Device, SyncError};
use std::time::Duration;
use tracing::{debug, warn};

/// Capability interface for picking one device out of several
///
/// The core never blocks on console I/O directly; the surrounding binary
/// injects an implementation (see `ui::StdinChooser`).
pub trait DeviceChooser {
    /// Return the index of the chosen device, or `None` when cancelled
    fn choose(&self, devices: &[Device]) -> Option<usize>;
}

/// List attached devices that are ready for selection
///
/// Devices in other states are reported with a warning but are not
/// selectable. Fails with [`SyncError::NoDevicesFound`] when no ready
/// device is attached.
pub fn list_devices(
    runner: &dyn CommandRunner,
    timeout: Duration,
) -> Result<Vec<Device>, SyncError> {
    let args = vec!["devices".to_string(), "-l".to_string()];
    let output = runner.run(&args, timeout)?;
    if !output.success() {
        return Err(SyncError::BridgeCommand {
            command: "devices -l".to_string(),
            message: output.stderr.trim().to_string(),
        });
    }

    let mut ready = Vec::new();
    for device in parse_device_listing(&output.stdout) {
        if device.state.is_ready() {
            ready.push(device);
        } else {
            warn!(
                id = %device.id,
                state = device.state.label(),
                "skipping device that is not ready"
            );
        }
    }

    if ready.is_empty() {
        return Err(SyncError::NoDevicesFound);
    }
    Ok(ready)
}

/// Parse one device record per line of `devices -l` output
///
/// The header line and daemon-startup banner lines are skipped; lines
/// without a serial and state token are ignored.
fn parse_device_listing(stdout: &str) -> Vec<Device> {
    let mut devices = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("List of devices") || line.starts_with('*') {
            continue;
        }
        let mut parts = line.split_whitespace();
        if let (Some(id), Some(state)) = (parts.next(), parts.next()) {
            devices.push(Device::new(id, ConnectionState::from_token(state)));
        }
    }
    devices
}

/// Resolve the target device for this run
///
/// A serial requested up front bypasses the chooser; a single ready device
/// is selected automatically; multiple ready devices go through the
/// injected chooser.
pub fn resolve_target(
    mut devices: Vec<Device>,
    requested_serial: Option<&str>,
    chooser: &dyn DeviceChooser,
) -> Result<Device, SyncError> {
    if let Some(serial) = requested_serial {
        return devices
            .iter()
            .position(|device| device.id == serial)
            .map(|index| devices.swap_remove(index))
            .ok_or_else(|| SyncError::DeviceNotFound(serial.to_string()));
    }

    if devices.len() == 1 {
        return Ok(devices.swap_remove(0));
    }

    match chooser.choose(&devices) {
        Some(index) if index < devices.len() => Ok(devices.swap_remove(index)),
        _ => Err(SyncError::SelectionCancelled),
    }
}

/// Attach model and manufacturer display metadata, best-effort
///
/// Enrichment failures are logged and leave the field unset; the device
/// remains usable either way.
pub fn enrich(runner: &dyn CommandRunner, mut device: Device, timeout: Duration) -> Device {
    device.model = getprop(runner, &device.id, "ro.product.model", timeout);
    device.manufacturer = getprop(runner, &device.id, "ro.product.manufacturer", timeout);
    debug!(device = %device.display_name(), "selected device");
    device
}

fn getprop(
    runner: &dyn CommandRunner,
    id: &str,
    key: &str,
    timeout: Duration,
) -> Option<String> {
    let args = vec![
        "-s".to_string(),
        id.to_string(),
        "shell".to_string(),
        "getprop".to_string(),
        key.to_string(),
    ];
    match runner.run(&args, timeout) {
        Ok(output) if output.success() => {
            let value = output.stdout.trim();
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        }
        Ok(output) => {
            warn!(key, stderr = %output.stderr.trim(), "device property fetch failed");
            None
        }
        Err(error) => {
            warn!(key, %error, "device property fetch failed");
            None
        }
    }
}
