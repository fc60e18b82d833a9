//! ADB device discovery and command execution

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::config::TIMING_CONFIG;
use crate::error::{PickerError, Result};

/// Type of ADB connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    Usb,
    Emulator,
    Remote,
}

/// Information about a device known to the ADB server
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub device_id: String,
    /// `device`, `unauthorized`, `offline`, ...
    pub status: String,
    pub connection_type: ConnectionType,
    pub model: Option<String>,
}

impl DeviceInfo {
    /// Device is authorized and ready for shell commands
    pub fn is_ready(&self) -> bool {
        self.status == "device"
    }
}

/// Runs adb commands against one ADB installation
#[derive(Debug, Clone)]
pub struct AdbConnection {
    adb_path: String,
}

impl AdbConnection {
    pub fn new() -> Self {
        Self {
            adb_path: "adb".to_string(),
        }
    }

    /// Use a custom adb binary
    pub fn with_path(adb_path: impl Into<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
        }
    }

    pub fn adb_path(&self) -> &str {
        &self.adb_path
    }

    /// Run `adb [-s device] <args>` with a timeout in seconds
    pub async fn run(&self, device_id: Option<&str>, args: &[&str], timeout: u64) -> Result<Output> {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(id) = device_id {
            cmd.arg("-s").arg(id);
        }
        cmd.args(args);

        debug!("adb {:?} (device: {:?})", args, device_id);

        tokio::time::timeout(Duration::from_secs(timeout), cmd.output())
            .await
            .map_err(|_| {
                PickerError::Timeout(format!("adb {} timed out after {}s", args.join(" "), timeout))
            })?
            .map_err(PickerError::Io)
    }

    /// List all devices known to the ADB server
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let output = self
            .run(None, &["devices", "-l"], TIMING_CONFIG.adb.command_timeout)
            .await?;

        if !output.status.success() {
            return Err(PickerError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(parse_device_list(&String::from_utf8_lossy(&output.stdout)))
    }

    /// State of the given device, or of the first listed device when no id is
    /// given. `None` when no such device is attached.
    pub async fn device_state(&self, device_id: Option<&str>) -> Result<Option<String>> {
        let devices = self.list_devices().await?;

        let device = match device_id {
            Some(id) => devices.into_iter().find(|d| d.device_id == id),
            None => devices.into_iter().next(),
        };

        Ok(device.map(|d| d.status))
    }
}

impl Default for AdbConnection {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `adb devices -l` output
pub fn parse_device_list(stdout: &str) -> Vec<DeviceInfo> {
    let mut devices = Vec::new();

    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('*') || line.starts_with("List of devices") {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }

        let device_id = parts[0].to_string();
        let connection_type = if device_id.contains(':') {
            ConnectionType::Remote
        } else if device_id.starts_with("emulator") {
            ConnectionType::Emulator
        } else {
            ConnectionType::Usb
        };

        let model = parts[2..]
            .iter()
            .find_map(|part| part.strip_prefix("model:"))
            .map(|s| s.to_string());

        devices.push(DeviceInfo {
            device_id,
            status: parts[1].to_string(),
            connection_type,
            model,
        });
    }

    devices
}
