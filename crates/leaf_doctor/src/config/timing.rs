//! Timing configuration for device camera capture

use lazy_static::lazy_static;
use std::env;
use std::str::FromStr;

/// Read `key` from the environment, falling back when unset or unparsable
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Camera capture timing
#[derive(Debug, Clone)]
pub struct CaptureTimingConfig {
    /// Delay after starting the camera intent before polling the photo folder
    pub camera_launch_delay: f64,
    /// Interval between photo folder listings
    pub poll_interval: f64,
    /// Time the user has to take a photo before the capture counts as cancelled
    pub capture_timeout: f64,
}

impl Default for CaptureTimingConfig {
    fn default() -> Self {
        Self {
            camera_launch_delay: env_or("LEAF_DOCTOR_CAMERA_LAUNCH_DELAY", 1.0),
            poll_interval: env_or("LEAF_DOCTOR_CAPTURE_POLL_INTERVAL", 1.0),
            capture_timeout: env_or("LEAF_DOCTOR_CAPTURE_TIMEOUT", 120.0),
        }
    }
}

/// Timeouts for individual adb invocations (seconds)
#[derive(Debug, Clone)]
pub struct AdbTimingConfig {
    pub command_timeout: u64,
    pub pull_timeout: u64,
}

impl Default for AdbTimingConfig {
    fn default() -> Self {
        Self {
            command_timeout: env_or("LEAF_DOCTOR_ADB_TIMEOUT", 10),
            pull_timeout: env_or("LEAF_DOCTOR_ADB_PULL_TIMEOUT", 30),
        }
    }
}

/// Master timing configuration
#[derive(Debug, Clone, Default)]
pub struct TimingConfig {
    pub capture: CaptureTimingConfig,
    pub adb: AdbTimingConfig,
}

lazy_static! {
    /// Global timing configuration instance
    pub static ref TIMING_CONFIG: TimingConfig = TimingConfig::default();
}
