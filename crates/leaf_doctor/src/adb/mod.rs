//! ADB (Android Debug Bridge) module for using a phone as the camera
//!
//! This module provides:
//! - `connection`: Device discovery and command execution
//! - `camera`: Photo capture through the device camera app

mod camera;
mod connection;

pub use camera::{
    capture_photo, latest_photo, launch_camera, parse_latest_photo, pull_file, CAMERA_DIR,
};
pub use connection::{parse_device_list, AdbConnection, ConnectionType, DeviceInfo};
