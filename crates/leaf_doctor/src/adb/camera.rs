//! Photo capture through the device's own camera app

use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::adb::AdbConnection;
use crate::config::TIMING_CONFIG;
use crate::error::{PickerError, Result};

/// Folder the stock camera app writes photos to
pub const CAMERA_DIR: &str = "/sdcard/DCIM/Camera";

const STILL_IMAGE_INTENT: &str = "android.media.action.STILL_IMAGE_CAMERA";

lazy_static! {
    static ref PHOTO_NAME: Regex = Regex::new(r"(?i)^[^/]+\.(jpe?g|png|webp|heic)$").unwrap();
}

/// Newest photo name in an `ls -t` listing (newest first)
pub fn parse_latest_photo(listing: &str) -> Option<String> {
    listing
        .lines()
        .map(str::trim)
        .find(|name| PHOTO_NAME.is_match(name))
        .map(|name| name.to_string())
}

/// Name of the newest photo in the camera folder
pub async fn latest_photo(conn: &AdbConnection, device_id: Option<&str>) -> Result<Option<String>> {
    let output = conn
        .run(
            device_id,
            &["shell", "ls", "-t", CAMERA_DIR],
            TIMING_CONFIG.adb.command_timeout,
        )
        .await?;

    // A missing folder just means no photo was taken yet
    Ok(parse_latest_photo(&String::from_utf8_lossy(&output.stdout)))
}

/// Open the camera app in still-image mode
pub async fn launch_camera(conn: &AdbConnection, device_id: Option<&str>) -> Result<()> {
    let output = conn
        .run(
            device_id,
            &["shell", "am", "start", "-a", STILL_IMAGE_INTENT],
            TIMING_CONFIG.adb.command_timeout,
        )
        .await?;

    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    if !output.status.success() || combined.contains("Error") {
        return Err(PickerError::CommandFailed(combined.trim().to_string()));
    }

    Ok(())
}

/// Copy a file from the device to a local path
pub async fn pull_file(
    conn: &AdbConnection,
    device_id: Option<&str>,
    remote: &str,
    local: &Path,
) -> Result<()> {
    let local_str = local.to_string_lossy();
    let output = conn
        .run(
            device_id,
            &["pull", remote, local_str.as_ref()],
            TIMING_CONFIG.adb.pull_timeout,
        )
        .await?;

    if !output.status.success() {
        return Err(PickerError::CommandFailed(format!(
            "adb pull failed: {}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let file_size = tokio::fs::metadata(local).await.map(|m| m.len()).unwrap_or(0);
    if file_size == 0 {
        return Err(PickerError::CommandFailed(format!(
            "Pulled file {} is empty",
            local.display()
        )));
    }

    debug!("Pulled {} ({} bytes)", remote, file_size);
    Ok(())
}

/// Launch the camera and wait for a new photo to appear, then pull it to
/// `local_path`.
///
/// Returns `None` when no new photo shows up before the capture timeout,
/// which the picker reports as a cancellation.
pub async fn capture_photo(
    conn: &AdbConnection,
    device_id: Option<&str>,
    local_path: &Path,
) -> Result<Option<PathBuf>> {
    let timing = &TIMING_CONFIG.capture;
    let before = latest_photo(conn, device_id).await?;

    launch_camera(conn, device_id).await?;
    info!("Camera opened, waiting for a new photo in {}", CAMERA_DIR);
    tokio::time::sleep(Duration::from_secs_f64(timing.camera_launch_delay)).await;

    let deadline = Instant::now() + Duration::from_secs_f64(timing.capture_timeout);
    let poll_interval = Duration::from_secs_f64(timing.poll_interval);

    loop {
        match latest_photo(conn, device_id).await {
            Ok(Some(latest)) if before.as_deref() != Some(latest.as_str()) => {
                // Give the camera app a moment to finish writing the file
                tokio::time::sleep(poll_interval).await;

                let remote = format!("{}/{}", CAMERA_DIR, latest);
                pull_file(conn, device_id, &remote, local_path).await?;
                return Ok(Some(local_path.to_path_buf()));
            }
            Ok(_) => {}
            Err(e) => warn!("Listing {} failed: {}", CAMERA_DIR, e),
        }

        if Instant::now() >= deadline {
            info!("No photo taken within {}s", timing.capture_timeout);
            return Ok(None);
        }

        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_latest_photo() {
        let listing = "IMG_20261019_101500.jpg\nIMG_20261019_090000.jpg\n";
        assert_eq!(
            parse_latest_photo(listing).as_deref(),
            Some("IMG_20261019_101500.jpg")
        );
    }

    #[test]
    fn test_parse_latest_photo_skips_non_images() {
        let listing = ".pending-1700000000-IMG.tmp\nVID_20261019.mp4\nPXL_20261019.JPG\n";
        assert_eq!(parse_latest_photo(listing).as_deref(), Some("PXL_20261019.JPG"));
    }

    #[test]
    fn test_parse_missing_folder() {
        let listing = "ls: /sdcard/DCIM/Camera: No such file or directory\n";
        assert_eq!(parse_latest_photo(listing), None);
    }
}
