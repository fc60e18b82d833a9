//! Desktop image picker: phone camera over ADB, gallery by file path

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::adb::{self, AdbConnection};
use crate::error::{PickerError, Result};
use crate::model::ImageUri;
use crate::picker::{
    prepare_asset, ImagePicker, ImageSource, PermissionStatus, PickedAsset, PickerOptions,
    PickerResult,
};

/// Callback asking the user for a gallery image; `None` cancels.
///
/// Runs on the blocking thread pool, so it may wait on stdin.
pub type GalleryPrompt = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Default gallery prompt reading a path from stdin
pub fn default_gallery_prompt() -> Option<String> {
    print!("Image path (empty to cancel): ");
    io::stdout().flush().ok();

    let mut input = String::new();
    match io::stdin().lock().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let path = input.trim();
            if path.is_empty() {
                None
            } else {
                Some(path.to_string())
            }
        }
    }
}

/// Picker backed by an ADB-connected phone (camera) and the local
/// filesystem (gallery).
///
/// Picked images are cropped and re-encoded into a session directory that
/// lives as long as the picker.
pub struct PlatformPicker {
    device_id: Option<String>,
    connection: AdbConnection,
    gallery_prompt: GalleryPrompt,
    session_dir: TempDir,
    pick_count: AtomicUsize,
}

impl PlatformPicker {
    /// Create a new PlatformPicker
    ///
    /// # Arguments
    /// * `device_id` - ADB device used as the camera (first device if `None`)
    /// * `gallery_prompt` - Optional callback choosing a gallery image
    pub fn new(device_id: Option<String>, gallery_prompt: Option<GalleryPrompt>) -> Result<Self> {
        let session_dir = tempfile::Builder::new()
            .prefix("leaf-doctor-")
            .tempdir()
            .map_err(PickerError::Io)?;

        debug!("Picker session directory: {}", session_dir.path().display());

        Ok(Self {
            device_id,
            connection: AdbConnection::new(),
            gallery_prompt: gallery_prompt.unwrap_or_else(|| Arc::new(default_gallery_prompt)),
            session_dir,
            pick_count: AtomicUsize::new(0),
        })
    }

    /// Use a specific ADB connection (custom adb binary)
    pub fn with_connection(mut self, connection: AdbConnection) -> Self {
        self.connection = connection;
        self
    }

    pub fn session_dir(&self) -> &Path {
        self.session_dir.path()
    }

    /// Next file path in the session directory, e.g.
    /// `pick_001_camera_2026-10-19_10-15-00-123.jpg`
    fn next_path(&self, source: ImageSource, suffix: &str) -> PathBuf {
        let count = self.pick_count.fetch_add(1, Ordering::SeqCst) + 1;
        let now: DateTime<Local> = Local::now();
        let name = format!(
            "pick_{:03}_{}_{}{}",
            count,
            source.as_str(),
            now.format("%Y-%m-%d_%H-%M-%S-%3f"),
            suffix
        );
        self.session_dir.path().join(name)
    }

    async fn launch_gallery(&self, options: &PickerOptions) -> Result<PickerResult> {
        let prompt = Arc::clone(&self.gallery_prompt);
        let Some(input) = tokio::task::spawn_blocking(move || prompt()).await? else {
            return Ok(PickerResult::Cancelled);
        };

        // Terminals quote dragged-in paths
        let input = input.trim().trim_matches(|c| c == '"' || c == '\'');
        if input.is_empty() {
            return Ok(PickerResult::Cancelled);
        }

        let source = ImageUri::new(input).to_path();
        if !source.is_file() {
            return Err(PickerError::NotFound(source.display().to_string()));
        }

        let dest = self.next_path(ImageSource::Gallery, ".jpg");
        let asset = prepare_off_runtime(source.clone(), dest, options).await?;
        info!("Selected {} from gallery", source.display());

        Ok(PickerResult::Selected(vec![asset]))
    }

    async fn launch_camera(&self, options: &PickerOptions) -> Result<PickerResult> {
        let raw = self.next_path(ImageSource::Camera, "_raw.jpg");

        let captured =
            adb::capture_photo(&self.connection, self.device_id.as_deref(), &raw).await?;
        let Some(raw) = captured else {
            return Ok(PickerResult::Cancelled);
        };

        let dest = self.next_path(ImageSource::Camera, ".jpg");
        let asset = prepare_off_runtime(raw, dest, options).await?;

        Ok(PickerResult::Selected(vec![asset]))
    }
}

/// Decode, crop and re-encode on the blocking thread pool
async fn prepare_off_runtime(
    source: PathBuf,
    dest: PathBuf,
    options: &PickerOptions,
) -> Result<PickedAsset> {
    let options = options.clone();
    tokio::task::spawn_blocking(move || prepare_asset(&source, &dest, &options)).await?
}

#[async_trait]
impl ImagePicker for PlatformPicker {
    async fn request_permission(&self, source: ImageSource) -> PermissionStatus {
        match source {
            // Local files need no grant on desktop
            ImageSource::Gallery => PermissionStatus::Granted,
            ImageSource::Camera => {
                match self.connection.device_state(self.device_id.as_deref()).await {
                    Ok(Some(state)) if state == "device" => PermissionStatus::Granted,
                    Ok(Some(state)) => {
                        warn!("Camera device is {}", state);
                        PermissionStatus::Denied
                    }
                    Ok(None) => {
                        warn!("No camera device attached");
                        PermissionStatus::Denied
                    }
                    Err(e) => {
                        warn!("Cannot query camera device: {}", e);
                        PermissionStatus::Denied
                    }
                }
            }
        }
    }

    async fn launch(&self, source: ImageSource, options: &PickerOptions) -> Result<PickerResult> {
        match source {
            ImageSource::Gallery => self.launch_gallery(options).await,
            ImageSource::Camera => self.launch_camera(options).await,
        }
    }
}
