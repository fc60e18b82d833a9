//! Image acquisition collaborators
//!
//! This module provides:
//! - the `ImagePicker` trait the controller depends on
//! - `editing`: Crop and re-encode of picked images
//! - `platform`: Desktop picker (phone camera over ADB, gallery by path)

mod editing;
mod platform;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::ImageUri;

pub use editing::{crop_to_aspect, encode_jpeg, prepare_asset};
pub use platform::{default_gallery_prompt, GalleryPrompt, PlatformPicker};

/// Where the image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Camera,
    Gallery,
}

impl ImageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Gallery => "library",
        }
    }

    /// i18n key of the notice shown when access is denied
    pub fn permission_message_key(&self) -> &'static str {
        match self {
            Self::Camera => "camera_permission_required",
            Self::Gallery => "library_permission_required",
        }
    }
}

/// Answer to a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    #[default]
    Images,
}

/// Options passed to the picker on launch
#[derive(Debug, Clone, PartialEq)]
pub struct PickerOptions {
    pub media_type: MediaType,
    /// Crop to `aspect` before handing the image over
    pub allows_editing: bool,
    /// Width:height ratio used when editing
    pub aspect: (u32, u32),
    /// JPEG quality in (0, 1]
    pub quality: f32,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            media_type: MediaType::Images,
            allows_editing: true,
            aspect: (1, 1),
            quality: 0.8,
        }
    }
}

impl PickerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_editing(mut self, allows_editing: bool) -> Self {
        self.allows_editing = allows_editing;
        self
    }

    pub fn with_aspect(mut self, width: u32, height: u32) -> Self {
        self.aspect = (width, height);
        self
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }
}

/// A picked image
#[derive(Debug, Clone, PartialEq)]
pub struct PickedAsset {
    pub uri: ImageUri,
    pub width: u32,
    pub height: u32,
}

/// What the picker returned
#[derive(Debug, Clone, PartialEq)]
pub enum PickerResult {
    Cancelled,
    Selected(Vec<PickedAsset>),
}

impl PickerResult {
    /// Locator of the first asset, if it names a resource
    pub fn first_uri(&self) -> Option<&ImageUri> {
        match self {
            Self::Cancelled => None,
            Self::Selected(assets) => assets
                .first()
                .map(|asset| &asset.uri)
                .filter(|uri| !uri.is_empty()),
        }
    }
}

/// Platform permission and picker UI
#[async_trait]
pub trait ImagePicker: Send + Sync {
    async fn request_permission(&self, source: ImageSource) -> PermissionStatus;

    async fn launch(&self, source: ImageSource, options: &PickerOptions) -> Result<PickerResult>;
}
