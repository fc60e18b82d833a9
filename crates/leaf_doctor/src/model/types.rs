//! Request and result types for leaf predictions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::PredictionError;

/// Multipart field carrying the image
pub const UPLOAD_FIELD: &str = "file";

/// File name declared for the uploaded image
pub const UPLOAD_FILE_NAME: &str = "image.jpg";

/// Content type declared for the uploaded image
pub const UPLOAD_MIME_TYPE: &str = "image/jpeg";

/// Locator of a local image: a filesystem path or a `file://` URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageUri(String);

impl ImageUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Build a `file://` URI for an absolute path, or keep the path as-is
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Url::from_file_path(path) {
            Ok(url) => Self(url.to_string()),
            Err(()) => Self(path.display().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the locator is blank and cannot name a resource
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Local path this locator points at
    pub fn to_path(&self) -> PathBuf {
        if let Ok(url) = Url::parse(&self.0) {
            if url.scheme() == "file" {
                if let Ok(path) = url.to_file_path() {
                    return path;
                }
            }
        }
        PathBuf::from(&self.0)
    }
}

impl fmt::Display for ImageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageUri {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ImageUri {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// One upload of one image; built fresh for every prediction
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub image_uri: ImageUri,
    pub file_name: &'static str,
    pub mime_type: &'static str,
}

impl PredictionRequest {
    pub fn new(image_uri: ImageUri) -> Self {
        Self {
            image_uri,
            file_name: UPLOAD_FILE_NAME,
            mime_type: UPLOAD_MIME_TYPE,
        }
    }

    /// Read the raw image bytes
    pub async fn read_bytes(&self) -> Result<Vec<u8>, PredictionError> {
        tokio::fs::read(self.image_uri.to_path())
            .await
            .map_err(|source| PredictionError::ImageUnreadable {
                uri: self.image_uri.to_string(),
                source,
            })
    }
}

/// Classification returned by the service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    label: String,
    confidence_percent: f64,
}

impl PredictionResult {
    pub fn new(label: impl Into<String>, confidence_percent: f64) -> Self {
        Self {
            label: label.into(),
            confidence_percent,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Confidence in [0, 100], rounded to two decimals
    pub fn confidence_percent(&self) -> f64 {
        self.confidence_percent
    }

    /// Confidence formatted with exactly two decimals, e.g. `87.34`
    pub fn confidence_text(&self) -> String {
        format!("{:.2}", self.confidence_percent)
    }

    /// Known leaf condition for this label, if any
    pub fn condition(&self) -> Option<LeafCondition> {
        LeafCondition::from_label(&self.label)
    }
}

/// Classes the potato leaf model is trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafCondition {
    EarlyBlight,
    LateBlight,
    Healthy,
}

impl LeafCondition {
    /// Match a service label loosely: case, `_`/`-` separators and a leading
    /// `Potato` crop prefix are ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label
            .to_lowercase()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let normalized = normalized
            .strip_prefix("potato ")
            .unwrap_or(&normalized)
            .to_string();

        match normalized.as_str() {
            "early blight" => Some(Self::EarlyBlight),
            "late blight" => Some(Self::LateBlight),
            "healthy" => Some(Self::Healthy),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::EarlyBlight => "Early Blight",
            Self::LateBlight => "Late Blight",
            Self::Healthy => "Healthy",
        }
    }

    pub fn is_diseased(&self) -> bool {
        !matches!(self, Self::Healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_text_two_decimals() {
        assert_eq!(PredictionResult::new("Healthy", 87.34).confidence_text(), "87.34");
        assert_eq!(PredictionResult::new("Healthy", 100.0).confidence_text(), "100.00");
        assert_eq!(PredictionResult::new("Healthy", 5.5).confidence_text(), "5.50");
    }

    #[test]
    fn test_condition_from_label() {
        assert_eq!(
            LeafCondition::from_label("Early_Blight"),
            Some(LeafCondition::EarlyBlight)
        );
        assert_eq!(
            LeafCondition::from_label("Late Blight"),
            Some(LeafCondition::LateBlight)
        );
        assert_eq!(
            LeafCondition::from_label("Potato___healthy"),
            Some(LeafCondition::Healthy)
        );
        assert_eq!(LeafCondition::from_label("Tomato mosaic"), None);
        assert!(LeafCondition::EarlyBlight.is_diseased());
        assert!(!LeafCondition::Healthy.is_diseased());
    }

    #[test]
    fn test_result_condition() {
        let result = PredictionResult::new("Late_Blight", 93.21);
        assert_eq!(result.condition(), Some(LeafCondition::LateBlight));
        assert!(result.condition().is_some_and(|c| c.is_diseased()));
        assert_eq!(PredictionResult::new("Unknown", 50.0).condition(), None);
    }

    #[test]
    fn test_image_uri_file_url_to_path() {
        let uri = ImageUri::new("file:///tmp/leaf.jpg");
        assert_eq!(uri.to_path(), PathBuf::from("/tmp/leaf.jpg"));
    }

    #[test]
    fn test_image_uri_plain_path() {
        let uri = ImageUri::new("photos/leaf.jpg");
        assert_eq!(uri.to_path(), PathBuf::from("photos/leaf.jpg"));
    }

    #[test]
    fn test_image_uri_from_absolute_path_round_trips() {
        let uri = ImageUri::from_path("/tmp/leaf.jpg");
        assert_eq!(uri.as_str(), "file:///tmp/leaf.jpg");
        assert_eq!(uri.to_path(), PathBuf::from("/tmp/leaf.jpg"));
    }

    #[test]
    fn test_blank_uri_is_empty() {
        assert!(ImageUri::new("  ").is_empty());
        assert!(!ImageUri::new("a.jpg").is_empty());
    }

    #[test]
    fn test_request_constants() {
        let request = PredictionRequest::new(ImageUri::new("a.jpg"));
        assert_eq!(request.file_name, "image.jpg");
        assert_eq!(request.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_read_missing_image() {
        let request = PredictionRequest::new(ImageUri::new("/definitely/missing/leaf.jpg"));
        let err = request.read_bytes().await.unwrap_err();
        assert!(matches!(err, PredictionError::ImageUnreadable { .. }));
    }
}
