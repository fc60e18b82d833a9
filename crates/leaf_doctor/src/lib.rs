//! leaf_doctor: potato leaf disease prediction
//!
//! This library provides:
//! - A prediction client uploading a leaf photo to a remote inference service
//! - A single-screen controller owning the presentation state
//! - An image picker abstraction with a desktop implementation that uses an
//!   ADB-connected phone as the camera
//!
//! # Example
//!
//! ```no_run
//! use leaf_doctor::{ClientConfig, ImageUri, PredictionClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = PredictionClient::new(
//!         ClientConfig::new().with_endpoint("http://localhost:8000/predict"),
//!     )
//!     .unwrap();
//!
//!     let result = client.predict(&ImageUri::new("leaf.jpg")).await;
//!     println!("Result: {:?}", result);
//! }
//! ```

// Core modules
pub mod error;

// Configuration module
pub mod config;

// Device backend
pub mod adb;

// Core functionality
pub mod controller;
pub mod model;
pub mod picker;

// Re-export commonly used types and functions
pub use error::{PickerError, PredictionError, Result};

// Config re-exports
pub use config::{
    get_message, get_messages, resolve_endpoint, ClientConfig, ConfidenceScale, EndpointSource,
    Language, ResolvedEndpoint, TimingConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_MS, ENDPOINT_ENV,
    TIMING_CONFIG,
};

// ADB re-exports
pub use adb::{AdbConnection, ConnectionType, DeviceInfo};

// Model re-exports
pub use model::{
    ImageUri, LeafCondition, PredictionClient, PredictionRequest, PredictionResult, Predictor,
};

// Picker re-exports
pub use picker::{
    GalleryPrompt, ImagePicker, ImageSource, PermissionStatus, PickedAsset, PickerOptions,
    PickerResult, PlatformPicker,
};

// Controller re-exports
pub use controller::{ControllerConfig, PickOutcome, UiController, UiState};
