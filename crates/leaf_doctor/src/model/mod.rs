//! Prediction module for leaf disease inference
//!
//! This module provides:
//! - `types`: Request/result types and the image locator
//! - `client`: Multipart HTTP client for the inference service

mod client;
mod types;

pub use client::{parse_prediction_body, PredictionClient, Predictor};
pub use types::{
    ImageUri, LeafCondition, PredictionRequest, PredictionResult, UPLOAD_FIELD,
    UPLOAD_FILE_NAME, UPLOAD_MIME_TYPE,
};
