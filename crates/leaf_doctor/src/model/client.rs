//! HTTP client for the leaf disease inference service

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{ClientConfig, ConfidenceScale, ResolvedEndpoint};
use crate::error::PredictionError;
use crate::model::types::{ImageUri, PredictionRequest, PredictionResult, UPLOAD_FIELD};

/// Anything that can turn a local image into a classification
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, image_uri: &ImageUri) -> Result<PredictionResult, PredictionError>;
}

/// Client performing one multipart upload per prediction.
///
/// Stateless between calls: no retries, no caching.
pub struct PredictionClient {
    config: ClientConfig,
    http: Client,
}

impl PredictionClient {
    /// Create a new PredictionClient; the configured timeout applies to the
    /// whole request
    pub fn new(config: ClientConfig) -> Result<Self, PredictionError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve the endpoint for the next request
    pub fn endpoint(&self) -> Result<ResolvedEndpoint, PredictionError> {
        let resolved = self.config.resolve_endpoint();
        // Resolution always falls back to a non-empty default, so this guard
        // cannot fire today.
        if resolved.url.trim().is_empty() {
            return Err(PredictionError::ConfigError);
        }
        Ok(resolved)
    }

    /// Upload the image and parse the classification
    pub async fn predict(&self, image_uri: &ImageUri) -> Result<PredictionResult, PredictionError> {
        let request = PredictionRequest::new(image_uri.clone());
        let bytes = request.read_bytes().await?;
        let byte_count = bytes.len();

        let part = Part::bytes(bytes)
            .file_name(request.file_name)
            .mime_str(request.mime_type)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let endpoint = self.endpoint()?;
        debug!(
            "Uploading {} bytes from {} to {} ({:?})",
            byte_count, image_uri, endpoint.url, endpoint.source
        );

        let start_time = Instant::now();
        let response = self.http.post(&endpoint.url).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            warn!("Prediction service returned {}", status);
            return Err(PredictionError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let result = parse_prediction_body(&body, self.config.confidence_scale)?;

        info!(
            "Predicted {} ({}%) in {:.3}s",
            result.label(),
            result.confidence_text(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(result)
    }

    /// Check whether the service answers on its `ping` route, a sibling of the
    /// predict path
    pub async fn ping(&self) -> Result<bool, PredictionError> {
        let endpoint = self.endpoint()?;
        let ping_url = ping_url(&endpoint.url)?;

        debug!("Pinging {}", ping_url);

        let response = self.http.get(ping_url).send().await?;
        if response.status().is_success() {
            Ok(true)
        } else {
            warn!("Ping returned {}", response.status());
            Ok(false)
        }
    }
}

#[async_trait]
impl Predictor for PredictionClient {
    async fn predict(&self, image_uri: &ImageUri) -> Result<PredictionResult, PredictionError> {
        PredictionClient::predict(self, image_uri).await
    }
}

/// `ping` URL next to the predict endpoint
fn ping_url(endpoint: &str) -> Result<Url, PredictionError> {
    Url::parse(endpoint)
        .and_then(|url| url.join("ping"))
        .map_err(|e| PredictionError::TransportError(format!("Invalid endpoint {}: {}", endpoint, e)))
}

/// Parse a `{"class": ..., "confidence": ...}` body.
///
/// An empty body or JSON `null` is an empty response; anything else lacking a
/// non-empty `class` string and a numeric `confidence` within the scale's range
/// is malformed.
pub fn parse_prediction_body(
    body: &[u8],
    scale: ConfidenceScale,
) -> Result<PredictionResult, PredictionError> {
    let text = String::from_utf8_lossy(body);
    if text.trim().is_empty() {
        return Err(PredictionError::EmptyResponse);
    }

    let value: Value = serde_json::from_str(&text).map_err(|e| {
        PredictionError::InvalidResponseFormat(format!("body is not JSON: {}", e))
    })?;

    if value.is_null() {
        return Err(PredictionError::EmptyResponse);
    }

    let object = value.as_object().ok_or_else(|| {
        PredictionError::InvalidResponseFormat("expected a JSON object".to_string())
    })?;

    let label = object
        .get("class")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            PredictionError::InvalidResponseFormat("missing or empty `class`".to_string())
        })?;

    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            PredictionError::InvalidResponseFormat(
                "missing or non-numeric `confidence`".to_string(),
            )
        })?;

    let percent = scale.to_percent(confidence).ok_or_else(|| {
        PredictionError::InvalidResponseFormat(format!(
            "confidence {} outside the {} range",
            confidence,
            scale.as_str()
        ))
    })?;

    Ok(PredictionResult::new(label, percent))
}
