//! Error types for prediction requests and image picking

use thiserror::Error;

/// Failure of a single prediction attempt
#[derive(Debug, Error)]
pub enum PredictionError {
    /// Endpoint resolved to an empty value. Unreachable while a non-empty
    /// default endpoint exists.
    #[error("API URL not configured")]
    ConfigError,

    /// Timeout, DNS, refused connection, TLS and similar failures
    #[error("{0}")]
    TransportError(String),

    #[error("No data received from server")]
    EmptyResponse,

    #[error("Invalid response format: {0}")]
    InvalidResponseFormat(String),

    #[error("Request failed with status code {status}")]
    Status { status: u16, body: String },

    #[error("Cannot read image {uri}: {source}")]
    ImageUnreadable {
        uri: String,
        #[source]
        source: std::io::Error,
    },
}

impl PredictionError {
    /// Message shown to the user in the error slot of the UI state
    pub fn user_message(&self) -> String {
        match self {
            // Transport messages are surfaced verbatim
            Self::TransportError(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for PredictionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::TransportError(format!("Request timed out: {}", err));
        }
        Self::TransportError(err.to_string())
    }
}

/// Failure of the platform picker (permission denial and cancellation are
/// values, not errors)
#[derive(Debug, Error)]
pub enum PickerError {
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Picker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, PickerError>;
