//! Configuration module for leaf_doctor
//!
//! This module contains:
//! - `endpoint`: Prediction endpoint, timeout and confidence scale
//! - `timing`: Timing configurations for device camera capture
//! - `i18n`: Internationalization support

mod endpoint;
mod i18n;
mod timing;

pub use endpoint::{
    resolve_endpoint, ClientConfig, ConfidenceScale, EndpointSource, ResolvedEndpoint,
    DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_MS, ENDPOINT_ENV, TIMEOUT_ENV,
};
pub use i18n::{get_message, get_messages, Language, MESSAGES_EN, MESSAGES_FR};
pub use timing::{AdbTimingConfig, CaptureTimingConfig, TimingConfig, TIMING_CONFIG};
