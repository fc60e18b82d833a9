//! Prediction endpoint configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Endpoint used when neither an override nor the environment provides one
pub const DEFAULT_ENDPOINT: &str =
    "https://us-central1-isentropic-tape-458318-t1.cloudfunctions.net/predict";

/// Environment variable consulted for the endpoint
pub const ENDPOINT_ENV: &str = "LEAF_DOCTOR_URL";

/// Environment variable consulted for the request timeout (milliseconds)
pub const TIMEOUT_ENV: &str = "LEAF_DOCTOR_TIMEOUT_MS";

/// Hard request timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// How the service reports confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfidenceScale {
    /// Probability in [0, 1]
    #[default]
    Fraction,
    /// Already a percentage in [0, 100]
    Percent,
}

impl ConfidenceScale {
    /// Parse scale from string, falling back to `Fraction`
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "percent" | "percentage" | "pct" => Self::Percent,
            _ => Self::Fraction,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fraction => "fraction",
            Self::Percent => "percent",
        }
    }

    /// Convert a reported confidence into a percentage rounded to two decimals.
    ///
    /// Returns `None` when the value is not finite or falls outside the range
    /// of this scale.
    pub fn to_percent(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let percent = match self {
            Self::Fraction if (0.0..=1.0).contains(&value) => value * 100.0,
            Self::Percent if (0.0..=100.0).contains(&value) => value,
            _ => return None,
        };
        Some((percent * 100.0).round() / 100.0)
    }
}

/// Where the resolved endpoint came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    Override,
    Environment,
    Default,
}

/// Endpoint after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub url: String,
    pub source: EndpointSource,
}

impl ResolvedEndpoint {
    /// Scale this endpoint is known to report in. The hosted cloud function
    /// multiplies by 100 before replying.
    pub fn known_scale(&self) -> Option<ConfidenceScale> {
        (self.url.trim_end_matches('/') == DEFAULT_ENDPOINT).then_some(ConfidenceScale::Percent)
    }

    /// True when `scale` cannot read replies from this endpoint
    pub fn scale_mismatch(&self, scale: ConfidenceScale) -> bool {
        self.known_scale().is_some_and(|known| known != scale)
    }
}

/// Resolve the endpoint: explicit override, then environment value, then the
/// built-in default. Absent, empty and whitespace-only values are skipped.
pub fn resolve_endpoint(override_url: Option<&str>, env_url: Option<&str>) -> ResolvedEndpoint {
    let present = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    if let Some(url) = present(override_url) {
        return ResolvedEndpoint {
            url,
            source: EndpointSource::Override,
        };
    }

    if let Some(url) = present(env_url) {
        return ResolvedEndpoint {
            url,
            source: EndpointSource::Environment,
        };
    }

    ResolvedEndpoint {
        url: DEFAULT_ENDPOINT.to_string(),
        source: EndpointSource::Default,
    }
}

/// Configuration injected into the prediction client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Explicit endpoint override
    pub endpoint: Option<String>,
    pub timeout: Duration,
    pub confidence_scale: ConfidenceScale,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: Duration::from_millis(
                env::var(TIMEOUT_ENV)
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_MS),
            ),
            confidence_scale: ConfidenceScale::default(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit endpoint, taking precedence over the environment
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_confidence_scale(mut self, scale: ConfidenceScale) -> Self {
        self.confidence_scale = scale;
        self
    }

    /// Resolve the endpoint against the process environment
    pub fn resolve_endpoint(&self) -> ResolvedEndpoint {
        let env_url = env::var(ENDPOINT_ENV).ok();
        resolve_endpoint(self.endpoint.as_deref(), env_url.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint_reports_percent() {
        let resolved = resolve_endpoint(None, None);
        assert_eq!(resolved.known_scale(), Some(ConfidenceScale::Percent));
        assert!(resolved.scale_mismatch(ConfidenceScale::Fraction));
        assert!(!resolved.scale_mismatch(ConfidenceScale::Percent));
    }

    #[test]
    fn test_custom_endpoint_scale_unknown() {
        let resolved = resolve_endpoint(Some("http://localhost:8000/predict"), None);
        assert_eq!(resolved.known_scale(), None);
        assert!(!resolved.scale_mismatch(ConfidenceScale::Fraction));
    }

    #[test]
    fn test_override_wins() {
        let resolved = resolve_endpoint(Some("http://override/predict"), Some("http://env/predict"));
        assert_eq!(resolved.url, "http://override/predict");
        assert_eq!(resolved.source, EndpointSource::Override);
    }

    #[test]
    fn test_environment_before_default() {
        let resolved = resolve_endpoint(None, Some("http://env/predict"));
        assert_eq!(resolved.url, "http://env/predict");
        assert_eq!(resolved.source, EndpointSource::Environment);
    }

    #[test]
    fn test_empty_values_fall_through() {
        let resolved = resolve_endpoint(Some("  "), Some(""));
        assert_eq!(resolved.url, DEFAULT_ENDPOINT);
        assert_eq!(resolved.source, EndpointSource::Default);
    }

    #[test]
    fn test_fraction_to_percent() {
        assert_eq!(ConfidenceScale::Fraction.to_percent(0.8734), Some(87.34));
        assert_eq!(ConfidenceScale::Fraction.to_percent(1.0), Some(100.0));
        assert_eq!(ConfidenceScale::Fraction.to_percent(0.99999), Some(100.0));
        assert_eq!(ConfidenceScale::Fraction.to_percent(1.5), None);
        assert_eq!(ConfidenceScale::Fraction.to_percent(-0.1), None);
        assert_eq!(ConfidenceScale::Fraction.to_percent(f64::NAN), None);
    }

    #[test]
    fn test_percent_scale() {
        assert_eq!(ConfidenceScale::Percent.to_percent(87.344), Some(87.34));
        assert_eq!(ConfidenceScale::Percent.to_percent(100.5), None);
    }

    #[test]
    fn test_scale_from_str() {
        assert_eq!(ConfidenceScale::from_str("percent"), ConfidenceScale::Percent);
        assert_eq!(ConfidenceScale::from_str("Fraction"), ConfidenceScale::Fraction);
        assert_eq!(ConfidenceScale::from_str("other"), ConfidenceScale::Fraction);
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new()
            .with_endpoint("http://localhost:8000/predict")
            .with_timeout(Duration::from_millis(500))
            .with_confidence_scale(ConfidenceScale::Percent);

        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:8000/predict"));
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.confidence_scale, ConfidenceScale::Percent);
        assert_eq!(config.resolve_endpoint().source, EndpointSource::Override);
    }
}
