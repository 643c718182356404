//! Gemini client configuration

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the Gemini `generateContent` API
///
/// The API key never comes from the config file; it is filled in from the
/// environment.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    #[serde(skip)]
    pub api_key: String,

    /// Model name, e.g. `gemini-1.5-flash`
    pub model: String,

    /// Base URL up to and including the API version
    pub endpoint: String,

    /// Per-request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    /// Requests allowed in flight at once
    pub max_concurrent: usize,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(60),
            max_concurrent: 2,
        }
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Point the client at another server (used by tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Full URL of the `generateContent` method
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

// Keep the key out of logs
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("max_concurrent", &self.max_concurrent)
            .finish()
    }
}

/// Serde adapter for durations written as whole seconds
pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_concurrent, 2);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_generate_url() {
        let config = GeminiConfig::new("key").with_endpoint("http://127.0.0.1:9000/v1beta/");
        assert_eq!(
            config.generate_url(),
            "http://127.0.0.1:9000/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GeminiConfig::new("secret-key");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("secret-key"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_max_concurrent_is_at_least_one() {
        assert_eq!(GeminiConfig::default().with_max_concurrent(0).max_concurrent, 1);
    }
}
