//! Client configuration.

use crate::pending::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Query flag the store expects on full-board reads.
pub const FETCH_QUERY: &str = "secret_tunnel";

/// Endpoint used when none is configured (the reference server).
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3040/";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("Unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Batch capacity must be at least 1")]
    ZeroCapacity,
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the board lives and how large a batch may grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Board store endpoint.
    pub endpoint: String,
    /// Maximum distinct pixels per submitted batch.
    pub capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        self.submit_url().map(|_| ())
    }

    /// URL edit batches are posted to.
    pub fn submit_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.endpoint.trim())?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }

    /// URL of the full-board read: the endpoint with the fetch flag appended.
    pub fn fetch_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.submit_url()?;
        let query = match url.query() {
            Some(q) if !q.is_empty() => format!("{}&{}", q, FETCH_QUERY),
            _ => FETCH_QUERY.to_string(),
        };
        url.set_query(Some(&query));
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fetch_url_appends_flag() {
        let config = ClientConfig::new("https://script.example.com/macros/s/abc/exec");
        assert_eq!(
            config.fetch_url().unwrap().as_str(),
            "https://script.example.com/macros/s/abc/exec?secret_tunnel"
        );

        let config = ClientConfig::new("https://example.com/board?sheet=1");
        assert_eq!(
            config.fetch_url().unwrap().as_str(),
            "https://example.com/board?sheet=1&secret_tunnel"
        );
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(matches!(
            ClientConfig::new("not a url").validate(),
            Err(ConfigError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            ClientConfig::new("ws://localhost:3040").validate(),
            Err(ConfigError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_from_json_defaults() {
        let config = ClientConfig::from_json(r#"{"endpoint":"http://127.0.0.1:9000/"}"#).unwrap();
        assert_eq!(config.endpoint, "http://127.0.0.1:9000/");
        assert_eq!(config.capacity, 256);

        assert!(matches!(
            ClientConfig::from_json(r#"{"capacity":0}"#),
            Err(ConfigError::ZeroCapacity)
        ));
    }
}
