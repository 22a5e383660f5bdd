//! Configuration for HttpBackend.

use std::env;
use std::time::Duration;

use engage_core::EngageError;

/// Default HTTP timeout for backend requests (60 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for HttpBackend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the site serving `/api/chat`.
    pub api_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl BackendConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `ENGAGE_API_URL` - Base URL of the chat backend
    ///
    /// Optional environment variables:
    /// - `ENGAGE_API_TIMEOUT_SECS` - Request timeout (default: 60)
    pub fn from_env() -> Result<Self, EngageError> {
        let api_url = env::var("ENGAGE_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| EngageError::Configuration("ENGAGE_API_URL not set".to_string()))?;

        let timeout_secs = env::var("ENGAGE_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Create a new config builder.
    pub fn builder() -> BackendConfigBuilder {
        BackendConfigBuilder::default()
    }

    /// `api_url` joined with `path`, without doubled slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Builder for BackendConfig.
#[derive(Debug, Default)]
pub struct BackendConfigBuilder {
    config: BackendConfig,
}

impl BackendConfigBuilder {
    /// Set the backend base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> BackendConfig {
        self.config
    }
}
