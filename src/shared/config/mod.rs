//! Application configuration module
//!
//! Provides the engine configuration, a builder for it, and TOML loading.
//!
//! ```toml
//! server_url = "https://powermason.example.com"
//! endpoint_path = "/api/dashboard/"
//! token = "..."
//! role = "PM"
//! poll_interval_secs = 30
//! watch_fields = ["project_type"]
//! ```

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_ENDPOINT_PATH: &str = "/api/dashboard/";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server URL
    pub server_url: String,
    /// Path of the polled dashboard endpoint
    pub endpoint_path: String,
    /// Session token passed in the query string
    pub token: Option<String>,
    /// User role passed in the query string
    pub role: Option<String>,
    pub poll_interval_secs: u64,
    /// Fixed delay before each short retry
    pub retry_delay_secs: u64,
    /// Consecutive failures before the interval backs off
    pub max_retries: u32,
    pub backoff_factor: f64,
    /// Ceiling for the backed-off interval
    pub max_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Extra project fields compared by the change detector
    pub watch_fields: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            token: None,
            role: None,
            poll_interval_secs: 30,
            retry_delay_secs: 5,
            max_retries: 3,
            backoff_factor: 1.5,
            max_interval_secs: 120,
            request_timeout_secs: 10,
            watch_fields: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.server_url = config.server_url.trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue("poll_interval_secs must be positive"));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidValue("max_retries must be positive"));
        }
        if !(self.backoff_factor.is_finite() && self.backoff_factor >= 1.0) {
            return Err(ConfigError::InvalidValue("backoff_factor must be at least 1.0"));
        }
        if self.max_interval_secs < self.poll_interval_secs {
            return Err(ConfigError::InvalidValue(
                "max_interval_secs must not be below poll_interval_secs",
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_secs(self.max_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.config.endpoint_path = path.into();
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.config.role = Some(role.into());
        self
    }

    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.poll_interval_secs = secs;
        self
    }

    pub fn retry_delay_secs(mut self, secs: u64) -> Self {
        self.config.retry_delay_secs = secs;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn max_interval_secs(mut self, secs: u64) -> Self {
        self.config.max_interval_secs = secs;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn watch_field(mut self, field: impl Into<String>) -> Self {
        self.config.watch_fields.push(field.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
    #[error("cannot read config: {0}")]
    Io(String),
    #[error("cannot parse config: {0}")]
    Parse(String),
}
