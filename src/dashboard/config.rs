use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};
use std::path::{Path, PathBuf};

/// Overrides `server_url`
pub const ENV_API_URL: &str = "DASHBOARD_API_URL";
pub const ENV_TOKEN: &str = "DASHBOARD_TOKEN";
pub const ENV_ROLE: &str = "DASHBOARD_ROLE";
/// Path of the TOML config file
pub const ENV_CONFIG: &str = "DASHBOARD_CONFIG";

/// Runtime configuration: a config file plus environment overrides.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
    path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            path: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        let app = builder.build()?;
        Ok(Self { app, path: None })
    }

    /// Load the config file named by `DASHBOARD_CONFIG`, or the default file
    /// if it exists, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var(ENV_CONFIG).ok().map(PathBuf::from);
        let path = explicit.or_else(|| default_config_path().filter(|p| p.exists()));

        let config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::new(),
        };
        config.with_env_overrides()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let app = AppConfig::load(path)?;
        tracing::info!("Loaded dashboard config from {}", path.display());
        Ok(Self {
            app,
            path: Some(path.to_path_buf()),
        })
    }

    /// Apply `DASHBOARD_API_URL`, `DASHBOARD_TOKEN` and `DASHBOARD_ROLE`
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            self.app.server_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            self.app.token = Some(token);
        }
        if let Ok(role) = std::env::var(ENV_ROLE) {
            self.app.role = Some(role);
        }
        self.app.validate()?;
        Ok(self)
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    /// File the configuration was read from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Set the session token
    pub fn set_token(&mut self, token: Option<String>) {
        self.app.token = token;
    }

    pub fn get_token(&self) -> Option<&str> {
        self.app.token.as_deref()
    }

    pub fn server_url(&self) -> &str {
        &self.app.server_url
    }

    /// Full URL of the dashboard endpoint
    pub fn api_url(&self) -> String {
        format!("{}{}", self.app.server_url, self.app.endpoint_path)
    }

    /// Ensure token and role are present before polling
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        if self.app.token.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingValue("token"));
        }
        if self.app.role.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingValue("role"));
        }
        Ok(())
    }
}

/// `<config dir>/powermason/dashboard.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("powermason").join("dashboard.toml"))
}
