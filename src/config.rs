//! Client configuration.
//!
//! Values come from environment variables, optionally overridden by a JSON
//! file:
//! - `TASKS_API_URL` - base URL of the Task Backend API (default `http://localhost:8000`)
//! - `TASKS_REQUEST_TIMEOUT_SECS` - per-request timeout in seconds (default 30)

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid API URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid request timeout {0:?}: expected a positive number of seconds")]
    InvalidTimeout(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the Task Backend API, without a trailing slash.
    pub api_url: String,
    /// Timeout applied to every backend request.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// On-disk shape; every key is optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("TASKS_API_URL") {
            config.api_url = url;
        }

        if let Some(raw) = lookup("TASKS_REQUEST_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout(raw.clone()))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validated()
    }

    /// Load configuration from a JSON file, layered over `self`.
    pub fn merge_file(mut self, path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let file: ConfigFile = serde_json::from_str(&contents)?;

        if let Some(url) = file.api_url {
            self.api_url = url;
        }
        match file.request_timeout_secs {
            Some(0) => return Err(ConfigError::InvalidTimeout("0".to_string())),
            Some(secs) => self.request_timeout = Duration::from_secs(secs),
            None => {}
        }

        tracing::debug!("Loaded config from {}", path.display());
        self.validated()
    }

    /// Load configuration from a JSON file, using defaults for missing keys.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::default().merge_file(path)
    }

    /// Override the API URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Result<Self, ConfigError> {
        self.api_url = url.into();
        self.validated()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        let parsed = url::Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: self.api_url.clone(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        self.api_url = self.api_url.trim_end_matches('/').to_string();
        Ok(self)
    }
}
