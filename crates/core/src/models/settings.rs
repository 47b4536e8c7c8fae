use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoreError;

/// Alpha Vantage query endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Free tier allows ~5 requests per minute, so one call every 12 seconds.
pub const DEFAULT_PACING_INTERVAL_MS: u64 = 12_000;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Application-supplied configuration for the quote integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Alpha Vantage API key.
    pub api_key: String,

    /// Endpoint the quote client talks to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Delay between consecutive quote calls during a refresh.
    #[serde(default = "default_pacing_interval_ms")]
    pub pacing_interval_ms: u64,

    /// Upper bound on a single quote call.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_pacing_interval_ms() -> u64 {
    DEFAULT_PACING_INTERVAL_MS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: "demo".to_string(),
            base_url: default_base_url(),
            pacing_interval_ms: DEFAULT_PACING_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl Settings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Read settings from the environment, falling back to defaults.
    ///
    /// - `ALPHAVANTAGE_API_KEY`
    /// - `ALPHAVANTAGE_BASE_URL`
    /// - `STOCK_TRACKER_PACING_MS`
    /// - `STOCK_TRACKER_TIMEOUT_MS`
    pub fn from_env() -> Result<Self, CoreError> {
        let mut settings = Self::default();
        if let Ok(key) = std::env::var("ALPHAVANTAGE_API_KEY") {
            settings.api_key = key;
        }
        if let Ok(url) = std::env::var("ALPHAVANTAGE_BASE_URL") {
            settings.base_url = url;
        }
        if let Some(ms) = env_millis("STOCK_TRACKER_PACING_MS")? {
            settings.pacing_interval_ms = ms;
        }
        if let Some(ms) = env_millis("STOCK_TRACKER_TIMEOUT_MS")? {
            settings.request_timeout_ms = ms;
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_pacing_interval(mut self, interval: Duration) -> Self {
        self.pacing_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.pacing_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.api_key.trim().is_empty() {
            return Err(CoreError::InvalidSettings("API key must not be empty".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(CoreError::InvalidSettings("base URL must not be empty".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(CoreError::InvalidSettings(
                "request timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn env_millis(name: &str) -> Result<Option<u64>, CoreError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| CoreError::InvalidSettings(format!("{name}={raw:?}: {e}"))),
        Err(_) => Ok(None),
    }
}
