use crate::auth::AccessToken;
use crate::error::{DatastoryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ANALYSIS_API_URL: &str = "http://localhost:3000/v1";
pub const DEFAULT_DASHBOARD_URL: &str = "https://dashboard.dynamo.mint.edu";
pub const DEFAULT_CATALOG_URL: &str = "http://localhost:5000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 120;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for Datastory
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub analysis_api_url: ConfigValue<String>,
    pub dashboard_url: ConfigValue<String>,
    pub catalog_url: ConfigValue<String>,
    pub poll_interval_ms: ConfigValue<u64>,
    pub poll_max_attempts: ConfigValue<u32>,
    pub access_token: ConfigValue<Option<AccessToken>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            analysis_api_url: ConfigValue::new(
                DEFAULT_ANALYSIS_API_URL.to_string(),
                ConfigSource::Default,
            ),
            dashboard_url: ConfigValue::new(DEFAULT_DASHBOARD_URL.to_string(), ConfigSource::Default),
            catalog_url: ConfigValue::new(DEFAULT_CATALOG_URL.to_string(), ConfigSource::Default),
            poll_interval_ms: ConfigValue::new(DEFAULT_POLL_INTERVAL_MS, ConfigSource::Default),
            poll_max_attempts: ConfigValue::new(DEFAULT_POLL_MAX_ATTEMPTS, ConfigSource::Default),
            access_token: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| DatastoryError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(url) = file_config.analysis_api_url {
            self.analysis_api_url.update(url, ConfigSource::File);
        }

        if let Some(url) = file_config.dashboard_url {
            self.dashboard_url.update(url, ConfigSource::File);
        }

        if let Some(url) = file_config.catalog_url {
            self.catalog_url.update(url, ConfigSource::File);
        }

        if let Some(interval) = file_config.poll_interval_ms {
            self.poll_interval_ms.update(interval, ConfigSource::File);
        }

        if let Some(max_attempts) = file_config.poll_max_attempts {
            self.poll_max_attempts.update(max_attempts, ConfigSource::File);
        }

        if let Some(token) = file_config.access_token.as_deref().and_then(AccessToken::parse) {
            self.access_token.update(Some(token), ConfigSource::File);
        }

        Ok(self)
    }

    /// Load the file only if it exists
    pub fn load_from_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        if path.as_ref().exists() {
            self.load_from_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // DATASTORY_ANALYSIS_API_URL
        if let Ok(url) = env::var("DATASTORY_ANALYSIS_API_URL") {
            self.analysis_api_url.update(url, ConfigSource::Environment);
        }

        // DATASTORY_DASHBOARD_URL
        if let Ok(url) = env::var("DATASTORY_DASHBOARD_URL") {
            self.dashboard_url.update(url, ConfigSource::Environment);
        }

        // DATASTORY_CATALOG_URL
        if let Ok(url) = env::var("DATASTORY_CATALOG_URL") {
            self.catalog_url.update(url, ConfigSource::Environment);
        }

        // DATASTORY_POLL_INTERVAL_MS
        if let Ok(interval_str) = env::var("DATASTORY_POLL_INTERVAL_MS") {
            match interval_str.parse::<u64>() {
                Ok(interval) => self.poll_interval_ms.update(interval, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid DATASTORY_POLL_INTERVAL_MS value '{}': expected milliseconds",
                    interval_str
                ),
            }
        }

        // DATASTORY_POLL_MAX_ATTEMPTS
        if let Ok(attempts_str) = env::var("DATASTORY_POLL_MAX_ATTEMPTS") {
            match attempts_str.parse::<u32>() {
                Ok(attempts) => self.poll_max_attempts.update(attempts, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid DATASTORY_POLL_MAX_ATTEMPTS value '{}': expected integer",
                    attempts_str
                ),
            }
        }

        // DATASTORY_ACCESS_TOKEN
        if let Some(token) =
            env::var("DATASTORY_ACCESS_TOKEN").ok().as_deref().and_then(AccessToken::parse)
        {
            self.access_token.update(Some(token), ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(url) = overrides.analysis_api_url {
            self.analysis_api_url.update(url, ConfigSource::Cli);
        }

        if let Some(url) = overrides.dashboard_url {
            self.dashboard_url.update(url, ConfigSource::Cli);
        }

        if let Some(url) = overrides.catalog_url {
            self.catalog_url.update(url, ConfigSource::Cli);
        }

        if let Some(interval) = overrides.poll_interval_ms {
            self.poll_interval_ms.update(interval, ConfigSource::Cli);
        }

        if let Some(max_attempts) = overrides.poll_max_attempts {
            self.poll_max_attempts.update(max_attempts, ConfigSource::Cli);
        }

        if let Some(token) = overrides.access_token.as_deref().and_then(AccessToken::parse) {
            self.access_token.update(Some(token), ConfigSource::Cli);
        }
    }

    /// Reject values that would make the clients or the poller misbehave
    pub fn validate(&self) -> Result<()> {
        for (key, url) in [
            ("analysis_api_url", &self.analysis_api_url.value),
            ("dashboard_url", &self.dashboard_url.value),
            ("catalog_url", &self.catalog_url.value),
        ] {
            if url.trim().is_empty() {
                return Err(DatastoryError::ConfigMissing { key: key.to_string() });
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(DatastoryError::ConfigInvalid {
                    key: key.to_string(),
                    reason: format!("'{}' is not an http(s) URL", url),
                });
            }
        }

        if self.poll_interval_ms.value == 0 {
            return Err(DatastoryError::ConfigInvalid {
                key: "poll_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.poll_max_attempts.value == 0 {
            return Err(DatastoryError::ConfigInvalid {
                key: "poll_max_attempts".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.value)
    }

    /// Interval and attempt cap applied to newly armed pollers
    pub fn polling_defaults(&self) -> (Duration, u32) {
        (self.poll_interval(), self.poll_max_attempts.value)
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.value.as_ref()
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "analysis_api_url".to_string(),
            (self.analysis_api_url.value.clone(), self.analysis_api_url.source),
        );

        map.insert(
            "dashboard_url".to_string(),
            (self.dashboard_url.value.clone(), self.dashboard_url.source),
        );

        map.insert(
            "catalog_url".to_string(),
            (self.catalog_url.value.clone(), self.catalog_url.source),
        );

        map.insert(
            "poll_interval_ms".to_string(),
            (format!("{}ms", self.poll_interval_ms.value), self.poll_interval_ms.source),
        );

        map.insert(
            "poll_max_attempts".to_string(),
            (self.poll_max_attempts.value.to_string(), self.poll_max_attempts.source),
        );

        map.insert(
            "access_token".to_string(),
            (
                self.access_token
                    .value
                    .as_ref()
                    .map(AccessToken::masked)
                    .unwrap_or_else(|| "(not set)".to_string()),
                self.access_token.source,
            ),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    analysis_api_url: Option<String>,
    dashboard_url: Option<String>,
    catalog_url: Option<String>,
    poll_interval_ms: Option<u64>,
    poll_max_attempts: Option<u32>,
    access_token: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub analysis_api_url: Option<String>,
    pub dashboard_url: Option<String>,
    pub catalog_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub poll_max_attempts: Option<u32>,
    pub access_token: Option<String>,
}
