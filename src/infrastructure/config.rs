//! Configuration infrastructure
//!
//! Settings are layered: serde defaults, then an optional config file, then
//! `PRODUCT_SCRAPER_*` environment variables (`__` separates sections, e.g.
//! `PRODUCT_SCRAPER_SCRAPER__MAX_RETRIES=5`).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::SiteKind;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Default configuration values
pub mod defaults {
    /// Retries after the first attempt
    pub const MAX_RETRIES: u32 = 3;

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Unit every backoff formula is multiplied by
    pub const BACKOFF_UNIT_MS: u64 = 1000;

    pub const MAX_REDIRECTS: usize = 10;

    pub const DESCRIPTION_MAX_CHARS: usize = 500;

    pub const MAX_CONCURRENCY: usize = 4;

    /// Pause a batch worker takes after each item
    pub const ITEM_DELAY_MS: u64 = 1000;

    pub const PROXY_REFRESH_INTERVAL_SECONDS: u64 = 600;

    pub const PROXY_REQUEST_TIMEOUT_SECONDS: u64 = 5;

    pub const DB_MAX_CONNECTIONS: u32 = 5;

    pub const LOG_LEVEL: &str = "info";

    pub const APP_DIR_NAME: &str = "product-scraper";

    pub const DB_FILE_NAME: &str = "products.db";

    /// Environment variable prefix
    pub const ENV_PREFIX: &str = "PRODUCT_SCRAPER";
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub batch: BatchConfig,
    pub proxy: ProxyConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Fetching and extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub max_retries: u32,
    pub request_timeout_seconds: u64,
    pub backoff_unit_ms: u64,
    pub max_redirects: usize,
    /// Disables TLS certificate verification. A deliberate reliability over
    /// security trade-off; leave off unless every target is trusted.
    pub accept_invalid_certs: bool,
    pub description_max_chars: usize,
    /// Per-site minimum delay between requests to one host, in milliseconds
    pub site_delay_overrides_ms: HashMap<SiteKind, u64>,
    /// Replaces the built-in user agent pool when non-empty
    pub user_agents: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::MAX_RETRIES,
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            backoff_unit_ms: defaults::BACKOFF_UNIT_MS,
            max_redirects: defaults::MAX_REDIRECTS,
            accept_invalid_certs: false,
            description_max_chars: defaults::DESCRIPTION_MAX_CHARS,
            site_delay_overrides_ms: HashMap::new(),
            user_agents: Vec::new(),
        }
    }
}

impl ScraperConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }
}

/// Batch runner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_concurrency: usize,
    pub item_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: defaults::MAX_CONCURRENCY,
            item_delay_ms: defaults::ITEM_DELAY_MS,
        }
    }
}

impl BatchConfig {
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }
}

/// Proxy service settings; no `service_url` means fetching without proxies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub service_url: Option<String>,
    pub refresh_interval_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            service_url: None,
            refresh_interval_seconds: defaults::PROXY_REFRESH_INTERVAL_SECONDS,
            request_timeout_seconds: defaults::PROXY_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: defaults::DB_MAX_CONNECTIONS,
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files, `./logs` when unset
    pub log_dir: Option<PathBuf>,

    /// Module-specific log level filters (e.g., "sqlx": "warn", "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            module_filters: HashMap::new(),
        }
    }
}

/// Default SQLite location under the platform data directory
pub fn default_database_url() -> String {
    let path = dirs::data_local_dir()
        .map(|dir| dir.join(defaults::APP_DIR_NAME).join(defaults::DB_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from("data").join(defaults::DB_FILE_NAME));
    format!("sqlite://{}", path.display())
}

impl AppConfig {
    /// Load defaults, then `path` if it exists, then the environment
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        info!("Loaded configuration (file: {})", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scraper.request_timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                message: "scraper.request_timeout_seconds must be greater than 0".to_string(),
            });
        }

        if self.scraper.description_max_chars == 0 {
            return Err(ConfigError::Validation {
                message: "scraper.description_max_chars must be greater than 0".to_string(),
            });
        }

        if self.batch.max_concurrency == 0 {
            return Err(ConfigError::Validation {
                message: "batch.max_concurrency must be greater than 0".to_string(),
            });
        }

        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "database.url must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scraper.max_retries, 3);
        assert_eq!(config.scraper.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.scraper.description_max_chars, 500);
        assert!(!config.scraper.accept_invalid_certs);
        assert!(config.proxy.service_url.is_none());
        assert!(config.database.url.starts_with("sqlite://"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load("/nonexistent/product-scraper-config").unwrap();
        assert_eq!(config.batch.max_concurrency, defaults::MAX_CONCURRENCY);
    }

    #[test]
    fn test_file_overrides_selected_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[scraper]
max_retries = 5
backoff_unit_ms = 10

[scraper.site_delay_overrides_ms]
amazon = 4500

[proxy]
service_url = "http://localhost:8080"

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.scraper.max_retries, 5);
        assert_eq!(config.scraper.backoff_unit(), Duration::from_millis(10));
        assert_eq!(config.scraper.site_delay_overrides_ms.get(&SiteKind::Amazon), Some(&4500));
        assert_eq!(config.scraper.request_timeout_seconds, 30);
        assert_eq!(config.proxy.service_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = AppConfig::default();
        config.batch.max_concurrency = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));

        let mut config = AppConfig::default();
        config.scraper.request_timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database.url = " ".to_string();
        assert!(config.validate().is_err());
    }
}
