//! Configuration management for the herald dispatcher
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Scheduler configuration
    pub scheduler: SchedulerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Delivery endpoint configuration
    pub sender: SenderConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Scheduler-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between dispatch cycles
    pub tick_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

/// Delivery endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Webhook endpoint URL
    pub endpoint: String,

    /// Bearer token for the endpoint (optional)
    pub auth_token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let tick_secs = std::env::var("HERALD_TICK_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let sqlite_path = std::env::var("HERALD_SQLITE_PATH")
            .unwrap_or_else(|_| String::from("data/herald.db"))
            .into();

        let endpoint = std::env::var("HERALD_ENDPOINT")
            .unwrap_or_else(|_| String::from("http://localhost:8080/broadcast"));

        let auth_token = std::env::var("HERALD_AUTH_TOKEN").ok();

        let timeout_secs = std::env::var("HERALD_SENDER_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(10);

        let log_level = std::env::var("HERALD_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let log_format =
            std::env::var("HERALD_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            scheduler: SchedulerConfig { tick_secs },
            database: DatabaseConfig { sqlite_path },
            sender: SenderConfig {
                endpoint,
                auth_token,
                timeout_secs,
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.tick_secs == 0 {
            anyhow::bail!("tick_secs must be greater than 0");
        }

        if self.sender.endpoint.is_empty() {
            anyhow::bail!("sender endpoint must not be empty");
        }

        if self.sender.timeout_secs == 0 {
            anyhow::bail!("sender timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Get the sender timeout as Duration
    #[must_use]
    pub fn sender_timeout(&self) -> Duration {
        Duration::from_secs(self.sender.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig { tick_secs: 60 },
            database: DatabaseConfig {
                sqlite_path: PathBuf::from("data/herald.db"),
            },
            sender: SenderConfig {
                endpoint: String::from("http://localhost:8080/broadcast"),
                auth_token: None,
                timeout_secs: 10,
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_tick_is_invalid() {
        let mut config = Config::default();
        config.scheduler.tick_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_endpoint_is_invalid() {
        let mut config = Config::default();
        config.sender.endpoint = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sender_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.sender_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_toml() {
        let raw = r#"
            [scheduler]
            tick_secs = 30

            [database]
            sqlite_path = "tmp/test.db"

            [sender]
            endpoint = "https://hooks.example.com/send"
            timeout_secs = 5

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.scheduler.tick_secs, 30);
        assert_eq!(config.sender.endpoint, "https://hooks.example.com/send");
        assert_eq!(config.sender.auth_token, None);
        assert!(config.validate().is_ok());
    }
}
