//! Monitor configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Monitor configuration. Missing keys fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Evaluator tick period in seconds.
    pub check_interval_seconds: u64,
    pub prometheus: PrometheusSettings,
    pub database: DatabaseSettings,
    pub nats: NatsSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: 60,
            prometheus: PrometheusSettings::default(),
            database: DatabaseSettings::default(),
            nats: NatsSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Metrics endpoint bind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrometheusSettings {
    pub port: u16,
    pub url: String,
}

impl Default for PrometheusSettings {
    fn default() -> Self {
        Self {
            port: 9100,
            url: "/metrics".to_string(),
        }
    }
}

/// Store connection parameters. `GODFATHER_DB_CONN` overrides the whole DSN.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub passwd: String,
    pub database: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 5432,
            user: String::new(),
            passwd: String::new(),
            database: String::new(),
        }
    }
}

/// Bus connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NatsSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
}

impl Default for NatsSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 4222,
            user: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.check_interval_seconds, 60);
        assert_eq!(config.prometheus.port, 9100);
        assert_eq!(config.prometheus.url, "/metrics");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.nats.port, 4222);
    }

    #[test]
    fn test_parse_full() {
        let raw = r#"{
            "check_interval_seconds": 15,
            "prometheus": { "port": 9200, "url": "/stats" },
            "database": { "host": "db.local", "port": 5433, "user": "mon", "passwd": "pw", "database": "watch" },
            "nats": { "host": "bus.local", "port": 4223, "user": "mon" }
        }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.check_interval_seconds, 15);
        assert_eq!(config.prometheus.port, 9200);
        assert_eq!(config.database.host, "db.local");
        assert_eq!(config.database.port, 5433);
        assert_eq!(config.nats.host, "bus.local");
    }

    #[test]
    fn test_parse_partial_fills_defaults() {
        let raw = r#"{ "check_interval_seconds": 5, "nats": { "host": "bus.local" } }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.check_interval_seconds, 5);
        assert_eq!(config.nats.host, "bus.local");
        assert_eq!(config.nats.port, 4222);
        assert_eq!(config.prometheus.url, "/metrics");
    }

    #[test]
    fn test_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.check_interval_seconds, config.check_interval_seconds);
    }
}
