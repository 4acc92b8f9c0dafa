//! Server configuration loaded from a TOML file.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use wxmon_common::types::UnitSystem;

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the HTTP server binds to.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Origins allowed by the CORS layer. Empty means allow any origin.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL.
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Directory the database file lives in. Created on startup if missing.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between background alert sweeps.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Seconds a rule stays silenced after it fires.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Locale for notification messages.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Unit system used when fetching and rendering weather values.
    #[serde(default)]
    pub units: UnitSystem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// API key for the upstream weather provider. The
    /// `WXMON_WEATHER_API_KEY` environment variable takes precedence.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the provider API.
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Per-request timeout for provider calls.
    #[serde(default = "default_weather_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_http_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "sqlite://data/wxmon.db?mode=rwc".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_check_interval_secs() -> u64 {
    300
}

fn default_cooldown_secs() -> u64 {
    1800
}

fn default_locale() -> String {
    "vi".to_string()
}

fn default_weather_base_url() -> String {
    wxmon_weather::weatherapi::DEFAULT_BASE_URL.to_string()
}

fn default_weather_timeout_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            cors_allowed_origins: Vec::new(),
            database: DatabaseConfig::default(),
            monitor: MonitorConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            cooldown_secs: default_cooldown_secs(),
            locale: default_locale(),
            units: UnitSystem::default(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_weather_base_url(),
            timeout_secs: default_weather_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist. The weather API key can always be supplied via
    /// the `WXMON_WEATHER_API_KEY` environment variable.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut config = if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file: {path}"))?;
            toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file: {path}"))?
        } else {
            tracing::info!(path, "Config file not found, using defaults");
            Self::default()
        };

        if let Ok(key) = std::env::var("WXMON_WEATHER_API_KEY") {
            if !key.is_empty() {
                config.weather.api_key = key;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.monitor.check_interval_secs, 300);
        assert_eq!(config.monitor.cooldown_secs, 1800);
        assert_eq!(config.monitor.locale, "vi");
        assert_eq!(config.monitor.units, UnitSystem::Metric);
        assert_eq!(config.database.data_dir, "data");
    }

    #[test]
    fn partial_file_overrides_selected_keys() {
        let raw = r#"
            http_port = 9090

            [monitor]
            check_interval_secs = 60
            locale = "en"

            [weather]
            api_key = "k"
        "#;
        let config: ServerConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.monitor.check_interval_secs, 60);
        assert_eq!(config.monitor.locale, "en");
        assert_eq!(config.monitor.cooldown_secs, 1800);
        assert_eq!(config.weather.api_key, "k");
        assert_eq!(
            config.weather.base_url,
            wxmon_weather::weatherapi::DEFAULT_BASE_URL
        );
    }
}
