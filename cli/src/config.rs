//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the valor client.
///
/// Can be loaded from a TOML file via [`AppConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default so
/// a partial file, or no file at all, is fine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the record gateway backend.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Base URL of the verification service.
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Device-id endpoint used to seed the fingerprint.
    #[serde(default = "default_udid_url")]
    pub udid_url: String,

    /// Path of the JSON file the fingerprint is cached in.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_service_url() -> String {
    valor_sheerid::client::DEFAULT_BASE_URL.to_string()
}

fn default_udid_url() -> String {
    valor_sheerid::fingerprint::DEFAULT_UDID_URL.to_string()
}

fn default_state_path() -> PathBuf {
    PathBuf::from("./valor_state.json")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            service_url: default_service_url(),
            udid_url: default_udid_url(),
            state_path: default_state_path(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.gateway_url, "http://127.0.0.1:8000");
        assert_eq!(cfg.log_format, "human");
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            gateway_url = "https://gateway.example.com"
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.gateway_url, "https://gateway.example.com");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.service_url, valor_sheerid::client::DEFAULT_BASE_URL);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(AppConfig::from_toml_str("gateway_url = [").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(AppConfig::from_toml_file(std::path::Path::new("/nonexistent/valor.toml")).is_err());
    }
}
