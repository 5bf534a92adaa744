//! Configuration and persistent settings
//!
//! Settings load from a TOML file with environment-variable overrides and
//! can be written back, standing in for the platform preference store the
//! client keeps its endpoint and batch size in.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default collection endpoint
pub const DEFAULT_SERVER_URL: &str = "wss://unstable.kusaremkn.com/yure";

/// Persistent client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Collection endpoint URL
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Samples per batch; reaching this many buffered samples triggers a flush
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Sensor sampling-rate hint in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: u32,
}

// Default value functions
fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}
fn default_buffer_size() -> usize {
    30
}
fn default_sample_rate() -> u32 {
    50
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            buffer_size: default_buffer_size(),
            sample_rate_hz: default_sample_rate(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings with environment overrides (`YURE_SERVER_URL`,
    /// `YURE_BUFFER_SIZE`), falling back to defaults when the file is absent
    pub fn from_file_with_env(path: &Path) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut settings = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        if let Ok(url) = std::env::var("YURE_SERVER_URL") {
            settings.server_url = url;
        }
        if let Ok(size) = std::env::var("YURE_BUFFER_SIZE") {
            settings.buffer_size = size.parse()?;
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Write the settings back to disk
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.buffer_size >= 1,
            "buffer_size must be a positive integer"
        );
        anyhow::ensure!(
            self.sample_rate_hz >= 1,
            "sample_rate_hz must be a positive integer"
        );
        anyhow::ensure!(
            self.server_url.starts_with("ws://") || self.server_url.starts_with("wss://"),
            "server_url must be a ws:// or wss:// URL"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
        assert_eq!(settings.buffer_size, 30);
        assert_eq!(settings.sample_rate_hz, 50);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let settings: Settings = toml::from_str("server_url = \"wss://example.com/yure\"").unwrap();
        assert_eq!(settings.server_url, "wss://example.com/yure");
        assert_eq!(settings.buffer_size, 30);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yure.toml");

        let mut settings = Settings::default();
        settings.buffer_size = 60;
        settings.save(&path).unwrap();

        let reloaded = Settings::from_file(&path).unwrap();
        assert_eq!(reloaded.buffer_size, 60);
        assert_eq!(reloaded.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_rejects_zero_buffer_size() {
        let mut settings = Settings::default();
        settings.buffer_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_non_websocket_url() {
        let mut settings = Settings::default();
        settings.server_url = "https://example.com/yure".to_string();
        assert!(settings.validate().is_err());
    }
}
