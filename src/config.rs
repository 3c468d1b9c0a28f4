use std::{path::Path, path::PathBuf, time::Duration};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::RoadGuardError;
use crate::telemetry::poller::POLL_INTERVAL_MS;

const CONFIG_DIR_NAME: &str = "roadguard";
const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowPosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub window_position: WindowPosition,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval_ms: POLL_INTERVAL_MS,
            request_timeout_ms: POLL_INTERVAL_MS,
            window_position: WindowPosition::default(),
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the config from the user's config directory, None if it was never saved.
    pub fn from_local_file() -> Result<Option<Self>, RoadGuardError> {
        match Self::default_path() {
            Some(config_path) => Self::from_file(&config_path),
            None => Ok(None),
        }
    }

    pub fn from_file(config_path: &Path) -> Result<Option<Self>, RoadGuardError> {
        if !config_path.exists() {
            debug!("No config file at {:?}", config_path);
            return Ok(None);
        }
        let file = std::fs::File::open(config_path)
            .map_err(|e| RoadGuardError::ConfigIOError { source: e })?;
        serde_json::from_reader(file)
            .map(|config: Self| Some(config.with_valid_timings()))
            .map_err(|e| RoadGuardError::ConfigSerializeError { source: e })
    }

    /// Zero intervals can't drive a ticker or a request, they fall back to the defaults.
    pub fn with_valid_timings(mut self) -> Self {
        let defaults = Self::default();
        if self.poll_interval_ms == 0 {
            warn!(
                "poll_interval_ms must be positive, using {}ms",
                defaults.poll_interval_ms
            );
            self.poll_interval_ms = defaults.poll_interval_ms;
        }
        if self.request_timeout_ms == 0 {
            warn!(
                "request_timeout_ms must be positive, using {}ms",
                defaults.request_timeout_ms
            );
            self.request_timeout_ms = defaults.request_timeout_ms;
        }
        self
    }

    pub fn save(&self) -> Result<(), RoadGuardError> {
        let config_path = Self::default_path().ok_or(RoadGuardError::NoConfigDir)?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), RoadGuardError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RoadGuardError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| RoadGuardError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| RoadGuardError::ConfigSerializeError { source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);

        let config = AppConfig {
            server_url: "http://raspberrypi.local:8000".to_string(),
            poll_interval_ms: 1000,
            window_position: WindowPosition { x: 10., y: 20. },
            ..Default::default()
        };
        config.save_to(&config_path).unwrap();

        let loaded = AppConfig::from_file(&config_path).unwrap();
        assert_eq!(loaded, Some(config));
    }

    #[test]
    fn test_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = AppConfig::from_file(&temp_dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, r#"{"server_url": "http://10.0.0.2:5000"}"#).unwrap();

        let loaded = AppConfig::from_file(&config_path).unwrap().unwrap();
        assert_eq!(loaded.server_url, "http://10.0.0.2:5000");
        assert_eq!(loaded.poll_interval(), Duration::from_millis(2000));
        assert_eq!(loaded.request_timeout(), Duration::from_millis(2000));
    }

    #[test]
    fn test_zero_timings_use_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &config_path,
            r#"{"poll_interval_ms": 0, "request_timeout_ms": 0}"#,
        )
        .unwrap();

        let loaded = AppConfig::from_file(&config_path).unwrap().unwrap();
        assert_eq!(loaded.poll_interval(), Duration::from_millis(2000));
        assert_eq!(loaded.request_timeout(), Duration::from_millis(2000));
    }

    #[test]
    fn test_positive_timings_are_kept() {
        let config = AppConfig {
            poll_interval_ms: 500,
            request_timeout_ms: 250,
            ..Default::default()
        }
        .with_valid_timings();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.request_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "not json").unwrap();

        assert!(matches!(
            AppConfig::from_file(&config_path),
            Err(RoadGuardError::ConfigSerializeError { .. })
        ));
    }
}
