//! Application settings loaded from TOML.
//!
//! Settings live in `<config dir>/media-gallery/config.toml`. A missing file
//! yields defaults; `MEDIA_GALLERY_CONFIG` points at an alternate file and
//! `MEDIA_GALLERY_SERVER_URL` overrides the server address.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default filename used to store the app configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";
const APP_DIR: &str = "media-gallery";

pub const ENV_CONFIG_PATH: &str = "MEDIA_GALLERY_CONFIG";
pub const ENV_SERVER_URL: &str = "MEDIA_GALLERY_SERVER_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No suitable config directory available")]
    NoConfigDir,
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    /// Records appended per render step
    pub batch_size: usize,
    /// Time the primary engine gets before the fallback engine takes over
    pub fallback_timeout_ms: u64,
    pub player_command: String,
    /// Distance in pixels from the end of the grid that counts as visible
    pub visibility_margin: f32,
    pub preferences_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            batch_size: 24,
            fallback_timeout_ms: 4000,
            player_command: "mpv".to_string(),
            visibility_margin: 400.0,
            preferences_path: None,
        }
    }
}

impl Config {
    /// Load from the environment-selected file or the default location
    pub fn load() -> Result<Self, ConfigError> {
        let path = match std::env::var_os(ENV_CONFIG_PATH) {
            Some(path) => PathBuf::from(path),
            None => config_path()?,
        };
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str::<Config>(&text)
            .map(Config::normalized)
            .map_err(|source| ConfigError::ParseToml {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_SERVER_URL).filter(|url| !url.trim().is_empty()) {
            self.server_url = url.trim().to_string();
        }
    }

    fn normalized(mut self) -> Self {
        self.batch_size = self.batch_size.max(1);
        if !self.visibility_margin.is_finite() || self.visibility_margin < 0.0 {
            self.visibility_margin = Config::default().visibility_margin;
        }
        self
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_millis(self.fallback_timeout_ms)
    }
}

/// Resolve `<config dir>/media-gallery/config.toml`
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join(APP_DIR).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.fallback_timeout(), Duration::from_millis(4000));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "server_url = \"http://nas:9000\"\nbatch_size = 0\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server_url, "http://nas:9000");
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.player_command, "mpv");
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "batch_size = \"many\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_server_url_override() {
        let mut config = Config::default();
        config.apply_overrides(|key| {
            (key == ENV_SERVER_URL).then(|| " http://override:1 ".to_string())
        });
        assert_eq!(config.server_url, "http://override:1");

        config.apply_overrides(|_| Some(String::new()));
        assert_eq!(config.server_url, "http://override:1");
    }
}
