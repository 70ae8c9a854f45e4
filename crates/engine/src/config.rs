//! Engine configuration persisted as JSON.
//!
//! The file lives at `~/.config/openinfra/config.json` on most platforms and
//! can be relocated with `OPENINFRA_CONFIG_PATH`. A missing file yields the
//! defaults; an unreadable payload is logged and replaced by the defaults.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use dirs_next::config_dir;
use openinfra_util::expand_tilde;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ConfigError;

/// Environment variable allowing callers to override the configuration file path.
pub const CONFIG_PATH_ENV: &str = "OPENINFRA_CONFIG_PATH";

/// Environment variable overriding [`EngineConfig::request_timeout_secs`].
pub const REQUEST_TIMEOUT_ENV: &str = "OPENINFRA_REQUEST_TIMEOUT_SECS";

pub const CONFIG_FILE_NAME: &str = "config.json";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound for a whole request, connection included.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            user_agent: format!("openinfra/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from [`default_config_path`] and applies
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&default_config_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads the configuration stored at `path` without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<Self>(&data) {
                Ok(config) => Ok(config.with_positive_timeouts(path)),
                Err(error) => {
                    warn!(
                        path = %path.display(),
                        error = %error,
                        "Failed to parse engine configuration; using defaults"
                    );
                    Ok(Self::default())
                }
            },
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(ConfigError::Io(error)),
        }
    }

    /// Replaces zero timeouts, which would fail every request at once, with the defaults.
    fn with_positive_timeouts(mut self, path: &Path) -> Self {
        if self.request_timeout_secs == 0 {
            warn!(
                path = %path.display(),
                field = "request_timeout_secs",
                "Ignoring zero timeout in engine configuration"
            );
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        if self.connect_timeout_secs == 0 {
            warn!(
                path = %path.display(),
                field = "connect_timeout_secs",
                "Ignoring zero timeout in engine configuration"
            );
            self.connect_timeout_secs = DEFAULT_CONNECT_TIMEOUT_SECS;
        }
        self
    }

    /// Writes the configuration to [`default_config_path`].
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&default_config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    fn apply_env_overrides(&mut self) {
        let Ok(raw) = env::var(REQUEST_TIMEOUT_ENV) else {
            return;
        };
        match raw.trim().parse::<u64>() {
            Ok(seconds) if seconds > 0 => self.request_timeout_secs = seconds,
            _ => warn!(
                variable = REQUEST_TIMEOUT_ENV,
                value = %raw,
                "Ignoring invalid request timeout override"
            ),
        }
    }
}

/// Get the default path for the engine configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(path.trim());
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("openinfra")
        .join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let directory = tempfile::tempdir().expect("create temp dir");
        let config = EngineConfig::load_from(&directory.path().join("absent.json")).expect("load");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.user_agent.starts_with("openinfra/"));
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let directory = tempfile::tempdir().expect("create temp dir");
        let path = directory.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").expect("write file");
        assert_eq!(EngineConfig::load_from(&path).expect("load"), EngineConfig::default());
    }

    #[test]
    fn partial_files_keep_defaults_for_absent_fields() {
        let directory = tempfile::tempdir().expect("create temp dir");
        let path = directory.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"connect_timeout_secs": 3}"#).expect("write file");
        let config = EngineConfig::load_from(&path).expect("load");
        assert_eq!(config.connect_timeout_secs, 3);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn zero_timeouts_fall_back_to_defaults() {
        let directory = tempfile::tempdir().expect("create temp dir");
        let path = directory.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"request_timeout_secs": 0, "connect_timeout_secs": 0, "user_agent": "ops/1"}"#)
            .expect("write file");
        let config = EngineConfig::load_from(&path).expect("load");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.user_agent, "ops/1");
    }

    #[test]
    fn save_and_load_through_env_path() {
        let directory = tempfile::tempdir().expect("create temp dir");
        let path = directory.path().join("nested").join(CONFIG_FILE_NAME);
        let path_value = path.to_string_lossy().to_string();

        temp_env::with_vars(
            [
                (CONFIG_PATH_ENV, Some(path_value.as_str())),
                (REQUEST_TIMEOUT_ENV, None::<&str>),
            ],
            || {
                let config = EngineConfig {
                    request_timeout_secs: 5,
                    ..EngineConfig::default()
                };
                config.save().expect("save");
                assert_eq!(default_config_path(), path);
                assert_eq!(EngineConfig::load().expect("load"), config);
            },
        );
    }

    #[test]
    fn env_override_replaces_request_timeout() {
        let directory = tempfile::tempdir().expect("create temp dir");
        let path = directory.path().join(CONFIG_FILE_NAME);
        let path_value = path.to_string_lossy().to_string();

        temp_env::with_vars(
            [
                (CONFIG_PATH_ENV, Some(path_value.as_str())),
                (REQUEST_TIMEOUT_ENV, Some("7")),
            ],
            || assert_eq!(EngineConfig::load().expect("load").request_timeout_secs, 7),
        );

        temp_env::with_vars(
            [
                (CONFIG_PATH_ENV, Some(path_value.as_str())),
                (REQUEST_TIMEOUT_ENV, Some("soon")),
            ],
            || assert_eq!(EngineConfig::load().expect("load").request_timeout_secs, 30),
        );
    }
}
