//! INI-backed configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;

use crate::logging::LoggingConfig;
use crate::monitor::{MonitorConfig, DEFAULT_COMMAND_CHANNEL_CAPACITY, DEFAULT_REPORT_INTERVAL};
use crate::sink::{DispatcherConfig, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BACKOFF};

use super::{ConfigError, ConfigKey};

/// Name of the config file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// `~/.config/geowatch` (or the platform equivalent).
///
/// Falls back to `./.geowatch` when the platform has no config directory.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("geowatch"))
        .unwrap_or_else(|| PathBuf::from(".geowatch"))
}

/// Full path of the default config file.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// `[monitor]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub report_interval_secs: u64,
    pub command_channel_capacity: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            report_interval_secs: DEFAULT_REPORT_INTERVAL.as_secs(),
            command_channel_capacity: DEFAULT_COMMAND_CHANNEL_CAPACITY,
        }
    }
}

/// `[sinks]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSettings {
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF.as_millis() as u64,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Directory for daily log files; console only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// Everything stored in `config.ini`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub monitor: MonitorSettings,
    pub sinks: SinkSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location, or defaults if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(config_file_path())
    }

    /// Load from `path`, or defaults if the file doesn't exist.
    ///
    /// Keys that are absent keep their defaults; unknown keys are ignored.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Save to the default location, creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(config_file_path())
    }

    /// Save to `path`, creating parent directories if needed.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_error)?;
            }
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini.write_to_file(path).map_err(write_error)
    }
}

impl From<&ConfigFile> for MonitorConfig {
    fn from(config: &ConfigFile) -> Self {
        MonitorConfig::default()
            .with_report_interval(Duration::from_secs(config.monitor.report_interval_secs))
            .with_command_channel_capacity(config.monitor.command_channel_capacity)
    }
}

impl From<&ConfigFile> for DispatcherConfig {
    fn from(config: &ConfigFile) -> Self {
        DispatcherConfig {
            retry_attempts: config.sinks.retry_attempts,
            retry_backoff: Duration::from_millis(config.sinks.retry_backoff_ms),
        }
    }
}

impl From<&ConfigFile> for LoggingConfig {
    fn from(config: &ConfigFile) -> Self {
        LoggingConfig {
            level: config.logging.level.clone(),
            directory: config.logging.directory.clone(),
            ..LoggingConfig::default()
        }
    }
}
