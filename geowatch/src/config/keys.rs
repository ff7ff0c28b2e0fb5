//! Addressable configuration keys for `config get/set/list`.

use std::path::PathBuf;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use super::{ConfigError, ConfigFile};

/// A `section.key` setting in [`ConfigFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    MonitorReportIntervalSecs,
    MonitorCommandChannelCapacity,
    SinksRetryAttempts,
    SinksRetryBackoffMs,
    LoggingLevel,
    LoggingDirectory,
}

impl ConfigKey {
    /// Every key, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::MonitorReportIntervalSecs,
            ConfigKey::MonitorCommandChannelCapacity,
            ConfigKey::SinksRetryAttempts,
            ConfigKey::SinksRetryBackoffMs,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingDirectory,
        ]
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::MonitorReportIntervalSecs | ConfigKey::MonitorCommandChannelCapacity => {
                "monitor"
            }
            ConfigKey::SinksRetryAttempts | ConfigKey::SinksRetryBackoffMs => "sinks",
            ConfigKey::LoggingLevel | ConfigKey::LoggingDirectory => "logging",
        }
    }

    /// Key within the section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::MonitorReportIntervalSecs => "report_interval_secs",
            ConfigKey::MonitorCommandChannelCapacity => "command_channel_capacity",
            ConfigKey::SinksRetryAttempts => "retry_attempts",
            ConfigKey::SinksRetryBackoffMs => "retry_backoff_ms",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as a string (empty when unset).
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::MonitorReportIntervalSecs => config.monitor.report_interval_secs.to_string(),
            ConfigKey::MonitorCommandChannelCapacity => {
                config.monitor.command_channel_capacity.to_string()
            }
            ConfigKey::SinksRetryAttempts => config.sinks.retry_attempts.to_string(),
            ConfigKey::SinksRetryBackoffMs => config.sinks.retry_backoff_ms.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Validate and store `value`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::MonitorReportIntervalSecs => {
                config.monitor.report_interval_secs = self.parse_positive(value)?;
            }
            ConfigKey::MonitorCommandChannelCapacity => {
                config.monitor.command_channel_capacity = self.parse_positive(value)? as usize;
            }
            ConfigKey::SinksRetryAttempts => {
                config.sinks.retry_attempts = value
                    .parse()
                    .map_err(|_| self.invalid(value, "expected a non-negative integer"))?;
            }
            ConfigKey::SinksRetryBackoffMs => {
                config.sinks.retry_backoff_ms = value
                    .parse()
                    .map_err(|_| self.invalid(value, "expected milliseconds"))?;
            }
            ConfigKey::LoggingLevel => {
                EnvFilter::try_new(value).map_err(|e| self.invalid(value, &e.to_string()))?;
                config.logging.level = value.to_string();
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = (!value.is_empty()).then(|| PathBuf::from(value));
            }
        }
        Ok(())
    }

    fn parse_positive(&self, value: &str) -> Result<u64, ConfigError> {
        match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(self.invalid(value, "expected a positive integer")),
        }
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
