//! Application configuration.

use super::AppError;
use crate::config::ConfigFile;
use crate::monitor::MonitorConfig;
use crate::sink::DispatcherConfig;

/// Runtime settings for [`super::GeowatchApp`].
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    /// Monitor daemon and report timer settings.
    pub monitor: MonitorConfig,

    /// Sink retry settings.
    pub dispatcher: DispatcherConfig,
}

impl AppConfig {
    /// Build from the persisted config file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            monitor: MonitorConfig::from(config),
            dispatcher: DispatcherConfig::from(config),
        }
    }

    /// Load the persisted config file from its default location.
    pub fn load() -> Result<Self, AppError> {
        Ok(Self::from_config_file(&ConfigFile::load()?))
    }

    /// Replace the monitor settings.
    pub fn with_monitor(mut self, monitor: MonitorConfig) -> Self {
        self.monitor = monitor;
        self
    }

    /// Replace the dispatcher settings.
    pub fn with_dispatcher(mut self, dispatcher: DispatcherConfig) -> Self {
        self.dispatcher = dispatcher;
        self
    }
}
