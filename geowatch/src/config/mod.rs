//! Persistent configuration.
//!
//! Settings live in an INI file at `~/.config/geowatch/config.ini` (or the
//! platform equivalent). Missing files and missing keys fall back to
//! defaults, so a fresh install runs without any setup.
//!
//! ```ini
//! [monitor]
//! report_interval_secs = 120
//! command_channel_capacity = 256
//!
//! [sinks]
//! retry_attempts = 1
//! retry_backoff_ms = 500
//!
//! [logging]
//! level = info
//! directory =
//! ```

mod error;
mod file;
mod keys;

pub use error::ConfigError;
pub use file::{
    config_directory, config_file_path, ConfigFile, LoggingSettings, MonitorSettings,
    SinkSettings, CONFIG_FILE_NAME,
};
pub use keys::ConfigKey;
