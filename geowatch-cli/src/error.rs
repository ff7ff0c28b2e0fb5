//! CLI error types.

use std::fmt;
use std::path::PathBuf;

use geowatch::app::AppError;
use geowatch::config::ConfigError;
use geowatch::feed::FeedError;
use geowatch::logging::LoggingError;
use geowatch::monitor::MonitorError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Bad or unusable configuration.
    Config(String),

    /// Geofence feed could not be loaded.
    Feed(FeedError),

    /// Input file could not be read.
    Input { path: PathBuf, source: std::io::Error },

    /// Application failed to start.
    App(AppError),

    /// Monitor stopped while commands were still being sent.
    Monitor(MonitorError),

    /// Logging could not be initialized.
    Logging(LoggingError),

    /// Failed to create the Tokio runtime.
    Runtime(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Feed(e) => write!(f, "{}", e),
            CliError::Input { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            CliError::App(e) => write!(f, "{}", e),
            CliError::Monitor(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Runtime(msg) => write!(f, "Failed to create Tokio runtime: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Feed(e) => Some(e),
            CliError::Input { source, .. } => Some(source),
            CliError::App(e) => Some(e),
            CliError::Monitor(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Config(_) | CliError::Runtime(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<FeedError> for CliError {
    fn from(e: FeedError) -> Self {
        CliError::Feed(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<MonitorError> for CliError {
    fn from(e: MonitorError) -> Self {
        CliError::Monitor(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}
