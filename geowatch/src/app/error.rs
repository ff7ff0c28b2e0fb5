//! Application error types.

use std::fmt;

use crate::config::ConfigError;
use crate::feed::FeedError;
use crate::monitor::MonitorError;

/// Errors that can occur during application startup.
#[derive(Debug)]
pub enum AppError {
    /// Started outside a Tokio runtime.
    NoRuntime,

    /// Failed to load configuration.
    Config(ConfigError),

    /// Failed to load the initial geofence set.
    Feed(FeedError),

    /// The monitor daemon is not accepting commands.
    Monitor(MonitorError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NoRuntime => {
                write!(f, "GeowatchApp must be started from within a Tokio runtime")
            }
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Feed(e) => write!(f, "Failed to load geofences: {}", e),
            AppError::Monitor(e) => write!(f, "Monitor error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::NoRuntime => None,
            AppError::Config(e) => Some(e),
            AppError::Feed(e) => Some(e),
            AppError::Monitor(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<FeedError> for AppError {
    fn from(e: FeedError) -> Self {
        AppError::Feed(e)
    }
}

impl From<MonitorError> for AppError {
    fn from(e: MonitorError) -> Self {
        AppError::Monitor(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config(ConfigError::UnknownKey("monitor.nope".to_string()));
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("monitor.nope"));
    }

    #[test]
    fn test_app_error_from_feed_error() {
        let feed_err = FeedError::Shape("number");
        let app_err: AppError = feed_err.into();
        assert!(matches!(app_err, AppError::Feed(_)));
        assert!(std::error::Error::source(&app_err).is_some());
    }
}
