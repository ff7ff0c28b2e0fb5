//! Runtime configuration for the monitor daemon.

use std::time::Duration;

/// Default period between status reports when no new fix arrives.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(120);

/// Default capacity of the daemon's command channel.
pub const DEFAULT_COMMAND_CHANNEL_CAPACITY: usize = 256;

/// Configuration for [`super::MonitorDaemon`].
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Period of the per-device status report timer.
    pub report_interval: Duration,

    /// Command channel capacity.
    pub command_channel_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            report_interval: DEFAULT_REPORT_INTERVAL,
            command_channel_capacity: DEFAULT_COMMAND_CHANNEL_CAPACITY,
        }
    }
}

impl MonitorConfig {
    /// Set the report interval.
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Set the command channel capacity (at least 1).
    pub fn with_command_channel_capacity(mut self, capacity: usize) -> Self {
        self.command_channel_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.report_interval, Duration::from_secs(120));
        assert_eq!(config.command_channel_capacity, 256);
    }

    #[test]
    fn test_capacity_never_zero() {
        let config = MonitorConfig::default().with_command_channel_capacity(0);
        assert_eq!(config.command_channel_capacity, 1);
    }
}
