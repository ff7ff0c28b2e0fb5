//! Point-in-time copy of monitor counters.

use std::fmt;

/// Counter values at the moment [`super::MonitorMetrics::snapshot`] was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub fixes_recorded: u64,
    pub evaluations: u64,
    pub exits_detected: u64,
    pub status_reports: u64,
    pub ticks_skipped: u64,
    pub geofence_replacements: u64,
    pub sink_deliveries: u64,
    pub sink_failures: u64,
    pub sink_retries: u64,
}

impl MetricsSnapshot {
    /// Fraction of sink writes that were eventually delivered.
    ///
    /// Returns 1.0 when nothing has been written yet.
    pub fn delivery_ratio(&self) -> f64 {
        let total = self.sink_deliveries + self.sink_failures;
        if total == 0 {
            1.0
        } else {
            self.sink_deliveries as f64 / total as f64
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fixes={} evaluations={} exits={} reports={} skipped_ticks={} \
             geofence_updates={} delivered={} failed={} retries={}",
            self.fixes_recorded,
            self.evaluations,
            self.exits_detected,
            self.status_reports,
            self.ticks_skipped,
            self.geofence_replacements,
            self.sink_deliveries,
            self.sink_failures,
            self.sink_retries
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_ratio() {
        let mut snapshot = MetricsSnapshot::default();
        assert_eq!(snapshot.delivery_ratio(), 1.0);

        snapshot.sink_deliveries = 3;
        snapshot.sink_failures = 1;
        assert!((snapshot.delivery_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_lists_counters() {
        let snapshot = MetricsSnapshot {
            exits_detected: 2,
            ..Default::default()
        };
        let text = snapshot.to_string();
        assert!(text.contains("exits=2"));
        assert!(text.contains("failed=0"));
    }
}
