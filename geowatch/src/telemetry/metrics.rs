//! Atomic counters shared between the monitor and the dispatcher.

use std::sync::atomic::{AtomicU64, Ordering};

use super::MetricsSnapshot;

/// Counters for monitor and sink activity.
///
/// All updates use `Relaxed` ordering: counters are independent and only
/// read for reporting.
#[derive(Debug, Default)]
pub struct MonitorMetrics {
    fixes_recorded: AtomicU64,
    evaluations: AtomicU64,
    exits_detected: AtomicU64,
    status_reports: AtomicU64,
    ticks_skipped: AtomicU64,
    geofence_replacements: AtomicU64,
    sink_deliveries: AtomicU64,
    sink_failures: AtomicU64,
    sink_retries: AtomicU64,
}

impl MonitorMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fix_recorded(&self) {
        self.fixes_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn evaluation(&self) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn exit_detected(&self) {
        self.exits_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn status_reported(&self) {
        self.status_reports.fetch_add(1, Ordering::Relaxed);
    }

    /// A periodic tick found no fix to report.
    pub fn tick_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn geofences_replaced(&self) {
        self.geofence_replacements.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sink_delivered(&self) {
        self.sink_deliveries.fetch_add(1, Ordering::Relaxed);
    }

    /// A write was given up on after exhausting its attempts.
    pub fn sink_failed(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sink_retried(&self) {
        self.sink_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fixes_recorded: self.fixes_recorded.load(Ordering::Relaxed),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            exits_detected: self.exits_detected.load(Ordering::Relaxed),
            status_reports: self.status_reports.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            geofence_replacements: self.geofence_replacements.load(Ordering::Relaxed),
            sink_deliveries: self.sink_deliveries.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            sink_retries: self.sink_retries.load(Ordering::Relaxed),
        }
    }
}
