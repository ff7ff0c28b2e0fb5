//! Monitor telemetry for observability.
//!
//! Lock-free atomic counters updated by the monitor and the sink dispatcher,
//! read through point-in-time snapshots.
//!
//! # Architecture
//!
//! ```text
//! GeofenceMonitor ─┐
//!                  ├──► MonitorMetrics ─────► MetricsSnapshot ─────► logs / CLI summary
//! SinkDispatcher ──┘    (atomic counters)    (point-in-time copy)
//! ```
//!
//! # Example
//!
//! ```
//! use geowatch::telemetry::MonitorMetrics;
//!
//! let metrics = MonitorMetrics::new();
//! metrics.fix_recorded();
//! metrics.exit_detected();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.fixes_recorded, 1);
//! assert_eq!(snapshot.exits_detected, 1);
//! ```

mod metrics;
mod snapshot;

pub use metrics::MonitorMetrics;
pub use snapshot::MetricsSnapshot;
