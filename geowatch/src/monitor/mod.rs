//! Device monitoring: fix handling, exit alerts, and status reporting.
//!
//! [`GeofenceMonitor`] is the single owner of every device's state. It is a
//! plain synchronous type; the [`MonitorDaemon`] runs one on a tokio task
//! and serializes fix arrivals, geofence replacements, and report ticks
//! through one command channel.
//!
//! ```text
//! LocationSource ──Fix──────────────┐
//! GeofenceFeed ──ReplaceGeofences───┼──► MonitorDaemon ──► GeofenceMonitor ──Outbound──► SinkDispatcher
//! ReportingScheduler ──Tick─────────┘    (one task)        (device map)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use geowatch::monitor::{MonitorConfig, MonitorDaemon};
//!
//! let (daemon, handle) = MonitorDaemon::new(monitor, MonitorConfig::default());
//! let shutdown = CancellationToken::new();
//! tokio::spawn(daemon.run(shutdown.clone()));
//!
//! handle.record_fix("device-1", fix).await?;
//! handle.start_reporting("device-1");
//! ```

mod config;
mod daemon;
mod engine;
mod error;

pub use config::{MonitorConfig, DEFAULT_COMMAND_CHANNEL_CAPACITY, DEFAULT_REPORT_INTERVAL};
pub use daemon::{MonitorCommand, MonitorDaemon, MonitorHandle};
pub use engine::GeofenceMonitor;
pub use error::MonitorError;
