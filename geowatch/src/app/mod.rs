//! Application wiring and lifecycle.
//!
//! [`GeowatchApp`] assembles the geofence store, monitor daemon and sink
//! dispatcher, starts their tasks, and shuts them down in dependency order
//! so that no outbound write is lost.
//!
//! ```text
//! ┌──────────────────────────── GeowatchApp ────────────────────────────┐
//! │                                                                     │
//! │  MonitorHandle ──commands──► MonitorDaemon ──Outbound──► SinkDispatcher
//! │  (+ ReportingScheduler)      (GeofenceMonitor)           (StateSink, │
//! │                                     │                     AlertSink) │
//! │                                     ▼                                │
//! │                               GeofenceStore                          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use geowatch::app::{AppConfig, AppSinks, GeowatchApp};
//!
//! let app = GeowatchApp::start(AppConfig::default(), AppSinks::tracing(), clock)?;
//! app.handle().replace_geofences(geofences).await?;
//! app.handle().record_fix("device-1", fix).await?;
//!
//! let metrics = app.shutdown().await;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::{AppSinks, GeowatchApp};
pub use config::AppConfig;
pub use error::AppError;
