//! Application bootstrap and shutdown.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::AppConfig;
use super::error::AppError;
use crate::clock::{Clock, SystemClock};
use crate::feed::load_geofences_file;
use crate::geofence::GeofenceStore;
use crate::monitor::{GeofenceMonitor, MonitorDaemon, MonitorHandle};
use crate::sink::{outbound_channel, AlertSink, SinkDispatcher, StateSink, TracingSink};
use crate::telemetry::{MetricsSnapshot, MonitorMetrics};

/// The two outbound ports.
#[derive(Clone)]
pub struct AppSinks {
    pub state: Arc<dyn StateSink>,
    pub alerts: Arc<dyn AlertSink>,
}

impl AppSinks {
    /// Use the given sinks.
    pub fn new(state: Arc<dyn StateSink>, alerts: Arc<dyn AlertSink>) -> Self {
        Self { state, alerts }
    }

    /// Log every write instead of sending it anywhere.
    pub fn tracing() -> Self {
        let sink = Arc::new(TracingSink);
        Self {
            state: Arc::clone(&sink) as Arc<dyn StateSink>,
            alerts: sink as Arc<dyn AlertSink>,
        }
    }
}

impl std::fmt::Debug for AppSinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSinks").finish_non_exhaustive()
    }
}

/// A running monitor with its sink dispatcher.
pub struct GeowatchApp {
    handle: MonitorHandle,
    store: Arc<GeofenceStore>,
    metrics: Arc<MonitorMetrics>,
    /// Cancels the dispatcher; the daemon listens on a child token.
    shutdown: CancellationToken,
    daemon_shutdown: CancellationToken,
    daemon_task: JoinHandle<GeofenceMonitor>,
    dispatcher_task: JoinHandle<()>,
}

impl GeowatchApp {
    /// Start with the system clock.
    pub fn start(config: AppConfig, sinks: AppSinks) -> Result<Self, AppError> {
        Self::start_with_clock(config, sinks, Arc::new(SystemClock))
    }

    /// Start with an explicit clock (tests and replays use a manual one).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_with_clock(
        config: AppConfig,
        sinks: AppSinks,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        tokio::runtime::Handle::try_current().map_err(|_| AppError::NoRuntime)?;

        info!("Starting geowatch");

        let store = Arc::new(GeofenceStore::new());
        let metrics = Arc::new(MonitorMetrics::new());
        let (outbound_tx, outbound_rx) = outbound_channel();

        let shutdown = CancellationToken::new();
        let daemon_shutdown = shutdown.child_token();

        let dispatcher = SinkDispatcher::new(
            sinks.state,
            sinks.alerts,
            config.dispatcher.clone(),
            Arc::clone(&metrics),
        );
        let dispatcher_task = tokio::spawn(dispatcher.run(outbound_rx, shutdown.clone()));

        info!(
            retry_attempts = config.dispatcher.retry_attempts,
            retry_backoff_ms = config.dispatcher.retry_backoff.as_millis() as u64,
            "Sink dispatcher started"
        );

        let monitor = GeofenceMonitor::new(
            Arc::clone(&store),
            clock,
            outbound_tx,
            Arc::clone(&metrics),
        );
        let (daemon, handle) = MonitorDaemon::new(monitor, config.monitor.clone());
        let daemon_task = tokio::spawn(daemon.run(daemon_shutdown.clone()));

        info!(
            report_interval_secs = config.monitor.report_interval.as_secs(),
            command_channel_capacity = config.monitor.command_channel_capacity,
            "Monitor daemon started"
        );

        Ok(Self {
            handle,
            store,
            metrics,
            shutdown,
            daemon_shutdown,
            daemon_task,
            dispatcher_task,
        })
    }

    /// Command handle for the monitor.
    pub fn handle(&self) -> &MonitorHandle {
        &self.handle
    }

    /// The shared geofence store (read-only use; replace through the handle).
    pub fn store(&self) -> Arc<GeofenceStore> {
        Arc::clone(&self.store)
    }

    /// Live counters.
    pub fn metrics(&self) -> Arc<MonitorMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Token cancelled at shutdown; callers may cancel it to request one.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.daemon_shutdown.clone()
    }

    /// Load a geofence feed file and install it. Returns the number of
    /// geofences decoded.
    pub async fn load_geofences(&self, path: impl AsRef<Path>) -> Result<usize, AppError> {
        let geofences = load_geofences_file(path)?;
        let count = geofences.len();
        self.handle.replace_geofences(geofences).await?;
        Ok(count)
    }

    /// Stop timers, stop the daemon, then flush pending writes.
    ///
    /// The dispatcher is only cancelled once the daemon has exited, so every
    /// write the monitor produced is already queued and gets delivered.
    pub async fn shutdown(self) -> MetricsSnapshot {
        info!("Shutting down geowatch");

        self.handle.stop_all_reporting();
        self.daemon_shutdown.cancel();

        match self.daemon_task.await {
            Ok(monitor) => {
                info!(devices = monitor.device_count(), "Monitor daemon stopped");
                // Releases the last outbound sender.
                drop(monitor);
            }
            Err(e) => warn!(error = %e, "Monitor daemon task failed"),
        }

        self.shutdown.cancel();
        if let Err(e) = self.dispatcher_task.await {
            warn!(error = %e, "Sink dispatcher task failed");
        }

        let snapshot = self.metrics.snapshot();
        info!(metrics = %snapshot, "geowatch shutdown complete");
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::coord::{Coordinate, Polygon};
    use crate::geofence::Geofence;
    use crate::sink::{MemoryAlertSink, MemoryStateSink};
    use crate::tracker::Fix;
    use std::io::Write;

    fn square() -> Geofence {
        Geofence::new(
            "a",
            Polygon::from_lng_lat(&[[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]]),
        )
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let result = GeowatchApp::start(AppConfig::default(), AppSinks::tracing());
        assert!(matches!(result, Err(AppError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_shutdown_flushes_writes() {
        let state = Arc::new(MemoryStateSink::new());
        let alerts = Arc::new(MemoryAlertSink::new());
        let sinks = AppSinks::new(
            Arc::clone(&state) as Arc<dyn StateSink>,
            Arc::clone(&alerts) as Arc<dyn AlertSink>,
        );
        let app = GeowatchApp::start_with_clock(
            AppConfig::default(),
            sinks,
            Arc::new(ManualClock::new(0)),
        )
        .unwrap();

        let handle = app.handle().clone();
        handle.replace_geofences(vec![square()]).await.unwrap();
        handle
            .record_fix("dev", Fix::new(Coordinate::new(5.0, 5.0), 10))
            .await
            .unwrap();
        handle
            .record_fix("dev", Fix::new(Coordinate::new(5.0, 20.0), 20))
            .await
            .unwrap();

        let metrics = app.shutdown().await;

        assert_eq!(alerts.len(), 1);
        let record = state.record("dev").unwrap();
        assert_eq!(record["status"], "outside");
        assert_eq!(metrics.exits_detected, 1);
        assert_eq!(metrics.sink_failures, 0);
    }

    #[tokio::test]
    async fn test_load_geofences_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": "a", "polygon": [[0,0],[0,1],[1,1]]}}]"#).unwrap();

        let app = GeowatchApp::start(AppConfig::default(), AppSinks::tracing()).unwrap();
        assert_eq!(app.load_geofences(file.path()).await.unwrap(), 1);

        // Replacement is applied by the daemon before it answers the query.
        app.handle().device_state("none").await.unwrap();
        assert_eq!(app.store().len(), 1);

        app.shutdown().await;
    }
}
