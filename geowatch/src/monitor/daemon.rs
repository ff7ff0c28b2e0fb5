//! Single-task processing loop around [`GeofenceMonitor`].
//!
//! Every input (fixes, geofence feed updates, report ticks, queries) arrives
//! as a [`MonitorCommand`] on one bounded channel and is handled to
//! completion before the next is read, so device state is only ever touched
//! from this task.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::geofence::Geofence;
use crate::scheduler::ReportingScheduler;
use crate::tracker::{ContainmentStatus, DeviceId, DeviceState, Fix};

use super::{GeofenceMonitor, MonitorConfig, MonitorError};

/// Inputs accepted by the daemon.
#[derive(Debug)]
pub enum MonitorCommand {
    /// A new location fix for a device.
    Fix { device_id: DeviceId, fix: Fix },

    /// Full replacement of the geofence set.
    ReplaceGeofences(Vec<Geofence>),

    /// Initialize a device's latch from persisted status.
    Seed {
        device_id: DeviceId,
        status: ContainmentStatus,
    },

    /// Periodic report for one device, or for all devices when `None`.
    Tick { device_id: Option<DeviceId> },

    /// Immediate report for one device.
    ReportNow { device_id: DeviceId },

    /// Drop a device's state.
    Forget { device_id: DeviceId },

    /// Read a device's state.
    QueryState {
        device_id: DeviceId,
        reply: oneshot::Sender<Option<DeviceState>>,
    },
}

/// Runs a [`GeofenceMonitor`] on a dedicated task.
pub struct MonitorDaemon {
    monitor: GeofenceMonitor,
    command_rx: mpsc::Receiver<MonitorCommand>,
}

impl MonitorDaemon {
    /// Create a daemon and the handle used to drive it.
    pub fn new(monitor: GeofenceMonitor, config: MonitorConfig) -> (Self, MonitorHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.command_channel_capacity.max(1));
        let scheduler = ReportingScheduler::new(config.report_interval, command_tx.clone());

        let daemon = Self {
            monitor,
            command_rx,
        };
        let handle = MonitorHandle {
            command_tx,
            scheduler: Arc::new(scheduler),
        };
        (daemon, handle)
    }

    /// Process commands until shutdown is signalled or every handle is dropped.
    ///
    /// Returns the monitor so callers can inspect final state.
    pub async fn run(self, shutdown: CancellationToken) -> GeofenceMonitor {
        info!("Monitor daemon starting");

        let Self {
            mut monitor,
            mut command_rx,
        } = self;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    // Finish what was already submitted; refuse anything new.
                    command_rx.close();
                    let mut drained = 0usize;
                    while let Ok(command) = command_rx.try_recv() {
                        Self::handle_command(&mut monitor, command);
                        drained += 1;
                    }
                    info!(drained, "Monitor daemon shutting down");
                    break;
                }

                command = command_rx.recv() => {
                    match command {
                        Some(command) => Self::handle_command(&mut monitor, command),
                        None => {
                            debug!("All monitor handles dropped");
                            break;
                        }
                    }
                }
            }
        }

        info!(metrics = %monitor.metrics().snapshot(), "Monitor daemon stopped");
        monitor
    }

    fn handle_command(monitor: &mut GeofenceMonitor, command: MonitorCommand) {
        match command {
            MonitorCommand::Fix { device_id, fix } => {
                monitor.record_fix(&device_id, fix);
            }
            MonitorCommand::ReplaceGeofences(definitions) => {
                monitor.replace_geofences(definitions);
            }
            MonitorCommand::Seed { device_id, status } => {
                monitor.seed(&device_id, status);
            }
            MonitorCommand::Tick { device_id } => {
                let now = monitor.now_ms();
                match device_id {
                    Some(device_id) => {
                        monitor.tick_device(&device_id, now);
                    }
                    None => {
                        monitor.tick(now);
                    }
                }
            }
            MonitorCommand::ReportNow { device_id } => {
                monitor.report_now(&device_id);
            }
            MonitorCommand::Forget { device_id } => {
                monitor.forget_device(&device_id);
            }
            MonitorCommand::QueryState { device_id, reply } => {
                let state = monitor.device_state(&device_id).cloned();
                // Requester may have given up; nothing to do.
                let _ = reply.send(state);
            }
        }
    }
}

/// Cloneable front end for a running [`MonitorDaemon`].
///
/// Also owns the periodic report timers, which feed `Tick` commands into
/// the same channel.
#[derive(Clone)]
pub struct MonitorHandle {
    command_tx: mpsc::Sender<MonitorCommand>,
    scheduler: Arc<ReportingScheduler>,
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("active_timers", &self.scheduler.active_count())
            .finish_non_exhaustive()
    }
}

impl MonitorHandle {
    /// Send a raw command.
    pub async fn send(&self, command: MonitorCommand) -> Result<(), MonitorError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| MonitorError::NotRunning)
    }

    /// Submit a fix.
    pub async fn record_fix(
        &self,
        device_id: impl Into<DeviceId>,
        fix: Fix,
    ) -> Result<(), MonitorError> {
        self.send(MonitorCommand::Fix {
            device_id: device_id.into(),
            fix,
        })
        .await
    }

    /// Replace the geofence set.
    pub async fn replace_geofences(&self, definitions: Vec<Geofence>) -> Result<(), MonitorError> {
        self.send(MonitorCommand::ReplaceGeofences(definitions)).await
    }

    /// Seed a device's latch. Ignored by the monitor once the device has
    /// been evaluated.
    pub async fn seed(
        &self,
        device_id: impl Into<DeviceId>,
        status: ContainmentStatus,
    ) -> Result<(), MonitorError> {
        self.send(MonitorCommand::Seed {
            device_id: device_id.into(),
            status,
        })
        .await
    }

    /// Report every device now, as a periodic tick would.
    pub async fn tick_all(&self) -> Result<(), MonitorError> {
        self.send(MonitorCommand::Tick { device_id: None }).await
    }

    /// Report one device now (the manual "send location" action).
    pub async fn report_now(&self, device_id: impl Into<DeviceId>) -> Result<(), MonitorError> {
        self.send(MonitorCommand::ReportNow {
            device_id: device_id.into(),
        })
        .await
    }

    /// End a device's session: stop its timer and drop its state.
    pub async fn forget(&self, device_id: impl Into<DeviceId>) -> Result<(), MonitorError> {
        let device_id = device_id.into();
        self.scheduler.stop(&device_id);
        self.send(MonitorCommand::Forget { device_id }).await
    }

    /// Fetch a copy of a device's state.
    pub async fn device_state(
        &self,
        device_id: impl Into<DeviceId>,
    ) -> Result<Option<DeviceState>, MonitorError> {
        let (reply, rx) = oneshot::channel();
        self.send(MonitorCommand::QueryState {
            device_id: device_id.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| MonitorError::ReplyDropped)
    }

    /// Start (or restart) the periodic report timer for a device.
    pub fn start_reporting(&self, device_id: impl Into<DeviceId>) {
        self.scheduler.start(device_id.into());
    }

    /// Stop a device's periodic report timer.
    pub fn stop_reporting(&self, device_id: &str) -> bool {
        self.scheduler.stop(device_id)
    }

    /// Stop every periodic report timer.
    pub fn stop_all_reporting(&self) {
        self.scheduler.stop_all();
    }

    /// The report timer registry.
    pub fn scheduler(&self) -> &ReportingScheduler {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::coord::{Coordinate, Polygon};
    use crate::geofence::GeofenceStore;
    use crate::sink::{outbound_channel, Outbound, OutboundReceiver};
    use crate::telemetry::MonitorMetrics;

    fn square() -> Geofence {
        Geofence::new(
            "a",
            Polygon::from_lng_lat(&[[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]]),
        )
    }

    fn start() -> (
        MonitorHandle,
        OutboundReceiver,
        CancellationToken,
        tokio::task::JoinHandle<GeofenceMonitor>,
    ) {
        let (tx, rx) = outbound_channel();
        let monitor = GeofenceMonitor::new(
            Arc::new(GeofenceStore::new()),
            Arc::new(ManualClock::new(0)) as Arc<dyn Clock>,
            tx,
            Arc::new(MonitorMetrics::new()),
        );
        let (daemon, handle) = MonitorDaemon::new(monitor, MonitorConfig::default());
        let shutdown = CancellationToken::new();
        let join = tokio::spawn(daemon.run(shutdown.clone()));
        (handle, rx, shutdown, join)
    }

    #[tokio::test]
    async fn test_commands_processed_in_order() {
        let (handle, mut rx, shutdown, join) = start();

        handle.replace_geofences(vec![square()]).await.unwrap();
        handle
            .record_fix("dev", Fix::new(Coordinate::new(5.0, 5.0), 1))
            .await
            .unwrap();
        handle
            .record_fix("dev", Fix::new(Coordinate::new(5.0, 15.0), 2))
            .await
            .unwrap();

        // Query is answered after the preceding commands were applied.
        let state = handle.device_state("dev").await.unwrap().unwrap();
        assert!(!state.was_inside_any());
        assert_eq!(state.last_fix.unwrap().timestamp_ms, 2);

        let mut alerts = 0;
        while let Ok(message) = rx.try_recv() {
            if matches!(message, Outbound::Alert(_)) {
                alerts += 1;
            }
        }
        assert_eq!(alerts, 1);

        shutdown.cancel();
        let monitor = join.await.unwrap();
        assert_eq!(monitor.device_count(), 1);
    }

    #[tokio::test]
    async fn test_forget_drops_state_and_timer() {
        let (handle, _rx, shutdown, join) = start();
        handle
            .record_fix("dev", Fix::new(Coordinate::new(5.0, 5.0), 1))
            .await
            .unwrap();
        handle.start_reporting("dev");
        assert!(handle.scheduler().is_running("dev"));

        handle.forget("dev").await.unwrap();
        assert!(!handle.scheduler().is_running("dev"));
        assert!(handle.device_state("dev").await.unwrap().is_none());

        shutdown.cancel();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn test_queued_commands_applied_on_shutdown() {
        let (handle, mut rx, shutdown, join) = start();
        handle.replace_geofences(vec![square()]).await.unwrap();
        handle
            .record_fix("dev", Fix::new(Coordinate::new(5.0, 5.0), 1))
            .await
            .unwrap();
        handle
            .record_fix("dev", Fix::new(Coordinate::new(5.0, 15.0), 2))
            .await
            .unwrap();

        shutdown.cancel();
        let monitor = join.await.unwrap();

        assert_eq!(monitor.device_count(), 1);
        let mut alerts = 0;
        while let Ok(message) = rx.try_recv() {
            if matches!(message, Outbound::Alert(_)) {
                alerts += 1;
            }
        }
        assert_eq!(alerts, 1);
    }

    #[tokio::test]
    async fn test_handle_errors_after_shutdown() {
        let (handle, _rx, shutdown, join) = start();
        shutdown.cancel();
        join.await.unwrap();

        let result = handle.report_now("dev").await;
        assert_eq!(result, Err(MonitorError::NotRunning));
    }
}
