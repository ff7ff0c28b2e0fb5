//! The synchronous monitor core.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::coord::TimestampMs;
use crate::geofence::{Geofence, GeofenceEvaluator, GeofenceStore};
use crate::sink::{Outbound, OutboundSender, StatusUpdate};
use crate::telemetry::MonitorMetrics;
use crate::tracker::{ContainmentStatus, DeviceId, DeviceState, Fix, TransitionEvent};

/// Owns per-device state and turns fixes and ticks into outbound writes.
///
/// All mutation goes through `&mut self`, so whoever owns the monitor is
/// the serialization point for device state. Outbound writes are queued and
/// never awaited: by the time a sink sees a message, the state change that
/// produced it has already happened and is not undone if the write fails.
pub struct GeofenceMonitor {
    devices: HashMap<DeviceId, DeviceState>,
    evaluator: GeofenceEvaluator,
    clock: Arc<dyn Clock>,
    outbound: OutboundSender,
    metrics: Arc<MonitorMetrics>,
}

impl std::fmt::Debug for GeofenceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeofenceMonitor")
            .field("devices", &self.devices.len())
            .field("geofences", &self.evaluator.store().len())
            .finish_non_exhaustive()
    }
}

impl GeofenceMonitor {
    /// Create a monitor over `store`, writing to `outbound`.
    pub fn new(
        store: Arc<GeofenceStore>,
        clock: Arc<dyn Clock>,
        outbound: OutboundSender,
        metrics: Arc<MonitorMetrics>,
    ) -> Self {
        Self {
            devices: HashMap::new(),
            evaluator: GeofenceEvaluator::new(store),
            clock,
            outbound,
            metrics,
        }
    }

    /// The geofence store evaluations read from.
    pub fn store(&self) -> &Arc<GeofenceStore> {
        self.evaluator.store()
    }

    /// Shared counters.
    pub fn metrics(&self) -> &Arc<MonitorMetrics> {
        &self.metrics
    }

    /// Current time according to the monitor's clock.
    pub fn now_ms(&self) -> TimestampMs {
        self.clock.now_ms()
    }

    /// Install a new geofence set. Returns the store generation.
    pub fn replace_geofences(&self, definitions: Vec<Geofence>) -> u64 {
        let count = definitions.len();
        let generation = self.store().replace_all(definitions);
        self.metrics.geofences_replaced();
        info!(generation, geofences = count, "Geofence definitions updated");
        generation
    }

    /// Initialize a device's inside/outside latch from persisted status.
    ///
    /// Returns `false` if the device has already been evaluated live, in
    /// which case the seed is ignored.
    pub fn seed(&mut self, device_id: &str, status: ContainmentStatus) -> bool {
        let accepted = self.device_entry(device_id).tracker.seed(status);
        if accepted {
            debug!(device_id, status = %status, "Seeded containment status");
        } else {
            debug!(device_id, status = %status, "Ignoring seed after live evaluation");
        }
        accepted
    }

    /// Handle a new fix.
    ///
    /// Stores it as the device's last fix and evaluates containment at the
    /// clock's current time, so a fix that arrives after its fence's window
    /// closed counts as outside. An inside → outside edge emits an exit alert
    /// stamped with the fix's timestamp (plus an `outside` status write),
    /// then status is reported through [`report_status`](Self::report_status).
    /// Returns the exit event if one was produced.
    pub fn record_fix(&mut self, device_id: &str, fix: Fix) -> Option<TransitionEvent> {
        self.metrics.fix_recorded();

        let now_ms = self.clock.now_ms();
        let is_inside = self.evaluate(&fix, now_ms);
        let device_key: DeviceId = device_id.to_string();
        let state = self.device_entry(device_id);
        state.last_fix = Some(fix);
        let exit = state
            .tracker
            .observe(&device_key, is_inside, fix.coordinate, fix.timestamp_ms);

        debug!(
            device_id,
            lat = fix.coordinate.lat,
            lng = fix.coordinate.lng,
            timestamp_ms = fix.timestamp_ms,
            now_ms,
            is_inside,
            "Fix evaluated"
        );

        if let Some(event) = &exit {
            self.metrics.exit_detected();
            info!(
                device_id,
                lat = event.coordinate.lat,
                lng = event.coordinate.lng,
                timestamp_ms = event.timestamp_ms,
                "Device left all active geofences"
            );
            self.emit(Outbound::Alert(event.clone()));
            self.emit(Outbound::Status(StatusUpdate::for_exit(event)));
        }

        self.report_status(device_id, now_ms);
        exit
    }

    /// Report the status of every device with a known fix, evaluated at `now_ms`.
    ///
    /// Returns how many reports were queued.
    pub fn tick(&self, now_ms: TimestampMs) -> usize {
        let ids: Vec<&DeviceId> = self.devices.keys().collect();
        if ids.is_empty() {
            self.metrics.tick_skipped();
            debug!("No devices tracked yet, skipping report");
            return 0;
        }
        ids.into_iter()
            .filter(|id| self.tick_device(id, now_ms))
            .count()
    }

    /// Report one device's status evaluated at `now_ms` using its last fix.
    ///
    /// Does not touch the exit latch. A device with no fix yet is skipped.
    pub fn tick_device(&self, device_id: &str, now_ms: TimestampMs) -> bool {
        self.report_status(device_id, now_ms).is_some()
    }

    /// Report one device's status right now (manual trigger).
    pub fn report_now(&self, device_id: &str) -> bool {
        self.tick_device(device_id, self.clock.now_ms())
    }

    /// Recompute and queue a device's status at `now_ms`.
    ///
    /// Activation windows are checked against `now_ms`, not against the
    /// time the fix was taken, so a stale fix can change status when a
    /// window opens or closes.
    pub fn report_status(&self, device_id: &str, now_ms: TimestampMs) -> Option<StatusUpdate> {
        let Some(fix) = self.devices.get(device_id).and_then(|state| state.last_fix) else {
            self.metrics.tick_skipped();
            debug!(device_id, "No location available yet for reporting");
            return None;
        };

        let is_inside = self.evaluate(&fix, now_ms);
        Some(self.emit_status(device_id, &fix, ContainmentStatus::from_inside(is_inside)))
    }

    /// Drop a device's state, e.g. when its session ends.
    pub fn forget_device(&mut self, device_id: &str) -> Option<DeviceState> {
        let removed = self.devices.remove(device_id);
        if removed.is_some() {
            debug!(device_id, "Device state dropped");
        }
        removed
    }

    /// Read a device's state.
    pub fn device_state(&self, device_id: &str) -> Option<&DeviceState> {
        self.devices.get(device_id)
    }

    /// Number of devices with state.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn device_entry(&mut self, device_id: &str) -> &mut DeviceState {
        self.devices.entry(device_id.to_string()).or_default()
    }

    fn evaluate(&self, fix: &Fix, now_ms: TimestampMs) -> bool {
        self.metrics.evaluation();
        self.evaluator.is_inside_any(&fix.coordinate, now_ms)
    }

    fn emit_status(&self, device_id: &str, fix: &Fix, status: ContainmentStatus) -> StatusUpdate {
        let update = StatusUpdate::report(
            device_id,
            fix.coordinate.lat,
            fix.coordinate.lng,
            status,
        );
        self.metrics.status_reported();
        self.emit(Outbound::Status(update.clone()));
        update
    }

    fn emit(&self, message: Outbound) {
        if self.outbound.send(message).is_err() {
            debug!("Outbound channel closed, dropping write");
        }
    }
}
