//! Per-device periodic report timers.
//!
//! Each running timer is a tokio task that sends
//! [`MonitorCommand::Tick`] for its device into the monitor's command
//! channel once per interval. The first tick fires one full interval after
//! [`ReportingScheduler::start`]; an immediate report on start is the
//! caller's job (see [`MonitorHandle::report_now`]).
//!
//! [`MonitorHandle::report_now`]: crate::monitor::MonitorHandle::report_now

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::monitor::MonitorCommand;
use crate::tracker::DeviceId;

type TimerRegistry = Arc<Mutex<HashMap<DeviceId, TimerEntry>>>;

struct TimerEntry {
    id: u64,
    cancel: CancellationToken,
}

/// Registry of running report timers, one per device.
///
/// A timer that stops on its own (the monitor went away) removes itself.
/// Dropping the scheduler cancels every timer it started.
pub struct ReportingScheduler {
    interval: Duration,
    commands: mpsc::Sender<MonitorCommand>,
    root: CancellationToken,
    next_id: AtomicU64,
    timers: TimerRegistry,
}

impl std::fmt::Debug for ReportingScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportingScheduler")
            .field("interval", &self.interval)
            .field("active", &self.active_count())
            .finish()
    }
}

impl ReportingScheduler {
    /// Create a scheduler that delivers ticks to `commands`.
    pub fn new(interval: Duration, commands: mpsc::Sender<MonitorCommand>) -> Self {
        Self {
            interval,
            commands,
            root: CancellationToken::new(),
            next_id: AtomicU64::new(0),
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Report period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the timer for `device_id`, replacing any timer already running
    /// for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, device_id: impl Into<DeviceId>) {
        let device_id = device_id.into();
        let token = self.root.child_token();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = TimerEntry {
            id,
            cancel: token.clone(),
        };

        if let Some(previous) = self.timers.lock().insert(device_id.clone(), entry) {
            previous.cancel.cancel();
            debug!(device_id = %device_id, "Restarted report timer");
        } else {
            debug!(device_id = %device_id, interval = ?self.interval, "Started report timer");
        }

        tokio::spawn(run_timer(
            TimerSlot {
                device_id,
                id,
                registry: Arc::clone(&self.timers),
            },
            self.interval,
            self.commands.clone(),
            token,
        ));
    }

    /// Stop the timer for `device_id`. Returns false if none was running.
    pub fn stop(&self, device_id: &str) -> bool {
        match self.timers.lock().remove(device_id) {
            Some(entry) => {
                entry.cancel.cancel();
                debug!(device_id, "Stopped report timer");
                true
            }
            None => false,
        }
    }

    /// Stop every timer.
    pub fn stop_all(&self) {
        let mut timers = self.timers.lock();
        for (_, entry) in timers.drain() {
            entry.cancel.cancel();
        }
    }

    /// Whether a timer is registered for `device_id`.
    pub fn is_running(&self, device_id: &str) -> bool {
        self.timers
            .lock()
            .get(device_id)
            .is_some_and(|entry| !entry.cancel.is_cancelled())
    }

    /// Number of registered timers.
    pub fn active_count(&self) -> usize {
        self.timers.lock().len()
    }
}

impl Drop for ReportingScheduler {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

/// A timer's own registry entry, identified so a replaced timer never
/// removes its successor.
struct TimerSlot {
    device_id: DeviceId,
    id: u64,
    registry: TimerRegistry,
}

impl TimerSlot {
    fn release(&self) {
        let mut timers = self.registry.lock();
        if timers
            .get(&self.device_id)
            .is_some_and(|entry| entry.id == self.id)
        {
            timers.remove(&self.device_id);
        }
    }
}

async fn run_timer(
    slot: TimerSlot,
    period: Duration,
    commands: mpsc::Sender<MonitorCommand>,
    cancel: CancellationToken,
) {
    let device_id = &slot.device_id;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            _ = ticker.tick() => {
                let command = MonitorCommand::Tick {
                    device_id: Some(device_id.clone()),
                };
                match commands.try_send(command) {
                    Ok(()) => trace!(device_id = %device_id, "Report tick"),
                    // Monitor is backed up; the next tick reports fresher state anyway.
                    Err(TrySendError::Full(_)) => {
                        debug!(device_id = %device_id, "Command channel full, tick dropped");
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(device_id = %device_id, "Monitor gone, report timer stopping");
                        slot.release();
                        break;
                    }
                }
            }
        }
    }

    trace!(device_id = %device_id, "Report timer exited");
}
