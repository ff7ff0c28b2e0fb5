//! Edge-triggered exit latch.

use tracing::debug;

use crate::coord::{Coordinate, TimestampMs};

use super::{ContainmentStatus, DeviceId, TransitionEvent};

/// Tracks inside/outside for one device and reports inside → outside edges.
#[derive(Debug, Clone, Default)]
pub struct TransitionTracker {
    status: ContainmentStatus,
    observations: u64,
}

impl TransitionTracker {
    /// Create a tracker in the conservative `Outside` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current latched status.
    pub fn status(&self) -> ContainmentStatus {
        self.status
    }

    /// Number of live evaluations observed so far.
    pub fn observations(&self) -> u64 {
        self.observations
    }

    /// Initialize the latch from a previously persisted status.
    ///
    /// Only accepted before the first live observation; returns `false` and
    /// leaves the state untouched afterwards.
    pub fn seed(&mut self, initial: ContainmentStatus) -> bool {
        if self.observations > 0 {
            return false;
        }
        self.status = initial;
        true
    }

    /// Feed one containment result and return the exit event, if this
    /// observation closes an inside → outside edge.
    pub fn observe(
        &mut self,
        device_id: &DeviceId,
        is_inside: bool,
        coordinate: Coordinate,
        timestamp_ms: TimestampMs,
    ) -> Option<TransitionEvent> {
        let next = ContainmentStatus::from_inside(is_inside);
        let previous = std::mem::replace(&mut self.status, next);
        self.observations += 1;

        if previous != next {
            debug!(
                device_id = %device_id,
                from = %previous,
                to = %next,
                timestamp_ms,
                "Containment changed"
            );
        }

        match (previous, next) {
            (ContainmentStatus::Inside, ContainmentStatus::Outside) => Some(
                TransitionEvent::exit(device_id.clone(), coordinate, timestamp_ms),
            ),
            _ => None,
        }
    }
}
