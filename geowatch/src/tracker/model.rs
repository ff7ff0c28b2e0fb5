//! Device state and transition event types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coord::{Coordinate, TimestampMs};

use super::TransitionTracker;

/// Identifier of a tracked device.
pub type DeviceId = String;

/// Whether a device is inside any active geofence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainmentStatus {
    /// Inside at least one active geofence.
    Inside,
    /// Not inside any active geofence.
    #[default]
    Outside,
}

impl ContainmentStatus {
    /// Map a containment boolean to a status.
    pub fn from_inside(is_inside: bool) -> Self {
        if is_inside {
            ContainmentStatus::Inside
        } else {
            ContainmentStatus::Outside
        }
    }

    /// Wire representation (`"inside"` / `"outside"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainmentStatus::Inside => "inside",
            ContainmentStatus::Outside => "outside",
        }
    }

    /// True for [`ContainmentStatus::Inside`].
    pub fn is_inside(&self) -> bool {
        matches!(self, ContainmentStatus::Inside)
    }
}

impl fmt::Display for ContainmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inside" => Ok(ContainmentStatus::Inside),
            "outside" => Ok(ContainmentStatus::Outside),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// A single reported device location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Reported position.
    pub coordinate: Coordinate,
    /// When the position was sampled.
    pub timestamp_ms: TimestampMs,
}

impl Fix {
    /// Create a new fix.
    pub fn new(coordinate: Coordinate, timestamp_ms: TimestampMs) -> Self {
        Self {
            coordinate,
            timestamp_ms,
        }
    }
}

/// Kind of boundary transition.
///
/// Only exits are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    /// The device left every active geofence.
    Exit,
}

impl TransitionKind {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Exit => "exit",
        }
    }
}

/// An inside → outside transition, dispatched once to the alert sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Device that crossed the boundary.
    pub device_id: DeviceId,
    /// Where the device was first observed outside.
    pub coordinate: Coordinate,
    /// Timestamp of the fix that produced the transition.
    pub timestamp_ms: TimestampMs,
    /// Always [`TransitionKind::Exit`].
    pub kind: TransitionKind,
}

impl TransitionEvent {
    /// Create an exit event.
    pub fn exit(
        device_id: impl Into<DeviceId>,
        coordinate: Coordinate,
        timestamp_ms: TimestampMs,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            coordinate,
            timestamp_ms,
            kind: TransitionKind::Exit,
        }
    }

    /// Storage key under which sinks deduplicate this alert.
    pub fn alert_key(&self) -> (DeviceId, TimestampMs) {
        (self.device_id.clone(), self.timestamp_ms)
    }
}

/// Everything the monitor knows about one device.
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    /// Most recent fix, if any has arrived.
    pub last_fix: Option<Fix>,
    /// Inside/outside latch.
    pub tracker: TransitionTracker,
}

impl DeviceState {
    /// Fresh state: no fix, outside.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the last live evaluation was inside any geofence.
    pub fn was_inside_any(&self) -> bool {
        self.tracker.status().is_inside()
    }
}
