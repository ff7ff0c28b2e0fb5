//! Geofence value types.

use serde::{Deserialize, Serialize};

use crate::coord::{Polygon, TimestampMs};

/// Inclusive time range during which a geofence takes part in containment checks.
///
/// Windows are not validated: one with `start_ms > end_ms` is simply never active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationWindow {
    /// First active instant (inclusive).
    pub start_ms: TimestampMs,
    /// Last active instant (inclusive).
    pub end_ms: TimestampMs,
}

impl ActivationWindow {
    /// Create a new window.
    pub fn new(start_ms: TimestampMs, end_ms: TimestampMs) -> Self {
        Self { start_ms, end_ms }
    }

    /// True when `now_ms` falls within `[start_ms, end_ms]`.
    pub fn is_active_at(&self, now_ms: TimestampMs) -> bool {
        now_ms >= self.start_ms && now_ms <= self.end_ms
    }
}

/// A named polygonal region with an enabled flag and optional activation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    /// Unique identifier within a feed payload.
    pub id: String,
    /// Disabled geofences never match.
    pub enabled: bool,
    /// When present, the geofence only matches inside this window.
    pub activation_window: Option<ActivationWindow>,
    /// Boundary ring.
    pub polygon: Polygon,
}

impl Geofence {
    /// Create an enabled, always-active geofence.
    pub fn new(id: impl Into<String>, polygon: Polygon) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            activation_window: None,
            polygon,
        }
    }

    /// Restrict the geofence to an activation window.
    pub fn with_window(mut self, start_ms: TimestampMs, end_ms: TimestampMs) -> Self {
        self.activation_window = Some(ActivationWindow::new(start_ms, end_ms));
        self
    }

    /// Mark the geofence as disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// True when the geofence is enabled and its window (if any) covers `now_ms`.
    ///
    /// Says nothing about the polygon; see [`super::GeofenceEvaluator`].
    pub fn is_active_at(&self, now_ms: TimestampMs) -> bool {
        self.enabled
            && self
                .activation_window
                .map_or(true, |window| window.is_active_at(now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fence() -> Geofence {
        Geofence::new(
            "yard",
            Polygon::from_lng_lat(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]),
        )
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = ActivationWindow::new(100, 200);
        assert!(!window.is_active_at(99));
        assert!(window.is_active_at(100));
        assert!(window.is_active_at(150));
        assert!(window.is_active_at(200));
        assert!(!window.is_active_at(201));
    }

    #[test]
    fn test_inverted_window_never_active() {
        let window = ActivationWindow::new(200, 100);
        for now in [0, 99, 100, 150, 200, 201, i64::MAX] {
            assert!(!window.is_active_at(now), "active at {}", now);
        }
    }

    #[test]
    fn test_geofence_without_window_always_active() {
        let fence = fence();
        assert!(fence.is_active_at(i64::MIN));
        assert!(fence.is_active_at(0));
        assert!(fence.is_active_at(i64::MAX));
    }

    #[test]
    fn test_disabled_geofence_never_active() {
        let fence = fence().with_window(0, 1_000).disabled();
        assert!(!fence.is_active_at(500));
    }

    #[test]
    fn test_builder_sets_window() {
        let fence = fence().with_window(10, 20);
        assert_eq!(fence.activation_window, Some(ActivationWindow::new(10, 20)));
        assert!(fence.enabled);
    }
}
