//! Containment against the active geofence set.

use std::sync::Arc;

use crate::coord::{Coordinate, TimestampMs};
use crate::geometry;

use super::{Geofence, GeofenceSnapshot, GeofenceStore};

/// Decides whether a coordinate is inside any geofence active at a given time.
///
/// Each call takes one snapshot of the store, so a concurrent
/// [`GeofenceStore::replace_all`] is observed either fully or not at all.
#[derive(Debug, Clone)]
pub struct GeofenceEvaluator {
    store: Arc<GeofenceStore>,
}

impl GeofenceEvaluator {
    /// Create an evaluator over `store`.
    pub fn new(store: Arc<GeofenceStore>) -> Self {
        Self { store }
    }

    /// The store this evaluator reads from.
    pub fn store(&self) -> &Arc<GeofenceStore> {
        &self.store
    }

    /// True when `point` is inside at least one geofence active at `now_ms`.
    ///
    /// An empty or fully disabled set is the ordinary "outside" answer.
    pub fn is_inside_any(&self, point: &Coordinate, now_ms: TimestampMs) -> bool {
        self.matching_geofence(point, now_ms).is_some()
    }

    /// Id of the first active geofence containing `point`, if any.
    ///
    /// Iteration order over the set is unspecified, so with overlapping
    /// geofences any one of the matches may be returned.
    pub fn matching_geofence(&self, point: &Coordinate, now_ms: TimestampMs) -> Option<String> {
        let snapshot = self.store.snapshot();
        first_match(&snapshot, point, now_ms).map(|fence| fence.id.clone())
    }
}

fn first_match<'a>(
    snapshot: &'a GeofenceSnapshot,
    point: &Coordinate,
    now_ms: TimestampMs,
) -> Option<&'a Geofence> {
    snapshot.values().find(|fence| {
        fence.is_active_at(now_ms)
            && !fence.polygon.is_degenerate()
            && geometry::contains(point, &fence.polygon)
    })
}
