//! The currently installed geofence set.
//!
//! # Thread Safety
//!
//! The set lives behind an `Arc` that is swapped wholesale under a
//! `parking_lot::RwLock`. The lock is held only for the pointer swap or clone,
//! so an evaluation running against a [`GeofenceSnapshot`] always sees one
//! complete set even while a replace happens concurrently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::Geofence;

/// Immutable view of the geofence set at the moment it was taken.
pub type GeofenceSnapshot = Arc<HashMap<String, Geofence>>;

/// Holds the current geofence definitions keyed by id.
#[derive(Debug, Default)]
pub struct GeofenceStore {
    current: RwLock<GeofenceSnapshot>,
    generation: AtomicU64,
}

impl GeofenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `definitions`.
    pub fn with_geofences<I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = Geofence>,
    {
        let store = Self::new();
        store.replace_all(definitions);
        store
    }

    /// Install a new set, superseding the previous one entirely.
    ///
    /// Ids that appear more than once keep the last definition. Returns the
    /// new generation number.
    pub fn replace_all<I>(&self, definitions: I) -> u64
    where
        I: IntoIterator<Item = Geofence>,
    {
        let next: HashMap<String, Geofence> = definitions
            .into_iter()
            .map(|fence| (fence.id.clone(), fence))
            .collect();
        let count = next.len();

        // Bump under the write guard so the generation names this set.
        let generation = {
            let mut current = self.current.write();
            *current = Arc::new(next);
            self.generation.fetch_add(1, Ordering::AcqRel) + 1
        };

        debug!(generation, geofences = count, "Geofence set replaced");
        generation
    }

    /// Consistent view of the installed set.
    pub fn snapshot(&self) -> GeofenceSnapshot {
        self.current.read().clone()
    }

    /// The installed set together with the generation that installed it.
    pub fn versioned_snapshot(&self) -> (u64, GeofenceSnapshot) {
        let current = self.current.read();
        (self.generation.load(Ordering::Acquire), current.clone())
    }

    /// Number of installed geofences.
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    /// True when no geofences are installed.
    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    /// How many times the set has been replaced.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
