//! Geofence definitions, the installed set, and containment evaluation.
//!
//! # Layers
//!
//! ```text
//! GeofenceFeed ──replace_all──► GeofenceStore ──snapshot──► GeofenceEvaluator ──► bool
//!                               (Arc swap)                  (enabled / window / polygon)
//! ```
//!
//! Geofences are immutable values. The store never edits one in place; every
//! feed update installs a complete new set and readers keep whichever set
//! they snapshotted.

mod evaluator;
mod model;
mod store;

pub use evaluator::GeofenceEvaluator;
pub use model::{ActivationWindow, Geofence};
pub use store::{GeofenceSnapshot, GeofenceStore};
