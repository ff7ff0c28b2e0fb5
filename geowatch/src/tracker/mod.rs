//! Per-device containment state and exit detection.
//!
//! # State Machine
//!
//! ```text
//! Outside --[inside]--> Inside      (no event)
//! Inside --[outside]--> Outside     (one Exit event)
//! Inside --[inside]--> Inside       (no event)
//! Outside --[outside]--> Outside    (no event)
//! ```
//!
//! Exit detection is edge-triggered: after an exit the latch stays open until
//! an inside observation closes it again. Entering a geofence never produces
//! an event.

mod model;
mod transition;

pub use model::{ContainmentStatus, DeviceId, DeviceState, Fix, TransitionEvent, TransitionKind};
pub use transition::TransitionTracker;
