//! Geowatch - geofence monitoring for tracked devices
//!
//! This library decides whether device location fixes fall inside any active
//! polygonal geofence, raises one alert per inside → outside transition, and
//! keeps reporting each device's last known status on a fixed cadence.

pub mod app;
pub mod clock;
pub mod config;
pub mod coord;
pub mod feed;
pub mod geofence;
pub mod geometry;
pub mod logging;
pub mod monitor;
pub mod scheduler;
pub mod sink;
pub mod telemetry;
pub mod tracker;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
