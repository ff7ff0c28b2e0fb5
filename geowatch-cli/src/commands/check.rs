//! `check` command: test one point against a geofence feed.

use std::path::PathBuf;
use std::sync::Arc;

use geowatch::clock::{Clock, SystemClock};
use geowatch::coord::{Coordinate, TimestampMs};
use geowatch::geofence::{Geofence, GeofenceEvaluator, GeofenceStore};
use geowatch::tracker::ContainmentStatus;

use super::common::load_geofences;
use crate::error::CliError;

/// Arguments for the check command.
pub struct CheckArgs {
    pub geofences: PathBuf,
    pub lat: f64,
    pub lng: f64,
    pub at: Option<TimestampMs>,
}

/// Outcome of a single containment check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub status: ContainmentStatus,
    pub geofence_id: Option<String>,
    pub evaluated_at: TimestampMs,
}

/// Run the check command.
pub fn run(args: CheckArgs) -> Result<(), CliError> {
    let geofences = load_geofences(&args.geofences)?;
    let at = args.at.unwrap_or_else(|| SystemClock.now_ms());
    let result = check(geofences, Coordinate::new(args.lat, args.lng), at);

    match &result.geofence_id {
        Some(id) => println!("{} (geofence: {})", result.status, id),
        None => println!("{}", result.status),
    }
    println!("Evaluated at {} ms", result.evaluated_at);
    Ok(())
}

/// Evaluate `point` against `geofences` at `at`.
pub fn check(geofences: Vec<Geofence>, point: Coordinate, at: TimestampMs) -> CheckResult {
    let evaluator = GeofenceEvaluator::new(Arc::new(GeofenceStore::with_geofences(geofences)));
    let geofence_id = evaluator.matching_geofence(&point, at);
    CheckResult {
        status: ContainmentStatus::from_inside(geofence_id.is_some()),
        geofence_id,
        evaluated_at: at,
    }
}
