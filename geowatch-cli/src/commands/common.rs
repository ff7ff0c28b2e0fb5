//! Helpers shared across commands.

use std::path::Path;

use clap::ValueEnum;
use geowatch::config::ConfigFile;
use geowatch::feed::load_geofences_file;
use geowatch::geofence::Geofence;
use geowatch::tracker::ContainmentStatus;
use tracing::warn;

use crate::error::CliError;

/// Containment status accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StatusArg {
    Inside,
    Outside,
}

impl From<StatusArg> for ContainmentStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Inside => ContainmentStatus::Inside,
            StatusArg::Outside => ContainmentStatus::Outside,
        }
    }
}

/// Load the config file, falling back to defaults if it is unreadable.
pub fn load_config() -> ConfigFile {
    ConfigFile::load().unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring unreadable config file");
        ConfigFile::default()
    })
}

/// Load a geofence feed file, reporting how many geofences it held.
pub fn load_geofences(path: &Path) -> Result<Vec<Geofence>, CliError> {
    let geofences = load_geofences_file(path)?;
    println!(
        "Loaded {} geofence(s) from {}",
        geofences.len(),
        path.display()
    );
    Ok(geofences)
}
