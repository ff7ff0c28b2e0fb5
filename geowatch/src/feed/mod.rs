//! Geofence feed decoding.
//!
//! The remote definition store is loosely typed: records may arrive as an
//! object keyed by id or as an array, numbers may arrive as strings, and
//! polygons come in several shapes. Decoding is lenient. Anything that cannot
//! be turned into a coordinate or a record is dropped and logged at `debug`,
//! so one bad entry never takes down the rest of the feed.

mod decode;
mod error;

use std::path::Path;

pub use decode::{decode_geofence, decode_geofences, parse_geofences};
pub use error::FeedError;

use crate::geofence::Geofence;

/// Read and decode a geofence feed snapshot from a JSON file.
pub fn load_geofences_file(path: impl AsRef<Path>) -> Result<Vec<Geofence>, FeedError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| FeedError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_geofences(&contents)
}
