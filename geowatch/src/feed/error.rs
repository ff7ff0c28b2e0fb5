//! Feed error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors for feed input that cannot be read at all.
///
/// Individual bad records are not errors; they are dropped during decoding.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The payload is not JSON.
    #[error("Invalid geofence feed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is JSON but neither an object nor an array.
    #[error("Unexpected geofence feed shape: expected object or array, got {0}")]
    Shape(&'static str),

    /// The feed file could not be read.
    #[error("Failed to read geofence feed {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
