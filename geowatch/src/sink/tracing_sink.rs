//! Sink that writes to the log instead of a backend.

use tracing::{info, warn};

use crate::tracker::TransitionEvent;

use super::{AlertSink, BoxFuture, SinkError, StateSink, StatusUpdate};

/// Logs every status update at `info` and every alert at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl StateSink for TracingSink {
    fn update<'a>(&'a self, update: &'a StatusUpdate) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            info!(
                device_id = %update.device_id,
                lat = update.lat,
                lng = update.lng,
                status = %update.status,
                timestamp_ms = ?update.timestamp_ms,
                "Device status"
            );
            Ok(())
        })
    }
}

impl AlertSink for TracingSink {
    fn append<'a>(&'a self, event: &'a TransitionEvent) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            warn!(
                device_id = %event.device_id,
                lat = event.coordinate.lat,
                lng = event.coordinate.lng,
                timestamp_ms = event.timestamp_ms,
                kind = event.kind.as_str(),
                "Geofence exit"
            );
            Ok(())
        })
    }
}
