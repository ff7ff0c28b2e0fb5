//! Sink traits and the status update record.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::coord::TimestampMs;
use crate::tracker::{ContainmentStatus, DeviceId, TransitionEvent};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors a sink can report for a single write.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The backend refused the write.
    #[error("Write rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    /// Local I/O failure while writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Partial update of a device's remote record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub device_id: DeviceId,
    pub lat: f64,
    pub lng: f64,
    pub status: ContainmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<TimestampMs>,
}

impl StatusUpdate {
    /// Periodic or fix-driven status report.
    pub fn report(
        device_id: impl Into<DeviceId>,
        lat: f64,
        lng: f64,
        status: ContainmentStatus,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            lat,
            lng,
            status,
            timestamp_ms: None,
        }
    }

    /// The `outside` update written alongside an exit alert.
    pub fn for_exit(event: &TransitionEvent) -> Self {
        Self {
            device_id: event.device_id.clone(),
            lat: event.coordinate.lat,
            lng: event.coordinate.lng,
            status: ContainmentStatus::Outside,
            timestamp_ms: Some(event.timestamp_ms),
        }
    }

    /// Field map to merge into the remote record.
    ///
    /// Only the fields carried by this update are present, so merging never
    /// clears anything else stored on the record.
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("deviceId".to_string(), Value::from(self.device_id));
        fields.insert("lat".to_string(), Value::from(self.lat));
        fields.insert("lng".to_string(), Value::from(self.lng));
        fields.insert("status".to_string(), Value::from(self.status.as_str()));
        if let Some(timestamp) = self.timestamp_ms {
            fields.insert("timestamp".to_string(), Value::from(timestamp));
        }
        fields
    }
}

/// Remote device-state store with merge semantics.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the dispatcher holds them as
/// `Arc<dyn StateSink>`.
pub trait StateSink: Send + Sync {
    /// Merge `update` into the device's record.
    ///
    /// Fields absent from the update must be left as they are.
    fn update<'a>(&'a self, update: &'a StatusUpdate) -> BoxFuture<'a, Result<(), SinkError>>;
}

/// Append-only alert store.
///
/// Alerts are keyed by [`TransitionEvent::alert_key`]; writing the same
/// event twice (for example on retry) must leave a single record.
pub trait AlertSink: Send + Sync {
    /// Store `event`.
    fn append<'a>(&'a self, event: &'a TransitionEvent) -> BoxFuture<'a, Result<(), SinkError>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;

    #[test]
    fn test_report_fields() {
        let fields =
            StatusUpdate::report("dev", 1.5, 2.5, ContainmentStatus::Inside).into_fields();
        assert_eq!(fields["deviceId"], "dev");
        assert_eq!(fields["lat"], 1.5);
        assert_eq!(fields["lng"], 2.5);
        assert_eq!(fields["status"], "inside");
        assert!(!fields.contains_key("timestamp"));
    }

    #[test]
    fn test_exit_update_is_outside_with_timestamp() {
        let event = TransitionEvent::exit("dev", Coordinate::new(3.0, 4.0), 100);
        let update = StatusUpdate::for_exit(&event);
        assert_eq!(update.status, ContainmentStatus::Outside);
        assert_eq!(update.timestamp_ms, Some(100));
        assert_eq!(update.into_fields()["timestamp"], 100);
    }

    #[test]
    fn test_serde_camel_case() {
        let json = serde_json::to_value(StatusUpdate::report(
            "dev",
            0.0,
            0.0,
            ContainmentStatus::Outside,
        ))
        .unwrap();
        assert!(json.get("deviceId").is_some());
        assert!(json.get("timestampMs").is_none());
    }

    #[test]
    fn test_sink_error_display() {
        let err = SinkError::Unavailable("offline".to_string());
        assert_eq!(err.to_string(), "Sink unavailable: offline");
    }
}
