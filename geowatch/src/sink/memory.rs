//! In-process sink implementations.
//!
//! Both stores follow the contract a remote backend must honour: status
//! updates merge into the existing record, alerts are keyed by
//! `(device_id, timestamp_ms)`. They can also be told to fail their next
//! writes, which is how dispatcher retry paths are exercised.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::coord::TimestampMs;
use crate::tracker::{DeviceId, TransitionEvent};

use super::{AlertSink, BoxFuture, SinkError, StateSink, StatusUpdate};

/// Consume one pending injected failure, if any.
fn take_failure(pending: &AtomicUsize) -> bool {
    pending
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        .is_ok()
}

/// Device records held in memory with merge-on-write semantics.
#[derive(Debug, Default)]
pub struct MemoryStateSink {
    records: DashMap<DeviceId, Map<String, Value>>,
    writes: AtomicU64,
    pending_failures: AtomicUsize,
}

impl MemoryStateSink {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail with [`SinkError::Unavailable`].
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::Release);
    }

    /// Put a record in place directly, bypassing the write counter.
    pub fn insert_record(&self, device_id: impl Into<DeviceId>, fields: Map<String, Value>) {
        self.records.insert(device_id.into(), fields);
    }

    /// Copy of a device's record.
    pub fn record(&self, device_id: &str) -> Option<Map<String, Value>> {
        self.records.get(device_id).map(|entry| entry.value().clone())
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of devices with a record.
    pub fn device_count(&self) -> usize {
        self.records.len()
    }
}

impl StateSink for MemoryStateSink {
    fn update<'a>(&'a self, update: &'a StatusUpdate) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            if take_failure(&self.pending_failures) {
                return Err(SinkError::Unavailable("injected failure".to_string()));
            }
            let fields = update.clone().into_fields();
            self.records
                .entry(update.device_id.clone())
                .or_default()
                .extend(fields);
            self.writes.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    }
}

/// Alerts held in memory, deduplicated by key.
#[derive(Debug, Default)]
pub struct MemoryAlertSink {
    alerts: DashMap<(DeviceId, TimestampMs), TransitionEvent>,
    attempts: AtomicU64,
    pending_failures: AtomicUsize,
}

impl MemoryAlertSink {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail with [`SinkError::Unavailable`].
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::Release);
    }

    /// Stored alerts ordered by device then timestamp.
    pub fn alerts(&self) -> Vec<TransitionEvent> {
        let mut alerts: Vec<TransitionEvent> =
            self.alerts.iter().map(|entry| entry.value().clone()).collect();
        alerts.sort_by(|a, b| a.alert_key().cmp(&b.alert_key()));
        alerts
    }

    /// Stored alerts for one device, oldest first.
    pub fn alerts_for(&self, device_id: &str) -> Vec<TransitionEvent> {
        self.alerts()
            .into_iter()
            .filter(|event| event.device_id == device_id)
            .collect()
    }

    /// Number of distinct stored alerts.
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Number of write calls, including failed ones and duplicates.
    pub fn attempt_count(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl AlertSink for MemoryAlertSink {
    fn append<'a>(&'a self, event: &'a TransitionEvent) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::Relaxed);
            if take_failure(&self.pending_failures) {
                return Err(SinkError::Unavailable("injected failure".to_string()));
            }
            self.alerts.insert(event.alert_key(), event.clone());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use crate::tracker::ContainmentStatus;

    mod state_sink {
        use super::*;

        #[tokio::test]
        async fn test_update_creates_record() {
            let sink = MemoryStateSink::new();
            let update = StatusUpdate::report("dev", 1.0, 2.0, ContainmentStatus::Inside);
            sink.update(&update).await.unwrap();

            let record = sink.record("dev").unwrap();
            assert_eq!(record["status"], "inside");
            assert_eq!(sink.write_count(), 1);
        }

        #[tokio::test]
        async fn test_update_merges_and_keeps_unrelated_fields() {
            let sink = MemoryStateSink::new();
            let mut existing = Map::new();
            existing.insert("owner".to_string(), Value::from("alice"));
            existing.insert("status".to_string(), Value::from("inside"));
            sink.insert_record("dev", existing);

            let update = StatusUpdate::report("dev", 1.0, 2.0, ContainmentStatus::Outside);
            sink.update(&update).await.unwrap();

            let record = sink.record("dev").unwrap();
            assert_eq!(record["owner"], "alice");
            assert_eq!(record["status"], "outside");
            assert_eq!(record["lat"], 1.0);
        }

        #[tokio::test]
        async fn test_injected_failures() {
            let sink = MemoryStateSink::new();
            sink.fail_next(1);
            let update = StatusUpdate::report("dev", 1.0, 2.0, ContainmentStatus::Inside);

            assert!(matches!(
                sink.update(&update).await,
                Err(SinkError::Unavailable(_))
            ));
            assert!(sink.record("dev").is_none());

            sink.update(&update).await.unwrap();
            assert_eq!(sink.device_count(), 1);
        }
    }

    mod alert_sink {
        use super::*;

        #[tokio::test]
        async fn test_duplicate_append_is_idempotent() {
            let sink = MemoryAlertSink::new();
            let event = TransitionEvent::exit("dev", Coordinate::new(1.0, 1.0), 100);
            sink.append(&event).await.unwrap();
            sink.append(&event).await.unwrap();

            assert_eq!(sink.len(), 1);
            assert_eq!(sink.attempt_count(), 2);
        }

        #[tokio::test]
        async fn test_alerts_sorted_per_device() {
            let sink = MemoryAlertSink::new();
            for (device, ts) in [("b", 5), ("a", 30), ("a", 10)] {
                let event = TransitionEvent::exit(device, Coordinate::new(0.0, 0.0), ts);
                sink.append(&event).await.unwrap();
            }

            let times: Vec<i64> = sink.alerts_for("a").iter().map(|e| e.timestamp_ms).collect();
            assert_eq!(times, vec![10, 30]);
            assert_eq!(sink.alerts()[0].device_id, "a");
        }
    }
}
