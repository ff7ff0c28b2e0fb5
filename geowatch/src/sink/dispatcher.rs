//! Delivery of outbound writes off the monitor task.
//!
//! The dispatcher owns the receiving end of the outbound channel and writes
//! each message to its sink in arrival order. Retries re-send the identical
//! message; they never ask the monitor to regenerate anything.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::telemetry::MonitorMetrics;
use crate::tracker::TransitionEvent;

use super::{AlertSink, SinkError, StateSink, StatusUpdate};

/// Default number of extra attempts after a failed write.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 1;

/// Default delay before the first retry; doubles on each further retry.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// A write produced by the monitor.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Partial update for the state sink.
    Status(StatusUpdate),
    /// Exit alert for the alert sink.
    Alert(TransitionEvent),
}

impl Outbound {
    fn device_id(&self) -> &str {
        match self {
            Outbound::Status(update) => &update.device_id,
            Outbound::Alert(event) => &event.device_id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Outbound::Status(_) => "status",
            Outbound::Alert(_) => "alert",
        }
    }
}

/// Sending half held by the monitor.
pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// Receiving half consumed by the dispatcher.
pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Create the monitor → dispatcher channel.
///
/// Unbounded so that the monitor never waits on a slow sink.
pub fn outbound_channel() -> (OutboundSender, OutboundReceiver) {
    mpsc::unbounded_channel()
}

/// Retry settings for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Extra attempts after the first failure (0 disables retry).
    pub retry_attempts: u32,
    /// Delay before the first retry.
    pub retry_backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

/// Drains the outbound channel into the state and alert sinks.
pub struct SinkDispatcher {
    state_sink: Arc<dyn StateSink>,
    alert_sink: Arc<dyn AlertSink>,
    config: DispatcherConfig,
    metrics: Arc<MonitorMetrics>,
}

impl std::fmt::Debug for SinkDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkDispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SinkDispatcher {
    /// Create a dispatcher over the given sinks.
    pub fn new(
        state_sink: Arc<dyn StateSink>,
        alert_sink: Arc<dyn AlertSink>,
        config: DispatcherConfig,
        metrics: Arc<MonitorMetrics>,
    ) -> Self {
        Self {
            state_sink,
            alert_sink,
            config,
            metrics,
        }
    }

    /// Deliver messages until the channel closes or shutdown is signalled.
    ///
    /// On shutdown, messages already queued are still delivered before
    /// returning.
    pub async fn run(self, mut outbound_rx: OutboundReceiver, shutdown: CancellationToken) {
        debug!("Sink dispatcher starting");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    let mut drained = 0usize;
                    while let Ok(message) = outbound_rx.try_recv() {
                        self.deliver(&message).await;
                        drained += 1;
                    }
                    info!(drained, "Sink dispatcher shutting down");
                    break;
                }

                message = outbound_rx.recv() => {
                    match message {
                        Some(message) => {
                            self.deliver(&message).await;
                        }
                        None => {
                            debug!("Outbound channel closed");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Write one message, retrying per configuration.
    ///
    /// Returns the last error if every attempt failed. The failure is also
    /// logged and counted, so callers may ignore the result.
    pub async fn deliver(&self, message: &Outbound) -> Result<(), SinkError> {
        let mut backoff = self.config.retry_backoff;
        let mut attempt = 0u32;

        loop {
            match self.write_once(message).await {
                Ok(()) => {
                    self.metrics.sink_delivered();
                    return Ok(());
                }
                Err(e) if attempt < self.config.retry_attempts => {
                    attempt += 1;
                    self.metrics.sink_retried();
                    debug!(
                        device_id = message.device_id(),
                        kind = message.kind(),
                        attempt,
                        error = %e,
                        "Sink write failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
                Err(e) => {
                    self.metrics.sink_failed();
                    warn!(
                        device_id = message.device_id(),
                        kind = message.kind(),
                        attempts = attempt + 1,
                        error = %e,
                        "Sink write failed"
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn write_once(&self, message: &Outbound) -> Result<(), SinkError> {
        match message {
            Outbound::Status(update) => self.state_sink.update(update).await,
            Outbound::Alert(event) => self.alert_sink.append(event).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use crate::sink::{MemoryAlertSink, MemoryStateSink};
    use crate::tracker::ContainmentStatus;

    struct Fixture {
        state: Arc<MemoryStateSink>,
        alerts: Arc<MemoryAlertSink>,
        metrics: Arc<MonitorMetrics>,
        dispatcher: SinkDispatcher,
    }

    fn fixture(retry_attempts: u32) -> Fixture {
        let state = Arc::new(MemoryStateSink::new());
        let alerts = Arc::new(MemoryAlertSink::new());
        let metrics = Arc::new(MonitorMetrics::new());
        let dispatcher = SinkDispatcher::new(
            Arc::clone(&state) as Arc<dyn StateSink>,
            Arc::clone(&alerts) as Arc<dyn AlertSink>,
            DispatcherConfig {
                retry_attempts,
                retry_backoff: Duration::from_millis(1),
            },
            Arc::clone(&metrics),
        );
        Fixture {
            state,
            alerts,
            metrics,
            dispatcher,
        }
    }

    fn status() -> Outbound {
        Outbound::Status(StatusUpdate::report(
            "dev",
            1.0,
            2.0,
            ContainmentStatus::Inside,
        ))
    }

    fn alert(ts: i64) -> Outbound {
        Outbound::Alert(TransitionEvent::exit("dev", Coordinate::new(1.0, 2.0), ts))
    }

    #[tokio::test]
    async fn test_routes_to_matching_sink() {
        let f = fixture(0);
        f.dispatcher.deliver(&status()).await.unwrap();
        f.dispatcher.deliver(&alert(100)).await.unwrap();

        assert_eq!(f.state.write_count(), 1);
        assert_eq!(f.alerts.len(), 1);
        assert_eq!(f.metrics.snapshot().sink_deliveries, 2);
    }

    #[tokio::test]
    async fn test_failure_without_retry_is_dropped() {
        let f = fixture(0);
        f.state.fail_next(1);

        assert!(f.dispatcher.deliver(&status()).await.is_err());
        assert_eq!(f.state.write_count(), 0);

        let snapshot = f.metrics.snapshot();
        assert_eq!(snapshot.sink_failures, 1);
        assert_eq!(snapshot.sink_retries, 0);
    }

    #[tokio::test]
    async fn test_retry_resends_same_alert_once_stored() {
        let f = fixture(2);
        f.alerts.fail_next(2);

        f.dispatcher.deliver(&alert(100)).await.unwrap();

        assert_eq!(f.alerts.attempt_count(), 3);
        assert_eq!(f.alerts.len(), 1);
        assert_eq!(f.alerts.alerts()[0].timestamp_ms, 100);
        assert_eq!(f.metrics.snapshot().sink_retries, 2);
    }

    #[tokio::test]
    async fn test_run_delivers_in_order_until_channel_closes() {
        let f = fixture(0);
        let (tx, rx) = outbound_channel();
        tx.send(alert(1)).unwrap();
        tx.send(status()).unwrap();
        tx.send(alert(2)).unwrap();
        drop(tx);

        let Fixture {
            state,
            alerts,
            dispatcher,
            ..
        } = f;
        dispatcher.run(rx, CancellationToken::new()).await;

        assert_eq!(alerts.len(), 2);
        assert_eq!(state.write_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_messages() {
        let f = fixture(0);
        let (tx, rx) = outbound_channel();
        tx.send(alert(1)).unwrap();
        tx.send(alert(2)).unwrap();

        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let Fixture {
            alerts, dispatcher, ..
        } = f;
        dispatcher.run(rx, shutdown).await;

        assert_eq!(alerts.len(), 2);
        drop(tx);
    }
}
