//! Outbound ports for device status and exit alerts.
//!
//! The monitor never talks to a sink directly. It pushes [`Outbound`]
//! messages into an unbounded channel and carries on; a [`SinkDispatcher`]
//! task drains that channel and performs the (possibly slow, possibly
//! failing) writes. A failed write is logged and counted. It never rewinds
//! the monitor's state.
//!
//! ```text
//! GeofenceMonitor ──Outbound──► SinkDispatcher ──► StateSink  (merge update)
//!                  (unbounded)   (retry, log)  └──► AlertSink  (keyed append)
//! ```
//!
//! # Implementations
//!
//! - [`MemoryStateSink`] / [`MemoryAlertSink`]: in-process stores with the
//!   same merge and idempotency rules a remote backend must follow
//! - [`TracingSink`]: writes every update and alert to the log

mod dispatcher;
mod memory;
mod tracing_sink;
mod traits;

pub use dispatcher::{
    outbound_channel, DispatcherConfig, Outbound, OutboundReceiver, OutboundSender,
    SinkDispatcher, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BACKOFF,
};
pub use memory::{MemoryAlertSink, MemoryStateSink};
pub use tracing_sink::TracingSink;
pub use traits::{AlertSink, BoxFuture, SinkError, StateSink, StatusUpdate};
