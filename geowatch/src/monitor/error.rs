//! Monitor error types.

use thiserror::Error;

/// Errors returned by [`super::MonitorHandle`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    /// The daemon has stopped and no longer accepts commands.
    #[error("Monitor is not running")]
    NotRunning,

    /// The daemon stopped before answering a query.
    #[error("Monitor dropped the reply")]
    ReplyDropped,
}
