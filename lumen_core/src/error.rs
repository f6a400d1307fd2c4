use thiserror::Error;

/// Failure talking to the gateway. Transient; counted by the resilience counter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("gateway timed out")]
    Timeout,
    #[error("gateway unreachable: {0}")]
    Unreachable(String),
    #[error("malformed gateway payload: {0}")]
    Payload(String),
    #[error("transport error: {0}")]
    Other(String),
}

/// Failure of one sink's write. Never aborts siblings or the poll cycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("sink {sink} failed: {message}")]
pub struct SinkError {
    pub sink: String,
    pub message: String,
}

#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    /// Caller broke a precondition (e.g. percentile of an empty sample).
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("history store error: {0}")]
    Store(String),
    /// Terminal: the failure threshold was reached and the alert has been sent.
    #[error("escalated after {failures} consecutive transport failures: {last_error}")]
    Escalated {
        failures: u32,
        last_error: TransportError,
    },
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing transport")]
    MissingTransport,
    #[error("missing notifier")]
    MissingNotifier,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
