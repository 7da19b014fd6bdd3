//! Error types for the sniffer and its collaborators

use thiserror::Error;

/// Fatal sniffer errors: the only class that aborts startup or a run.
#[derive(Error, Debug)]
pub enum SnifferError {
    #[error("link-layer type {found} is not radiotap 802.11 (expected {expected}); is the interface in monitor mode?")]
    WrongLinkType { found: i32, expected: i32 },

    #[error("capture source failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("sniffer has already run; create a new one")]
    AlreadyStarted,
}

/// Errors reported by a capture source
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The source has no more frames (end of file, handle closed).
    #[error("capture closed")]
    Closed,

    #[error("{0}")]
    Source(String),
}

/// Channel hopping config fetch failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config fetch timed out")]
    Timeout,

    #[error("config source unreachable: {0}")]
    Unreachable(String),

    #[error("config payload malformed")]
    Malformed,
}

/// Radio channel tuning failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RadioError {
    #[error("channel {0} is not a valid channel")]
    InvalidChannel(u8),

    #[error("channel command failed: {0}")]
    Command(String),
}

/// Sink delivery failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("sink delivery failed: {0}")]
    Delivery(String),
}

/// Result type alias for sniffer operations
pub type Result<T> = std::result::Result<T, SnifferError>;
