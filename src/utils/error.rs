//! The `error` module defines the typed errors used within `quotehub`.
//!
//! Protocol errors are answered to the offending connection, transport errors
//! end in deregistration, and server errors surface to the binary.

use thiserror::Error;

/// Why a frame could not be queued for a connection.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendFailure {
    /// The writer task has exited; the socket is gone.
    #[error("connection closed")]
    Closed,

    /// The client stopped reading and its outbound queue is full.
    #[error("send queue full")]
    QueueFull,
}

/// The dispatch primitive could not hand a frame to a connection.
///
/// Either way the connection is no longer worth writing to and must be
/// deregistered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("send to {connection_id} failed: {cause}")]
pub struct SendFailed {
    pub connection_id: String,
    pub cause: SendFailure,
}

/// An inbound client frame that could not be turned into a control message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Not JSON, not an object, or missing/mistyped `action` or `symbols`.
    /// Carries the action when it could be read.
    #[error("invalid format")]
    InvalidFormat(Option<String>),

    /// Well-formed, but the action is neither `subscribe` nor `unsubscribe`.
    #[error("unsupported action: {0}")]
    UnsupportedAction(String),
}

impl FrameError {
    /// The offending action, if the frame got far enough to name one.
    pub fn action(&self) -> Option<&str> {
        match self {
            Self::InvalidFormat(action) => action.as_deref(),
            Self::UnsupportedAction(action) => Some(action),
        }
    }
}

/// A connection the registry refused to take.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error("connection limit reached")]
    LimitReached,

    #[error("connection {0} is already registered")]
    Duplicate(String),

    /// Registered, but the welcome could not be queued; already removed again.
    #[error(transparent)]
    Unreachable(#[from] SendFailed),
}

/// Failures of the WebSocket server itself.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to accept connection: {0}")]
    Accept(#[from] std::io::Error),
}
