use parley_shared::ValidationError;
use thiserror::Error;

/// Failures handing an event to the transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Transport command channel closed")]
    ChannelClosed,

    #[error("Transport command channel full")]
    Backpressure,

    #[error("No transport is open")]
    NotOpen,
}

/// Reasons a session operation was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Not connected to the chat server")]
    NotConnected,

    #[error("No active session")]
    NotJoined,

    #[error("Already joined as {0}")]
    AlreadyJoined(String),

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Session task has stopped")]
    Closed,
}
