//! Connection status state machine.
//!
//! ```text
//!   connecting ──established──▶ connected
//!       │                          │
//!   error/timeout               lost/error
//!       ▼                          ▼
//!   disconnected ◀─────────────────┘
//!       │   ▲
//!     retry └── established (transport reconnect)
//!       ▼
//!   connecting
//! ```
//!
//! Timers are owned by the session controller; this type only records
//! status and the human-readable reason for the last failure.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::SessionError;

pub const TIMEOUT_REASON: &str = "Connection timed out: the server is not responding";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionMachine {
    status: ConnectionStatus,
    error: Option<String>,
}

impl ConnectionMachine {
    /// Starts in `connecting`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// The transport reports an established connection.
    pub fn established(&mut self) {
        self.error = None;
        self.transition(ConnectionStatus::Connected);
    }

    /// The transport dropped an established connection.
    pub fn lost(&mut self, reason: &str) {
        self.fail(format!("Connection lost: {reason}"));
    }

    /// The transport could not connect.
    pub fn failed(&mut self, message: &str) {
        self.fail(format!("Connection error: {message}"));
    }

    /// The connect timeout expired. Only applies while still `connecting`;
    /// returns whether it did.
    pub fn timed_out(&mut self) -> bool {
        if self.status != ConnectionStatus::Connecting {
            return false;
        }
        warn!("Connection attempt timed out");
        self.fail(TIMEOUT_REASON.to_string());
        true
    }

    /// User-initiated retry. Refused while connected.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        if self.status == ConnectionStatus::Connected {
            return Err(SessionError::AlreadyConnected);
        }
        self.reset();
        Ok(())
    }

    /// Back to `connecting` with no error, as after leaving a session.
    pub fn reset(&mut self) {
        self.error = None;
        self.transition(ConnectionStatus::Connecting);
    }

    fn fail(&mut self, reason: String) {
        warn!(reason = %reason, "Connection failure");
        self.error = Some(reason);
        self.transition(ConnectionStatus::Disconnected);
    }

    fn transition(&mut self, next: ConnectionStatus) {
        if self.status != next {
            info!(from = %self.status, to = %next, "Connection status changed");
            self.status = next;
        }
    }
}
