//! Client configuration loaded from environment variables.
//!
//! Every setting has a default, so a client can start with nothing but a
//! server URL.

use std::time::Duration;

use parley_shared::constants::{
    ALLOWED_MIME_TYPES, CONNECT_TIMEOUT_MS, DISCONNECT_GRACE_MS, MAX_UPLOAD_SIZE,
    MAX_USERNAME_LEN, RECONNECT_ATTEMPTS, RECONNECT_DELAY_MS, RELOAD_DELAY_MS,
    TYPING_DEBOUNCE_MS,
};
use parley_shared::UploadPolicy;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Chat server endpoint handed to the transport.
    /// Env: `PARLEY_SERVER_URL`
    pub server_url: String,

    /// How long to wait in `connecting` before declaring the server unreachable.
    /// Env: `PARLEY_CONNECT_TIMEOUT_MS`
    pub connect_timeout: Duration,

    /// Reconnection attempts the transport makes by itself after a drop.
    /// Env: `PARLEY_RECONNECT_ATTEMPTS`
    pub reconnect_attempts: u32,

    /// Delay between transport reconnection attempts.
    /// Env: `PARLEY_RECONNECT_DELAY_MS`
    pub reconnect_delay: Duration,

    /// How long a joined session survives a lost connection.
    /// Env: `PARLEY_DISCONNECT_GRACE_MS`
    pub disconnect_grace: Duration,

    /// Quiet period after the last keystroke before "stopped typing" is sent.
    /// Env: `PARLEY_TYPING_DEBOUNCE_MS`
    pub typing_debounce: Duration,

    /// Delay between leaving and rebuilding the client state.
    pub reload_delay: Duration,

    /// Maximum attachment size in bytes.
    /// Env: `PARLEY_MAX_UPLOAD_SIZE`
    pub max_upload_size: u64,

    /// MIME types accepted for attachments.
    pub allowed_mime_types: Vec<String>,

    /// Maximum username length in characters.
    pub max_username_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            connect_timeout: Duration::from_millis(CONNECT_TIMEOUT_MS),
            reconnect_attempts: RECONNECT_ATTEMPTS,
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
            disconnect_grace: Duration::from_millis(DISCONNECT_GRACE_MS),
            typing_debounce: Duration::from_millis(TYPING_DEBOUNCE_MS),
            reload_delay: Duration::from_millis(RELOAD_DELAY_MS),
            max_upload_size: MAX_UPLOAD_SIZE,
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            max_username_len: MAX_USERNAME_LEN,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("PARLEY_SERVER_URL") {
            config.server_url = url;
        }

        if let Some(ms) = parse_env::<u64>("PARLEY_CONNECT_TIMEOUT_MS") {
            config.connect_timeout = Duration::from_millis(ms);
        }

        if let Some(n) = parse_env::<u32>("PARLEY_RECONNECT_ATTEMPTS") {
            config.reconnect_attempts = n;
        }

        if let Some(ms) = parse_env::<u64>("PARLEY_RECONNECT_DELAY_MS") {
            config.reconnect_delay = Duration::from_millis(ms);
        }

        if let Some(ms) = parse_env::<u64>("PARLEY_DISCONNECT_GRACE_MS") {
            config.disconnect_grace = Duration::from_millis(ms);
        }

        if let Some(ms) = parse_env::<u64>("PARLEY_TYPING_DEBOUNCE_MS") {
            config.typing_debounce = Duration::from_millis(ms);
        }

        if let Some(bytes) = parse_env::<u64>("PARLEY_MAX_UPLOAD_SIZE") {
            config.max_upload_size = bytes;
        }

        config
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_size: self.max_upload_size,
            allowed_mime_types: self.allowed_mime_types.clone(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Invalid value, using default");
            None
        }
    }
}
