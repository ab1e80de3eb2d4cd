/// Time allowed for the first connection before giving up, in milliseconds
pub const CONNECT_TIMEOUT_MS: u64 = 8_000;

/// Reconnection attempts the transport makes on its own after a drop
pub const RECONNECT_ATTEMPTS: u32 = 2;

/// Delay between transport reconnection attempts, in milliseconds
pub const RECONNECT_DELAY_MS: u64 = 500;

/// How long a joined session survives a lost connection, in milliseconds
pub const DISCONNECT_GRACE_MS: u64 = 5_000;

/// Quiet period after the last keystroke before "stopped typing" is sent
pub const TYPING_DEBOUNCE_MS: u64 = 1_000;

/// Delay between leaving and rebuilding the client state, in milliseconds
pub const RELOAD_DELAY_MS: u64 = 1_000;

/// Maximum attachment size in bytes (10 MiB)
pub const MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// MIME types accepted for attachments
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "application/pdf",
    "text/plain",
];

/// Maximum username length in characters
pub const MAX_USERNAME_LEN: usize = 20;

/// Avatar used when the caller does not pick one
pub const DEFAULT_AVATAR: &str = "👤";
