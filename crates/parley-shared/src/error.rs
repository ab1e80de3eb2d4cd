use thiserror::Error;

/// Failures encoding or decoding a wire frame.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Input rejected locally, before anything reaches the transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("Username is too long: {len} characters (max {max})")]
    UsernameTooLong { len: usize, max: usize },

    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("File is too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("File type not allowed: {0}")]
    FileTypeNotAllowed(String),
}

impl ValidationError {
    /// Whether the rejection concerns an attachment. Those are reported to
    /// the user as a notice; the others are gated by the input form.
    pub fn is_attachment_error(&self) -> bool {
        matches!(
            self,
            ValidationError::FileTooLarge { .. } | ValidationError::FileTypeNotAllowed(_)
        )
    }
}
