//! # parley-shared
//!
//! Domain and wire types shared by every Parley client front-end: users,
//! messages, the server event protocol, attachment policy, and the policy
//! constants the session core honors.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;
pub mod upload;

pub use error::{ProtocolError, ValidationError};
pub use protocol::{InboundEvent, InboundKind, OutboundEvent};
pub use types::{FileInfo, LocalIdentity, Message, MessageKind, OutgoingMessage, User, UserId};
pub use upload::{format_file_size, Attachment, UploadPolicy};
