use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned user id, unique per connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A chat participant as the server describes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub avatar: String,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_id: Option<String>,
}

/// The name and avatar the local user joins with. The server assigns the
/// id; until the join is acknowledged this is all the client knows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalIdentity {
    pub username: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    File,
    Image,
}

/// A chat message. The embedded `user` is a snapshot taken when the
/// message was created; it does not follow later profile changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Attachment metadata carried by an outgoing message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileInfo {
    pub filename: String,
    pub originalname: String,
    pub size: u64,
    pub mimetype: String,
    pub url: String,
}

/// The envelope handed to the transport when the local user sends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutgoingMessage {
    pub text: String,
    pub user: LocalIdentity,
    pub timestamp: DateTime<Utc>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileInfo>,
}

impl OutgoingMessage {
    /// Build an envelope stamped at `timestamp`. The id is the username
    /// followed by the timestamp in milliseconds.
    pub fn new(
        text: impl Into<String>,
        user: LocalIdentity,
        timestamp: DateTime<Utc>,
        file: Option<FileInfo>,
    ) -> Self {
        let id = format!("{}-{}", user.username, timestamp.timestamp_millis());
        Self {
            text: text.into(),
            user,
            timestamp,
            id,
            file,
        }
    }
}
