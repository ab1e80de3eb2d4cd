//! Events exchanged with the chat server.
//!
//! Frames are JSON objects of the form `{"event": <name>, "data": <payload>}`
//! using the server's socket event names.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::types::{LocalIdentity, Message, OutgoingMessage, User};

/// Everything the transport can deliver to the client, including its own
/// connection lifecycle signals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum InboundEvent {
    /// The connection is established.
    #[serde(rename = "connect")]
    Connected,

    /// The connection dropped; carries the transport's reason.
    #[serde(rename = "disconnect")]
    Disconnected(String),

    /// The connection could not be established.
    #[serde(rename = "connect_error")]
    ConnectError(ErrorNotice),

    /// Message history snapshot.
    #[serde(rename = "recentMessages")]
    RecentMessages(Vec<Message>),

    /// Join acknowledgment bundled with the roster and history.
    #[serde(rename = "joinSuccess")]
    JoinSuccess(JoinAck),

    /// Full roster replacement.
    #[serde(rename = "onlineUsers")]
    OnlineUsers(Vec<User>),

    /// Full roster replacement under the alternate event name.
    #[serde(rename = "usersUpdate")]
    UsersUpdate(Vec<User>),

    #[serde(rename = "newMessage")]
    NewMessage(Message),

    #[serde(rename = "userJoined")]
    UserJoined(RosterChange),

    #[serde(rename = "userLeft")]
    UserLeft(RosterChange),

    #[serde(rename = "userTyping")]
    UserTyping(TypingNotice),

    /// Server-side error; never fatal to the session.
    #[serde(rename = "error")]
    Error(ErrorNotice),
}

/// Payload-free discriminant of [`InboundEvent`], used to decide which
/// events a client currently listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundKind {
    Connected,
    Disconnected,
    ConnectError,
    RecentMessages,
    JoinSuccess,
    OnlineUsers,
    UsersUpdate,
    NewMessage,
    UserJoined,
    UserLeft,
    UserTyping,
    Error,
}

impl InboundKind {
    /// Kinds that only matter while a chat session is mounted.
    pub const CHAT: &'static [InboundKind] = &[
        InboundKind::RecentMessages,
        InboundKind::JoinSuccess,
        InboundKind::OnlineUsers,
        InboundKind::UsersUpdate,
        InboundKind::NewMessage,
        InboundKind::UserJoined,
        InboundKind::UserLeft,
        InboundKind::UserTyping,
        InboundKind::Error,
    ];

    /// Connection lifecycle signals, listened to for the whole client lifetime.
    pub fn is_lifecycle(self) -> bool {
        matches!(
            self,
            InboundKind::Connected | InboundKind::Disconnected | InboundKind::ConnectError
        )
    }

    /// Wire name of the event.
    pub fn as_str(self) -> &'static str {
        match self {
            InboundKind::Connected => "connect",
            InboundKind::Disconnected => "disconnect",
            InboundKind::ConnectError => "connect_error",
            InboundKind::RecentMessages => "recentMessages",
            InboundKind::JoinSuccess => "joinSuccess",
            InboundKind::OnlineUsers => "onlineUsers",
            InboundKind::UsersUpdate => "usersUpdate",
            InboundKind::NewMessage => "newMessage",
            InboundKind::UserJoined => "userJoined",
            InboundKind::UserLeft => "userLeft",
            InboundKind::UserTyping => "userTyping",
            InboundKind::Error => "error",
        }
    }
}

impl std::fmt::Display for InboundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorNotice {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinAck {
    pub user: User,
    pub online_users: Vec<User>,
    pub recent_messages: Vec<Message>,
}

/// A user entering or leaving, together with the complete resulting roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RosterChange {
    pub user: User,
    pub online_users: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    pub user: User,
    pub is_typing: bool,
}

impl InboundEvent {
    pub fn kind(&self) -> InboundKind {
        match self {
            InboundEvent::Connected => InboundKind::Connected,
            InboundEvent::Disconnected(_) => InboundKind::Disconnected,
            InboundEvent::ConnectError(_) => InboundKind::ConnectError,
            InboundEvent::RecentMessages(_) => InboundKind::RecentMessages,
            InboundEvent::JoinSuccess(_) => InboundKind::JoinSuccess,
            InboundEvent::OnlineUsers(_) => InboundKind::OnlineUsers,
            InboundEvent::UsersUpdate(_) => InboundKind::UsersUpdate,
            InboundEvent::NewMessage(_) => InboundKind::NewMessage,
            InboundEvent::UserJoined(_) => InboundKind::UserJoined,
            InboundEvent::UserLeft(_) => InboundKind::UserLeft,
            InboundEvent::UserTyping(_) => InboundKind::UserTyping,
            InboundEvent::Error(_) => InboundKind::Error,
        }
    }

    pub fn from_json(frame: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(frame)?)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Events the client emits to the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    Join(LocalIdentity),
    SendMessage(OutgoingMessage),
    Typing(TypingPulse),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypingPulse {
    pub user: LocalIdentity,
    pub is_typing: bool,
}

impl OutboundEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::Join(_) => "join",
            OutboundEvent::SendMessage(_) => "sendMessage",
            OutboundEvent::Typing(_) => "typing",
        }
    }

    pub fn from_json(frame: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(frame)?)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_frame_shape() {
        let event = OutboundEvent::Join(LocalIdentity {
            username: "Ana".into(),
            avatar: "🚀".into(),
        });
        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"event": "join", "data": {"username": "Ana", "avatar": "🚀"}})
        );
    }

    #[test]
    fn test_typing_frame_uses_camel_case() {
        let event = OutboundEvent::Typing(TypingPulse {
            user: LocalIdentity {
                username: "Bo".into(),
                avatar: "🎵".into(),
            },
            is_typing: false,
        });
        let json = event.to_json().unwrap();
        assert!(json.contains(r#""event":"typing""#));
        assert!(json.contains(r#""isTyping":false"#));
    }

    #[test]
    fn test_decode_lifecycle_events() {
        let connected = InboundEvent::from_json(r#"{"event":"connect"}"#).unwrap();
        assert_eq!(connected, InboundEvent::Connected);

        let lost = InboundEvent::from_json(r#"{"event":"disconnect","data":"transport close"}"#)
            .unwrap();
        assert_eq!(lost, InboundEvent::Disconnected("transport close".into()));
        assert_eq!(lost.kind(), InboundKind::Disconnected);
        assert!(lost.kind().is_lifecycle());
    }

    #[test]
    fn test_decode_roster_variants() {
        let roster = r#"[{"id":"u1","username":"Ana","avatar":"🚀","isOnline":true}]"#;
        let a = InboundEvent::from_json(&format!(r#"{{"event":"onlineUsers","data":{roster}}}"#))
            .unwrap();
        let b = InboundEvent::from_json(&format!(r#"{{"event":"usersUpdate","data":{roster}}}"#))
            .unwrap();

        match (a, b) {
            (InboundEvent::OnlineUsers(x), InboundEvent::UsersUpdate(y)) => assert_eq!(x, y),
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn test_decode_join_ack() {
        let frame = r#"{
            "event": "joinSuccess",
            "data": {
                "user": {"id": "u1", "username": "Ana", "avatar": "🚀"},
                "onlineUsers": [{"id": "u1", "username": "Ana", "avatar": "🚀"}],
                "recentMessages": [{
                    "id": "m1",
                    "content": "hola",
                    "type": "text",
                    "userId": "u1",
                    "user": {"id": "u1", "username": "Ana", "avatar": "🚀"},
                    "createdAt": "2024-05-01T10:00:00Z"
                }]
            }
        }"#;

        let InboundEvent::JoinSuccess(ack) = InboundEvent::from_json(frame).unwrap() else {
            panic!("expected joinSuccess");
        };
        assert_eq!(ack.user.username, "Ana");
        assert_eq!(ack.online_users.len(), 1);
        assert_eq!(ack.recent_messages[0].content, "hola");
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert!(InboundEvent::from_json(r#"{"event":"reaction","data":{}}"#).is_err());
    }
}
