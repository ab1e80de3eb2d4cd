use parley_shared::{LocalIdentity, Message, User};
use serde::Serialize;

use crate::connection::ConnectionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A transient, dismissable notification for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
            icon: None,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
            icon: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }
}

/// Read-only view of the session, published after every handled event.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: ConnectionStatus,
    pub error: Option<String>,
    pub identity: Option<LocalIdentity>,
    pub local_user: Option<User>,
    pub online_users: Vec<User>,
    pub typing_users: Vec<User>,
    pub typing_summary: Option<String>,
    pub messages: Vec<Message>,
}

impl SessionSnapshot {
    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }
}
