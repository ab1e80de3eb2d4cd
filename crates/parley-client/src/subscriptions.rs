//! Which inbound events the session currently listens to.
//!
//! Lifecycle signals are always heard. Chat events are heard only while
//! the chat listeners are attached, between a join and the end of that
//! session; anything else is dropped on arrival.

use std::collections::HashSet;

use parley_shared::InboundKind;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Subscriptions {
    chat: HashSet<InboundKind>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach_chat(&mut self) {
        self.chat.extend(InboundKind::CHAT.iter().copied());
        debug!(count = self.chat.len(), "Chat listeners attached");
    }

    /// Detach every chat listener. Returns how many were released.
    pub fn release(&mut self) -> usize {
        let released = self.chat.len();
        self.chat.clear();
        if released > 0 {
            debug!(released, "Chat listeners released");
        }
        released
    }

    pub fn is_attached(&self) -> bool {
        !self.chat.is_empty()
    }

    pub fn accepts(&self, kind: InboundKind) -> bool {
        kind.is_lifecycle() || self.chat.contains(&kind)
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_always_accepted() {
        let subs = Subscriptions::new();
        assert!(subs.accepts(InboundKind::Connected));
        assert!(subs.accepts(InboundKind::Disconnected));
        assert!(!subs.accepts(InboundKind::NewMessage));
    }

    #[test]
    fn test_attach_and_release() {
        let mut subs = Subscriptions::new();
        subs.attach_chat();
        assert!(subs.is_attached());
        assert!(subs.accepts(InboundKind::UsersUpdate));
        assert!(subs.accepts(InboundKind::OnlineUsers));

        assert_eq!(subs.release(), InboundKind::CHAT.len());
        assert!(!subs.accepts(InboundKind::UserTyping));
        assert_eq!(subs.release(), 0);
    }
}
