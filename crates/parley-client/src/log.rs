//! Message log in server delivery order.
//!
//! Timestamps come from client clocks and are never used for ordering.

use parley_shared::Message;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    replacements: u32,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in the history delivered by the join handshake.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.replacements += 1;
        if self.replacements > 1 {
            debug!(replacements = self.replacements, "History replaced again");
        }
        debug!(count = messages.len(), "Message history loaded");
        self.messages = messages;
    }

    pub fn append(&mut self, message: Message) {
        debug!(msg_id = %message.id, user = %message.user.username, "Message appended");
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.replacements = 0;
    }
}
