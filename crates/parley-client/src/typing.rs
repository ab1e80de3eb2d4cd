//! Remote users currently composing a message.

use parley_shared::{User, UserId};
use tracing::debug;

/// Transient set of typing users, keyed by id, in the order they started.
#[derive(Debug, Clone, Default)]
pub struct TypingTracker {
    users: Vec<User>,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag or unflag `user`. Idempotent in both directions.
    ///
    /// Returns whether the set changed.
    pub fn set_typing(&mut self, user: User, is_typing: bool) -> bool {
        let position = self.users.iter().position(|u| u.id == user.id);

        let changed = match (is_typing, position) {
            (true, None) => {
                self.users.push(user.clone());
                true
            }
            (false, Some(idx)) => {
                self.users.remove(idx);
                true
            }
            _ => false,
        };

        if changed {
            debug!(user = %user.id, is_typing, typing = self.users.len(), "Typing set changed");
        }
        changed
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn is_typing(&self, id: &UserId) -> bool {
        self.users.iter().any(|u| &u.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }

    /// One-line description for a typing indicator, `None` when nobody types.
    pub fn summary(&self) -> Option<String> {
        match self.users.as_slice() {
            [] => None,
            [a] => Some(format!("{} is typing", a.username)),
            [a, b] => Some(format!("{} and {} are typing", a.username, b.username)),
            many => Some(format!("{} users are typing", many.len())),
        }
    }
}
