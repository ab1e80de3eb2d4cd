//! Online roster.
//!
//! The server ships the complete roster with every presence-affecting
//! event, so the set is only ever replaced wholesale, never patched.

use std::collections::HashSet;
use std::hash::Hash;

use parley_shared::{User, UserId};
use tracing::debug;

/// Collapse duplicate keys, keeping the last occurrence of each key at the
/// position of that last occurrence.
pub fn dedup_last_wins<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::with_capacity(items.len());
    let mut kept: Vec<T> = items
        .into_iter()
        .rev()
        .filter(|item| seen.insert(key(item)))
        .collect();
    kept.reverse();
    kept
}

/// Deduplicated set of online users.
#[derive(Debug, Clone, Default)]
pub struct PresenceSet {
    users: Vec<User>,
}

impl PresenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster with `users`, one entry per id.
    pub fn replace(&mut self, users: Vec<User>) {
        let received = users.len();
        self.users = dedup_last_wins(users, |u| u.id.clone());

        debug!(
            received,
            online = self.users.len(),
            "Roster replaced"
        );
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn get(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::user;

    #[test]
    fn test_replace_collapses_duplicate_ids() {
        let mut presence = PresenceSet::new();
        presence.replace(vec![
            user("u1", "Ana"),
            user("u2", "Bo"),
            user("u1", "Ana2"),
            user("u3", "Cy"),
            user("u2", "Bo"),
        ]);

        let ids: Vec<&str> = presence.users().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u3", "u2"]);
        assert_eq!(presence.get(&UserId::from("u1")).unwrap().username, "Ana2");
    }

    #[test]
    fn test_one_entry_per_distinct_id() {
        let mut presence = PresenceSet::new();
        let input: Vec<User> = (0..50)
            .map(|i| user(&format!("u{}", i % 7), &format!("name{i}")))
            .collect();
        presence.replace(input);

        assert_eq!(presence.len(), 7);
        let distinct: HashSet<_> = presence.users().iter().map(|u| u.id.clone()).collect();
        assert_eq!(distinct.len(), presence.len());
    }

    #[test]
    fn test_empty_roster() {
        let mut presence = PresenceSet::new();
        presence.replace(vec![user("u1", "Ana")]);
        presence.replace(Vec::new());
        assert!(presence.is_empty());
        assert!(!presence.contains(&UserId::from("u1")));
    }

    #[test]
    fn test_dedup_last_wins_keeps_unique_order() {
        let out = dedup_last_wins(vec![3, 1, 2], |n| *n);
        assert_eq!(out, vec![3, 1, 2]);
    }
}
