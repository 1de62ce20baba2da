//! Last-request-wins bookkeeping for catalog searches.
//!
//! Every search call takes a ticket before hitting the upstream. When the response arrives, the
//! ticket is checked again; a newer ticket for the same caller means the result is stale and must
//! be dropped.

use dashmap::DashMap;

/// Position of one search call in its caller's sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    user_id: String,
    sequence: u64,
}

/// Latest ticket number issued per user.
#[derive(Default)]
pub struct SearchSequencer {
    latest: DashMap<String, u64>,
}

impl SearchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next ticket for `user_id`, superseding earlier ones.
    pub fn issue(&self, user_id: &str) -> SearchTicket {
        let mut entry = self.latest.entry(user_id.to_owned()).or_insert(0);
        *entry += 1;
        SearchTicket {
            user_id: user_id.to_owned(),
            sequence: *entry,
        }
    }

    /// Whether no newer ticket was issued since `ticket`.
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        self.latest
            .get(&ticket.user_id)
            .is_some_and(|latest| *latest == ticket.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older_one() {
        let searches = SearchSequencer::new();
        let first = searches.issue("u1");
        let second = searches.issue("u1");

        assert!(!searches.is_current(&first));
        assert!(searches.is_current(&second));
    }

    #[test]
    fn callers_do_not_supersede_each_other() {
        let searches = SearchSequencer::new();
        let alice = searches.issue("alice");
        let _bob = searches.issue("bob");
        assert!(searches.is_current(&alice));
    }
}
