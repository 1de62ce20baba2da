use dashmap::DashMap;
use uuid::Uuid;

/// Authenticated caller resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: String,
    pub token: String,
}

/// Bearer tokens issued by `POST /auth/session`, keyed by token.
#[derive(Default)]
pub struct SessionRegistry {
    tokens: DashMap<String, String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh opaque token bound to `user_id`.
    pub fn issue(&self, user_id: &str) -> SessionContext {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), user_id.to_owned());
        SessionContext {
            user_id: user_id.to_owned(),
            token,
        }
    }

    pub fn resolve(&self, token: &str) -> Option<SessionContext> {
        self.tokens.get(token).map(|entry| SessionContext {
            user_id: entry.value().clone(),
            token: token.to_owned(),
        })
    }

    /// Forget a token. Returns `false` when it was already unknown.
    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.remove(token).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_resolves_until_revoked() {
        let sessions = SessionRegistry::new();
        let session = sessions.issue("u1");

        assert_eq!(sessions.resolve(&session.token), Some(session.clone()));
        assert!(sessions.revoke(&session.token));
        assert_eq!(sessions.resolve(&session.token), None);
        assert!(!sessions.revoke(&session.token));
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let sessions = SessionRegistry::new();
        let first = sessions.issue("u1");
        let second = sessions.issue("u1");
        assert_ne!(first.token, second.token);
    }
}
