//! In-memory session store.
//!
//! Keeps a token → session map and a username → token index under one
//! lock, so a username never owns more than one live session.

use crate::utils::{session_seed, sha256_hex};
use parking_lot::Mutex;
use pipeline_core::{Account, Session};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Sessions {
    by_token: HashMap<String, Session>,
    token_by_username: HashMap<String, String>,
}

impl Sessions {
    fn by_token(&self, token: &str) -> Option<&Session> {
        if token.is_empty() {
            return None;
        }
        self.by_token.get(token)
    }

    fn logout_by_token(&mut self, token: &str) -> Option<Session> {
        if token.is_empty() {
            return None;
        }
        let removed = self.by_token.remove(token)?;
        self.token_by_username.remove(&removed.account.username);
        Some(removed)
    }

    fn logout_by_username(&mut self, username: &str) -> Option<Session> {
        if username.is_empty() {
            return None;
        }
        let token = self.token_by_username.get(username)?.clone();
        self.logout_by_token(&token)
    }

    fn new_token(&self, account: &Account) -> String {
        if !account.session_token.is_empty() {
            return account.session_token.clone();
        }
        let mut token = session_seed(&account.username);
        let mut i = 1u64;
        while self.by_token.contains_key(&token) {
            token = sha256_hex(&format!("{token}:{i}"));
            i += 1;
        }
        token
    }
}

/// Bidirectional token ↔ account store.
///
/// Cloning is cheap; clones share the same sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<Sessions>>,
}

impl SessionStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if `token` names a live session.
    #[must_use]
    pub fn is_logged_in(&self, token: &str) -> bool {
        self.inner.lock().by_token(token).is_some()
    }

    /// Session bound to `token`.
    #[must_use]
    pub fn session_by_token(&self, token: &str) -> Option<Session> {
        self.inner.lock().by_token(token).cloned()
    }

    /// Session owned by `username`.
    #[must_use]
    pub fn session_by_username(&self, username: &str) -> Option<Session> {
        let sessions = self.inner.lock();
        let token = sessions.token_by_username.get(username)?;
        sessions.by_token.get(token).cloned()
    }

    /// Remove the session bound to `token`, returning it.
    pub fn logout_by_token(&self, token: &str) -> Option<Session> {
        let removed = self.inner.lock().logout_by_token(token);
        if let Some(session) = &removed {
            tracing::debug!(username = %session.account.username, "Session closed");
        }
        removed
    }

    /// Remove the session owned by `username`, returning it.
    pub fn logout_by_username(&self, username: &str) -> Option<Session> {
        self.inner.lock().logout_by_username(username)
    }

    /// Bind a fresh session to `account`, replacing any session it had.
    ///
    /// An account that already carries a token keeps it, so assigning twice
    /// without a logout in between yields the same token. Otherwise a new
    /// unique token is minted. `account.session_token` is updated either way.
    pub fn assign_session(&self, account: &mut Account) -> Session {
        let mut sessions = self.inner.lock();
        sessions.logout_by_username(&account.username);
        sessions.logout_by_token(&account.session_token);

        let token = sessions.new_token(account);
        account.session_token.clone_from(&token);

        let session = Session {
            token: token.clone(),
            account: account.clone(),
        };
        sessions
            .token_by_username
            .insert(account.username.clone(), token.clone());
        sessions.by_token.insert(token, session.clone());

        tracing::debug!(username = %account.username, "Session assigned");
        session
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().by_token.len()
    }

    /// `true` when no session is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every session.
    pub fn clear(&self) {
        let mut sessions = self.inner.lock();
        sessions.by_token.clear();
        sessions.token_by_username.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(username: &str) -> Account {
        Account {
            username: username.to_string(),
            ..Account::default()
        }
    }

    #[test]
    fn test_assign_is_idempotent_per_account() {
        let store = SessionStore::new();
        let mut bob = account("bob");

        let first = store.assign_session(&mut bob);
        let second = store.assign_session(&mut bob);

        assert_eq!(first.token, second.token);
        assert_eq!(bob.session_token, second.token);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reassign_replaces_previous_session() {
        let store = SessionStore::new();
        let first = store.assign_session(&mut account("bob"));
        let second = store.assign_session(&mut account("bob"));

        assert_ne!(first.token, second.token);
        assert!(!store.is_logged_in(&first.token));
        assert!(store.is_logged_in(&second.token));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_tokens_are_unique_across_accounts() {
        let store = SessionStore::new();
        let bob = store.assign_session(&mut account("bob"));
        let alice = store.assign_session(&mut account("alice"));
        assert_ne!(bob.token, alice.token);
        assert_eq!(store.session_by_username("alice").map(|s| s.token), Some(alice.token));
    }

    #[test]
    fn test_preset_token_is_kept() {
        let store = SessionStore::new();
        let mut admin = Account {
            session_token: "admin-sessiontoken".to_string(),
            ..account("admin")
        };
        let session = store.assign_session(&mut admin);
        assert_eq!(session.token, "admin-sessiontoken");
    }

    #[test]
    fn test_logout_clears_both_indexes() {
        let store = SessionStore::new();
        let session = store.assign_session(&mut account("bob"));

        assert_eq!(
            store.logout_by_username("bob").map(|s| s.token),
            Some(session.token.clone())
        );
        assert!(store.session_by_token(&session.token).is_none());
        assert!(store.session_by_username("bob").is_none());
        assert!(store.logout_by_token(&session.token).is_none());
        assert!(store.logout_by_token("").is_none());
    }

    #[test]
    fn test_clear() {
        let store = SessionStore::new();
        store.assign_session(&mut account("bob"));
        store.assign_session(&mut account("alice"));
        store.clear();
        assert!(store.is_empty());
        assert!(store.session_by_username("bob").is_none());
    }
}
