//! In-memory account repository keyed by username.

use parking_lot::Mutex;
use pipeline_core::Account;
use std::collections::HashMap;
use std::sync::Arc;

/// Mutex-guarded username → account map.
///
/// Cloning is cheap; clones share the same accounts.
#[derive(Debug, Clone, Default)]
pub struct UserRepo {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
}

impl UserRepo {
    /// Empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Account registered under `username`.
    #[must_use]
    pub fn find_by_username(&self, username: &str) -> Option<Account> {
        self.accounts.lock().get(username).cloned()
    }

    /// Insert or replace the account under its username.
    pub fn put(&self, account: Account) {
        self.accounts.lock().insert(account.username.clone(), account);
    }

    /// `true` if `username` is taken.
    #[must_use]
    pub fn contains_by_username(&self, username: &str) -> bool {
        self.accounts.lock().contains_key(username)
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.lock().len()
    }

    /// `true` when no account is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every account.
    pub fn clear(&self) {
        self.accounts.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_find() {
        let repo = UserRepo::new();
        repo.put(Account {
            username: "bob".to_string(),
            cid: 7,
            ..Account::default()
        });

        assert!(repo.contains_by_username("bob"));
        assert_eq!(repo.find_by_username("bob").map(|a| a.cid), Some(7));
        assert!(repo.find_by_username("alice").is_none());

        repo.clone().clear();
        assert!(repo.is_empty());
    }
}
