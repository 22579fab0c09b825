//! Thread-safe in-memory account store
//!
//! This module provides [`InMemoryAccountStore`], the default
//! [`AccountStore`] implementation.
//!
//! # Design
//!
//! Accounts live in a `DashMap` of per-account mutexes. A map lookup only
//! clones the `Arc` out of its shard, so no shard lock is ever held while an
//! account mutex is being acquired. Unique `email` and `username` indexes are
//! separate `DashMap`s that are reserved with the entry API, so two racing
//! inserts can never both claim the same value.
//!
//! # Atomicity
//!
//! Every update runs the caller's closure on a copy and writes the copy back
//! only on success. Two-account updates lock both mutexes in id order (which
//! rules out lock-order deadlocks) and keep them for the whole closure.
//! Concurrent transfers against the same account are therefore serialized
//! and no update is lost.

use crate::core::traits::AccountStore;
use crate::types::{username_key, Account, AccountId, AdminError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Thread-safe account store backed by `DashMap`
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: DashMap<AccountId, Arc<Mutex<Account>>>,

    /// Exact email -> account id
    emails: DashMap<String, AccountId>,

    /// Normalized username -> account id
    usernames: DashMap<String, AccountId>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn handle(&self, id: AccountId) -> Option<Arc<Mutex<Account>>> {
        self.accounts.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Write a successfully updated copy back, maintaining the unique indexes
    fn commit(&self, stored: &mut Account, mut working: Account) -> Result<(), AdminError> {
        working.id = stored.id;
        self.reindex(stored, &working)?;
        working.version = stored.version + 1;
        *stored = working;
        Ok(())
    }

    fn reindex(&self, before: &Account, after: &Account) -> Result<(), AdminError> {
        let email_changed = before.email != after.email;
        let old_username = username_key(&before.username);
        let new_username = username_key(&after.username);
        let username_changed = old_username != new_username;

        if email_changed {
            reserve(&self.emails, after.email.clone(), after.id, "email")?;
        }
        if username_changed {
            if let Err(e) = reserve(&self.usernames, new_username, after.id, "username") {
                if email_changed {
                    self.emails.remove_if(&after.email, |_, id| *id == after.id);
                }
                return Err(e);
            }
        }

        if email_changed {
            self.emails.remove_if(&before.email, |_, id| *id == before.id);
        }
        if username_changed {
            self.usernames
                .remove_if(&old_username, |_, id| *id == before.id);
        }

        Ok(())
    }
}

/// Claim `key` in a unique index for `id`
fn reserve(
    index: &DashMap<String, AccountId>,
    key: String,
    id: AccountId,
    field: &str,
) -> Result<(), AdminError> {
    match index.entry(key) {
        Entry::Occupied(entry) if *entry.get() != id => {
            Err(AdminError::duplicate_field(field, entry.key()))
        }
        Entry::Occupied(_) => Ok(()),
        Entry::Vacant(entry) => {
            entry.insert(id);
            Ok(())
        }
    }
}

/// Lock an account, recovering from poisoning
///
/// Stored accounts are only ever replaced wholesale, so a panic in another
/// holder cannot have left one half-written.
fn lock(handle: &Mutex<Account>) -> MutexGuard<'_, Account> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Copy everything except the unique fields and the id
fn commit_pair_member(stored: &mut Account, mut working: Account) {
    working.id = stored.id;
    working.email = stored.email.clone();
    working.username = stored.username.clone();
    working.version = stored.version + 1;
    *stored = working;
}

impl AccountStore for InMemoryAccountStore {
    fn insert(&self, account: Account) -> Result<Account, AdminError> {
        reserve(&self.emails, account.email.clone(), account.id, "email")?;
        if let Err(e) = reserve(
            &self.usernames,
            username_key(&account.username),
            account.id,
            "username",
        ) {
            self.emails.remove_if(&account.email, |_, id| *id == account.id);
            return Err(e);
        }

        self.accounts
            .insert(account.id, Arc::new(Mutex::new(account.clone())));
        debug!(account = %account.id, role = %account.role, "account inserted");

        Ok(account)
    }

    fn get(&self, id: AccountId) -> Option<Account> {
        let handle = self.handle(id)?;
        let account = lock(&handle).clone();
        Some(account)
    }

    fn find_by_email(&self, email: &str) -> Option<Account> {
        let id = self.emails.get(email).map(|entry| *entry.value())?;
        self.get(id)
    }

    fn find_by_username(&self, username: &str) -> Option<Account> {
        let id = self
            .usernames
            .get(&username_key(username))
            .map(|entry| *entry.value())?;
        self.get(id)
    }

    fn all(&self) -> Vec<Account> {
        let handles: Vec<_> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        handles.iter().map(|handle| lock(handle).clone()).collect()
    }

    fn update<T, F>(&self, id: AccountId, f: F) -> Result<T, AdminError>
    where
        F: FnOnce(&mut Account) -> Result<T, AdminError>,
    {
        let handle = self
            .handle(id)
            .ok_or_else(|| AdminError::account_not_found(id))?;
        let mut stored = lock(&handle);

        let mut working = stored.clone();
        let result = f(&mut working)?;
        self.commit(&mut stored, working)?;

        Ok(result)
    }

    /// Atomically update two distinct accounts
    ///
    /// Changes the closure makes to `id`, `email` or `username` are
    /// discarded; use [`AccountStore::update`] for identity edits.
    fn update_pair<T, F>(&self, first: AccountId, second: AccountId, f: F) -> Result<T, AdminError>
    where
        F: FnOnce(&mut Account, &mut Account) -> Result<T, AdminError>,
    {
        if first == second {
            return Err(AdminError::SelfTransfer { account: first });
        }

        let first_handle = self
            .handle(first)
            .ok_or_else(|| AdminError::account_not_found(first))?;
        let second_handle = self
            .handle(second)
            .ok_or_else(|| AdminError::account_not_found(second))?;

        // Always lock the lower id first
        let (mut first_stored, mut second_stored) = if first < second {
            let a = lock(&first_handle);
            let b = lock(&second_handle);
            (a, b)
        } else {
            let b = lock(&second_handle);
            let a = lock(&first_handle);
            (a, b)
        };

        let mut first_working = first_stored.clone();
        let mut second_working = second_stored.clone();
        let result = f(&mut first_working, &mut second_working)?;

        commit_pair_member(&mut first_stored, first_working);
        commit_pair_member(&mut second_stored, second_working);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewAccount, PasswordHashString, Role};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::thread;

    fn account(username: &str, email: &str) -> Account {
        Account::new(
            NewAccount {
                username: username.to_string(),
                email: email.to_string(),
                fullname: None,
                password: String::new(),
                role: Role::User,
            },
            PasswordHashString::new("$argon2id$stub".to_string()),
            Utc::now(),
        )
    }

    #[test]
    fn test_insert_and_lookup() {
        let store = InMemoryAccountStore::new();
        let inserted = store.insert(account("Alice", "alice@example.com")).unwrap();

        assert_eq!(store.get(inserted.id).unwrap().username, "Alice");
        assert_eq!(
            store.find_by_email("alice@example.com").unwrap().id,
            inserted.id
        );
        assert_eq!(store.find_by_username("  aLiCe ").unwrap().id, inserted.id);
        assert!(store.find_by_email("ALICE@example.com").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_rejects_duplicate_email() {
        let store = InMemoryAccountStore::new();
        store.insert(account("alice", "shared@example.com")).unwrap();

        let err = store
            .insert(account("bob", "shared@example.com"))
            .unwrap_err();

        assert_eq!(err, AdminError::duplicate_field("email", "shared@example.com"));
        assert!(store.find_by_username("bob").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_rejects_duplicate_username_and_releases_email() {
        let store = InMemoryAccountStore::new();
        store.insert(account("alice", "alice@example.com")).unwrap();

        let err = store.insert(account("ALICE", "other@example.com")).unwrap_err();
        assert_eq!(err, AdminError::duplicate_field("username", "alice"));

        // The email reserved by the failed insert is free again
        assert!(store.insert(account("carol", "other@example.com")).is_ok());
    }

    #[test]
    fn test_update_commits_and_bumps_version() {
        let store = InMemoryAccountStore::new();
        let inserted = store.insert(account("alice", "alice@example.com")).unwrap();

        store
            .update(inserted.id, |account| {
                account.balance = Decimal::new(42, 0);
                Ok(())
            })
            .unwrap();

        let stored = store.get(inserted.id).unwrap();
        assert_eq!(stored.balance, Decimal::new(42, 0));
        assert_eq!(stored.version, inserted.version + 1);
    }

    #[test]
    fn test_failed_update_leaves_account_unchanged() {
        let store = InMemoryAccountStore::new();
        let inserted = store.insert(account("alice", "alice@example.com")).unwrap();

        let result: Result<(), _> = store.update(inserted.id, |account| {
            account.balance = Decimal::new(42, 0);
            Err(AdminError::Unauthorized)
        });

        assert_eq!(result.unwrap_err(), AdminError::Unauthorized);
        assert_eq!(store.get(inserted.id).unwrap(), inserted);
    }

    #[test]
    fn test_update_missing_account() {
        let store = InMemoryAccountStore::new();
        let id = AccountId::new_v4();

        let result = store.update(id, |_| Ok(()));
        assert_eq!(result.unwrap_err(), AdminError::account_not_found(id));
    }

    #[test]
    fn test_update_reindexes_renamed_account() {
        let store = InMemoryAccountStore::new();
        let inserted = store.insert(account("alice", "alice@example.com")).unwrap();

        store
            .update(inserted.id, |account| {
                account.username = "alicia".to_string();
                account.email = "alicia@example.com".to_string();
                Ok(())
            })
            .unwrap();

        assert!(store.find_by_username("alice").is_none());
        assert!(store.find_by_email("alice@example.com").is_none());
        assert_eq!(store.find_by_username("alicia").unwrap().id, inserted.id);
        assert_eq!(
            store.find_by_email("alicia@example.com").unwrap().id,
            inserted.id
        );
    }

    #[test]
    fn test_update_rejects_rename_onto_taken_username() {
        let store = InMemoryAccountStore::new();
        let alice = store.insert(account("alice", "alice@example.com")).unwrap();
        store.insert(account("bob", "bob@example.com")).unwrap();

        let result = store.update(alice.id, |account| {
            account.email = "new@example.com".to_string();
            account.username = "Bob".to_string();
            Ok(())
        });

        assert_eq!(
            result.unwrap_err(),
            AdminError::duplicate_field("username", "bob")
        );
        assert_eq!(store.get(alice.id).unwrap(), alice);
        assert!(store.find_by_email("new@example.com").is_none());
        assert_eq!(store.find_by_email("alice@example.com").unwrap().id, alice.id);
    }

    #[test]
    fn test_update_pair_commits_both() {
        let store = InMemoryAccountStore::new();
        let a = store.insert(account("a", "a@example.com")).unwrap();
        let b = store.insert(account("b", "b@example.com")).unwrap();

        store
            .update_pair(a.id, b.id, |first, second| {
                first.balance -= Decimal::ONE;
                second.balance += Decimal::ONE;
                Ok(())
            })
            .unwrap();

        assert_eq!(store.get(a.id).unwrap().balance, Decimal::NEGATIVE_ONE);
        assert_eq!(store.get(b.id).unwrap().balance, Decimal::ONE);
    }

    #[test]
    fn test_update_pair_failure_writes_nothing() {
        let store = InMemoryAccountStore::new();
        let a = store.insert(account("a", "a@example.com")).unwrap();
        let b = store.insert(account("b", "b@example.com")).unwrap();

        let result: Result<(), _> = store.update_pair(a.id, b.id, |first, second| {
            first.balance -= Decimal::ONE;
            second.balance += Decimal::ONE;
            Err(AdminError::invalid_amount("1"))
        });

        assert!(result.is_err());
        assert_eq!(store.get(a.id).unwrap(), a);
        assert_eq!(store.get(b.id).unwrap(), b);
    }

    #[test]
    fn test_update_pair_discards_identity_changes() {
        let store = InMemoryAccountStore::new();
        let a = store.insert(account("a", "a@example.com")).unwrap();
        let b = store.insert(account("b", "b@example.com")).unwrap();

        store
            .update_pair(a.id, b.id, |first, _| {
                first.username = "b".to_string();
                Ok(())
            })
            .unwrap();

        assert_eq!(store.get(a.id).unwrap().username, "a");
    }

    #[test]
    fn test_update_pair_rejects_same_account() {
        let store = InMemoryAccountStore::new();
        let a = store.insert(account("a", "a@example.com")).unwrap();

        let result = store.update_pair(a.id, a.id, |_, _| Ok(()));
        assert_eq!(result.unwrap_err(), AdminError::SelfTransfer { account: a.id });
    }

    #[test]
    fn test_update_pair_missing_account() {
        let store = InMemoryAccountStore::new();
        let a = store.insert(account("a", "a@example.com")).unwrap();
        let missing = AccountId::new_v4();

        let result = store.update_pair(a.id, missing, |_, _| Ok(()));
        assert_eq!(result.unwrap_err(), AdminError::account_not_found(missing));
    }

    // Concurrent access tests
    #[test]
    fn test_concurrent_pair_updates_in_both_directions() {
        let store = Arc::new(InMemoryAccountStore::new());
        let a = store.insert(account("a", "a@example.com")).unwrap().id;
        let b = store.insert(account("b", "b@example.com")).unwrap().id;

        // Opposite lock requests from many threads must neither deadlock nor lose updates
        thread::scope(|scope| {
            for i in 0..16 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for _ in 0..50 {
                        let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
                        store
                            .update_pair(from, to, |payer, payee| {
                                payer.balance -= Decimal::ONE;
                                payee.balance += Decimal::ONE;
                                Ok(())
                            })
                            .unwrap();
                    }
                });
            }
        });

        let a = store.get(a).unwrap();
        let b = store.get(b).unwrap();
        assert_eq!(a.balance + b.balance, Decimal::ZERO);
        assert_eq!(a.balance, Decimal::ZERO);
        assert_eq!(a.version, 800);
    }

    #[test]
    fn test_update_recovers_after_panicking_closure() {
        let store = InMemoryAccountStore::new();
        let id = store.insert(account("alice", "alice@example.com")).unwrap().id;
        let version = store.get(id).unwrap().version;

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.update(id, |account| -> Result<(), AdminError> {
                account.balance = Decimal::ONE;
                panic!("closure failed mid-update");
            })
        }));
        assert!(outcome.is_err());
        assert_eq!(store.get(id).unwrap().balance, Decimal::ZERO);
        assert_eq!(store.get(id).unwrap().version, version);

        let balance = store
            .update(id, |account| {
                account.balance = Decimal::TEN;
                Ok(account.balance)
            })
            .unwrap();
        assert_eq!(balance, Decimal::TEN);
        assert_eq!(store.get(id).unwrap().version, version + 1);
    }

    #[test]
    fn test_concurrent_inserts_same_email() {
        let store = Arc::new(InMemoryAccountStore::new());

        let successes: usize = thread::scope(|scope| {
            let handles: Vec<_> = (0..10)
                .map(|i| {
                    let store = Arc::clone(&store);
                    scope.spawn(move || {
                        store
                            .insert(account(&format!("user{}", i), "same@example.com"))
                            .is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| usize::from(handle.join().unwrap()))
                .sum()
        });

        assert_eq!(successes, 1);
        assert_eq!(store.len(), 1);
    }
}
