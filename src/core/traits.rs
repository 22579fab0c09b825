//! Collaborator traits for account storage, the transaction ledger and time
//!
//! The services in this crate never reach for global state: each is built
//! with explicit store, ledger and clock handles implementing these traits.
//! The in-memory implementations live alongside them; a database-backed
//! store only has to honour the same atomicity contract.

use crate::types::{
    Account, AccountId, AdminError, NewTransaction, TransactionId, TransactionRecord,
};
use chrono::{DateTime, Utc};

/// Document store holding every principal
///
/// `email` and `username` are unique indexes; the store enforces them on
/// insert and on every update that changes either field.
pub trait AccountStore: Send + Sync {
    /// Insert a new account
    ///
    /// # Errors
    ///
    /// [`AdminError::DuplicateField`] if the email or username is taken.
    fn insert(&self, account: Account) -> Result<Account, AdminError>;

    /// Look up an account by id
    fn get(&self, id: AccountId) -> Option<Account>;

    /// Look up an account by exact email
    fn find_by_email(&self, email: &str) -> Option<Account>;

    /// Look up an account by username, ignoring case and surrounding whitespace
    fn find_by_username(&self, username: &str) -> Option<Account>;

    /// Snapshot of every account
    fn all(&self) -> Vec<Account>;

    /// Atomically update one account
    ///
    /// The closure works on a copy. The copy is written back only if the
    /// closure returns `Ok`; otherwise the stored account is unchanged.
    fn update<T, F>(&self, id: AccountId, f: F) -> Result<T, AdminError>
    where
        F: FnOnce(&mut Account) -> Result<T, AdminError>;

    /// Atomically update two distinct accounts
    ///
    /// Both accounts are held exclusively for the whole closure, so anything
    /// the closure does (such as appending to the ledger) commits as one unit
    /// with the two balance writes. Nothing is written if the closure fails.
    ///
    /// # Errors
    ///
    /// [`AdminError::AccountNotFound`] if either id is unknown,
    /// [`AdminError::SelfTransfer`] if both ids are the same.
    fn update_pair<T, F>(&self, first: AccountId, second: AccountId, f: F) -> Result<T, AdminError>
    where
        F: FnOnce(&mut Account, &mut Account) -> Result<T, AdminError>;
}

/// Append-only log of committed balance movements
pub trait Ledger: Send + Sync {
    /// Append a record, assigning it the next id
    fn append(&self, transaction: NewTransaction) -> Result<TransactionRecord, AdminError>;

    /// Look up a record by id
    fn get(&self, id: TransactionId) -> Option<TransactionRecord>;

    /// Up to `limit` records, newest first
    fn recent(&self, limit: usize) -> Vec<TransactionRecord>;

    /// Records where `account` is the sender or the receiver, newest first
    fn for_account(&self, account: AccountId) -> Vec<TransactionRecord>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source of timestamps for `joinedAt`, `lastLogin` and `createdAt`
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
