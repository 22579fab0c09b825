//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `role`: The six principal roles
//! - `account`: Account documents, views and edit inputs
//! - `transaction`: Ledger records and batch operation rows
//! - `error`: Error types and their categories

pub mod account;
pub mod error;
pub mod role;
pub mod transaction;

pub use account::{
    username_key, Account, AccountId, AccountSnapshot, AccountStatus, AccountView, NewAccount,
    PasswordHashString, ProfileUpdate, StatusAction,
};
pub use error::{AdminError, ErrorKind};
pub use role::Role;
pub use transaction::{
    Direction, NewTransaction, Operation, OperationRecord, TransactionId, TransactionRecord,
};
