//! Admin Ledger Library
//! # Overview
//!
//! This library implements the account and balance core of a role-based
//! administration backend: a fixed six-level role hierarchy gates who may
//! edit, activate, deactivate, ban and move money to whom, and every balance
//! movement is written to an append-only ledger in the same atomic unit as
//! the balance changes.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, Role, TransactionRecord, AdminError, ...)
//! - [`core`] - Business logic components:
//!   - [`core::hierarchy`] - The role hierarchy policy
//!   - [`core::transfer`] - Transfers, claw-backs and Mother Admin credits
//!   - [`core::status`] - Status changes and profile edits
//!   - [`core::auth`] - Account creation and login
//!   - [`core::service`] - The [`AdminService`] facade
//! - [`io`] - CSV reading and writing for the batch driver
//! - [`strategy`] - Sync and async batch processing pipelines
//! - [`cli`] - CLI arguments parsing
//!
//! # Roles
//!
//! From most to least privileged: Mother Admin, Sub Admin, Master, Agent,
//! Sub Agent, User. A role's downstream set is every role below it.
//!
//! # Transfers
//!
//! - **add**: the actor pays a target in their downstream set (Mother Admin
//!   may pay anyone)
//! - **minus**: a Mother Admin claws funds back from the target
//! - **credit**: a Mother Admin credits funds without a matching debit
//!
//! # Example
//!
//! ```
//! use admin_ledger::{AdminService, Direction, NewAccount, Role};
//! use rust_decimal::Decimal;
//!
//! let service = AdminService::in_memory();
//! let signup = |username: &str, role| {
//!     service.create_account(NewAccount {
//!         username: username.to_string(),
//!         email: format!("{}@example.com", username),
//!         fullname: None,
//!         password: "secret".to_string(),
//!         role,
//!     })
//! };
//! let root = signup("root", Role::MotherAdmin).unwrap();
//! let user = signup("player", Role::User).unwrap();
//!
//! service.credit(root.id, root.id, Decimal::new(1000, 0)).unwrap();
//! service.transfer(root.id, user.id, Decimal::new(200, 0), Direction::Add).unwrap();
//!
//! assert_eq!(service.account(root.id).unwrap().balance, Decimal::new(800, 0));
//! assert_eq!(service.account(user.id).unwrap().balance, Decimal::new(200, 0));
//! ```

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{AccountStore, AdminService, Clock, InMemoryAdminService, Ledger};
pub use io::{write_accounts_csv, write_ledger_csv};
pub use types::{
    Account, AccountId, AccountStatus, AccountView, AdminError, Direction, ErrorKind, NewAccount,
    ProfileUpdate, Role, StatusAction, TransactionRecord,
};
