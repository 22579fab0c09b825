//! Core business logic module
//!
//! This module contains the account, transfer and ledger components:
//! - `hierarchy` - The role hierarchy policy consulted by every gated operation
//! - `traits` - Store, ledger and clock seams
//! - `account_store` - In-memory account documents with atomic updates
//! - `ledger` - Append-only in-memory transaction ledger
//! - `transfer` - Balance movement between accounts
//! - `status` - Activate, deactivate, ban and profile edits
//! - `auth` - Account creation, login and lookups
//! - `service` - Facade wiring the components together
//! - `operations` - Applying batch operation rows to the service
//! - `batch_processor` - Concurrent batch application

pub mod account_store;
pub mod auth;
pub mod batch_processor;
pub mod clock;
pub mod hierarchy;
pub mod ledger;
pub mod operations;
pub mod password;
pub mod service;
pub mod status;
pub mod traits;
pub mod transfer;

pub use account_store::InMemoryAccountStore;
pub use auth::Authenticator;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use clock::{FixedClock, SystemClock};
pub use ledger::InMemoryLedger;
pub use service::{AdminService, InMemoryAdminService};
pub use status::StatusManager;
pub use traits::{AccountStore, Clock, Ledger};
pub use transfer::TransferEngine;
