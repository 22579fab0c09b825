//! Account-related types for the admin ledger
//!
//! This module defines the Account document and the value types derived from
//! it: the password-free [`AccountView`] handed to callers, the
//! [`AccountSnapshot`] embedded in ledger records, and the inputs for account
//! creation and profile edits.

use super::role::Role;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account identifier, assigned at creation and never changed
pub type AccountId = Uuid;

/// Stored password hash (an Argon2 PHC string)
///
/// `Debug` is redacted so accounts can be logged without leaking hashes.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHashString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHashString([redacted])")
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountStatus {
    /// Default state; the account may log in and move money
    Activated,
    /// Temporarily disabled by a senior role
    Deactivated,
    /// Disabled by a Mother Admin
    Banned,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Activated => "Activated",
            AccountStatus::Deactivated => "Deactivated",
            AccountStatus::Banned => "Banned",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reversible status change requested by a senior role
///
/// Banning is a separate, Mother Admin only operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusAction {
    Activate,
    Deactivate,
}

impl StatusAction {
    /// Status the target ends up in
    pub fn target_status(self) -> AccountStatus {
        match self {
            StatusAction::Activate => AccountStatus::Activated,
            StatusAction::Deactivate => AccountStatus::Deactivated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusAction::Activate => "activate",
            StatusAction::Deactivate => "deactivate",
        }
    }
}

/// Principal stored in the account store
///
/// Balances change only through the transfer engine and the Mother Admin
/// credit operation. `version` is bumped by the store on every committed
/// write.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,

    /// Unique across accounts, compared case-insensitively after trimming
    pub username: String,

    /// Unique across accounts, compared exactly
    pub email: String,

    pub fullname: String,

    /// Argon2 PHC string; never leaves the crate in a view
    pub password_hash: PasswordHashString,

    pub role: Role,

    /// Signed quantity; starts at zero
    pub balance: Decimal,

    pub status: AccountStatus,

    pub joined_at: DateTime<Utc>,

    /// `None` until the first successful login
    pub last_login: Option<DateTime<Utc>>,

    pub version: u64,
}

impl Account {
    /// Create a fresh account
    ///
    /// Balance starts at zero, status at `Activated`, and the account has
    /// never logged in.
    pub fn new(
        new_account: NewAccount,
        password_hash: PasswordHashString,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Account {
            id: Uuid::new_v4(),
            username: new_account.username.trim().to_string(),
            email: new_account.email.trim().to_string(),
            fullname: new_account.fullname.unwrap_or_default().trim().to_string(),
            password_hash,
            role: new_account.role,
            balance: Decimal::ZERO,
            status: AccountStatus::Activated,
            joined_at,
            last_login: None,
            version: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Activated
    }

    /// Identity snapshot for ledger records
    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }

    pub fn view(&self) -> AccountView {
        AccountView::from(self)
    }
}

/// Key used by the unique username index
pub fn username_key(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Identity of an account at the time a ledger record was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub username: String,
    pub role: Role,
}

/// Account as returned to callers: everything except the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub role: Role,
    pub balance: Decimal,
    pub status: AccountStatus,
    pub joined_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        AccountView {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            fullname: account.fullname.clone(),
            role: account.role,
            balance: account.balance,
            status: account.status,
            joined_at: account.joined_at,
            last_login: account.last_login,
        }
    }
}

/// Input for signup and admin-side account creation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub fullname: Option<String>,
    pub password: String,
    pub role: Role,
}

/// Partial profile edit
///
/// `None` leaves a field untouched. An empty or whitespace-only password is
/// treated the same as `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub fullname: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl ProfileUpdate {
    /// Password to write, if any
    pub fn new_password(&self) -> Option<&str> {
        self.password
            .as_deref()
            .filter(|password| !password.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.fullname.is_none()
            && self.new_password().is_none()
            && self.role.is_none()
    }
}
