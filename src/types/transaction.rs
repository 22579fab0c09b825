//! Transaction-related types for the admin ledger
//!
//! This module defines the ledger record written for every committed balance
//! movement, and the operation rows consumed by the batch driver.

use super::account::AccountSnapshot;
use super::role::Role;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger record identifier
///
/// Assigned by the ledger in append order, so a higher id is always a more
/// recent record.
pub type TransactionId = u64;

/// Kind of balance movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Actor pays target
    Add,

    /// Claw-back: target pays the actor, who must be a Mother Admin
    Minus,

    /// Mother Admin credits target without a matching debit
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Add => "add",
            Direction::Minus => "minus",
            Direction::Credit => "credit",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable ledger record
///
/// `from` is always the actor and `to` the target, whatever way the money
/// actually moved. Both are value snapshots so the record stays meaningful
/// after a rename or re-role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub from: AccountSnapshot,
    pub to: AccountSnapshot,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
}

/// Ledger record before the ledger has assigned it an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub from: AccountSnapshot,
    pub to: AccountSnapshot,
    pub amount: Decimal,
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    pub fn with_id(self, id: TransactionId) -> TransactionRecord {
        TransactionRecord {
            id,
            from: self.from,
            to: self.to,
            amount: self.amount,
            direction: self.direction,
            created_at: self.created_at,
        }
    }
}

/// Operations understood by the batch driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Signup,
    Login,
    Credit,
    Add,
    Minus,
    Activate,
    Deactivate,
    Ban,
    Update,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Signup => "signup",
            Operation::Login => "login",
            Operation::Credit => "credit",
            Operation::Add => "add",
            Operation::Minus => "minus",
            Operation::Activate => "activate",
            Operation::Deactivate => "deactivate",
            Operation::Ban => "ban",
            Operation::Update => "update",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed row of an operations file
///
/// `actor` and `target` are usernames (a login row may use an email as
/// `target`). Which of the optional columns are required depends on `op`;
/// that is checked when the row is converted.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    pub op: Operation,
    pub actor: Option<String>,
    pub target: String,
    pub amount: Option<Decimal>,
    pub role: Option<Role>,
    pub email: Option<String>,
    pub fullname: Option<String>,
    pub password: Option<String>,
}

impl OperationRecord {
    /// Usernames this row reads or writes
    ///
    /// Rows that share a username must be applied in file order.
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.actor
            .as_deref()
            .into_iter()
            .chain(std::iter::once(self.target.as_str()))
    }
}
