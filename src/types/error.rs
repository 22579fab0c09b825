//! Error types for the admin ledger
//!
//! Every failure in the subsystem is an [`AdminError`]. Each variant carries
//! enough context to diagnose the failure and maps onto one of the coarse
//! categories in [`ErrorKind`], which is what an outer surface (HTTP, CLI)
//! should branch on.
//!
//! # Error Categories
//!
//! - **NotFound**: referenced account or record absent
//! - **PermissionDenied**: role hierarchy or action-specific authorization failure
//! - **InsufficientFunds**: the paying party cannot cover the amount
//! - **InvalidInput**: malformed amount, missing field, unknown role, self-transfer
//! - **Unauthorized**: missing caller identity or failed login
//! - **Conflict**: no-op update, duplicate unique field
//! - **Internal**: storage, hashing and driver I/O failures

use super::account::{AccountId, AccountStatus};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Coarse error category reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    InsufficientFunds,
    InvalidInput,
    Unauthorized,
    Conflict,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Main error type for the admin ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdminError {
    /// Referenced account does not exist
    ///
    /// `account` is whatever the caller used to refer to it: an id, a
    /// username or an email.
    #[error("Account {account} not found")]
    AccountNotFound { account: String },

    /// The caller's role does not allow the action
    #[error("Permission denied for {action}: {reason}")]
    PermissionDenied {
        /// Action that was attempted (`transfer`, `ban`, ...)
        action: String,
        /// Which rule rejected it
        reason: String,
    },

    /// The paying account cannot cover the amount
    ///
    /// Nothing was written; balances and the ledger are untouched.
    #[error("Insufficient funds for account {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        available: Decimal,
        requested: Decimal,
    },

    /// Amount is zero, negative or not a number
    #[error("Invalid amount '{amount}': must be a positive decimal")]
    InvalidAmount { amount: String },

    /// Role name outside the fixed hierarchy
    #[error("Unknown role '{role}'")]
    UnknownRole { role: String },

    /// A required field was absent or empty
    #[error("Missing required field '{field}'")]
    MissingField { field: String },

    /// Actor and target of a transfer are the same account
    #[error("Account {account} cannot transfer to itself")]
    SelfTransfer { account: AccountId },

    /// Unparseable operation name in the batch driver
    #[error("Invalid operation '{op}'")]
    InvalidOperation { op: String },

    /// No caller identity was supplied, or it does not resolve to an account
    #[error("Caller identity required")]
    Unauthorized,

    /// Login failed
    ///
    /// Covers both an unknown identifier and a wrong password so the two
    /// cannot be told apart.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Status change would not change anything
    #[error("Account {account} is already {status}")]
    AlreadyInState {
        account: AccountId,
        status: AccountStatus,
    },

    /// Profile update produced no changed fields
    #[error("No changes to apply for account {account}")]
    NoChanges { account: AccountId },

    /// A unique field collides with another account
    #[error("{field} '{value}' is already registered")]
    DuplicateField { field: String, value: String },

    /// Balance arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        operation: String,
        account: AccountId,
    },

    /// Password hashing failed
    #[error("Password hashing failed: {message}")]
    PasswordHash { message: String },

    /// I/O error in the batch driver
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// CSV parsing error in the batch driver
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError { line: Option<u64>, message: String },
}

impl AdminError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::AccountNotFound { .. } => ErrorKind::NotFound,
            AdminError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            AdminError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            AdminError::InvalidAmount { .. }
            | AdminError::UnknownRole { .. }
            | AdminError::MissingField { .. }
            | AdminError::SelfTransfer { .. }
            | AdminError::InvalidOperation { .. }
            | AdminError::ParseError { .. } => ErrorKind::InvalidInput,
            AdminError::Unauthorized | AdminError::InvalidCredentials => ErrorKind::Unauthorized,
            AdminError::AlreadyInState { .. }
            | AdminError::NoChanges { .. }
            | AdminError::DuplicateField { .. } => ErrorKind::Conflict,
            AdminError::ArithmeticOverflow { .. }
            | AdminError::PasswordHash { .. }
            | AdminError::IoError { .. } => ErrorKind::Internal,
        }
    }
}

impl From<std::io::Error> for AdminError {
    fn from(error: std::io::Error) -> Self {
        AdminError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for AdminError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        AdminError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl AdminError {
    pub fn account_not_found(account: impl fmt::Display) -> Self {
        AdminError::AccountNotFound {
            account: account.to_string(),
        }
    }

    pub fn permission_denied(action: &str, reason: impl Into<String>) -> Self {
        AdminError::PermissionDenied {
            action: action.to_string(),
            reason: reason.into(),
        }
    }

    pub fn insufficient_funds(account: AccountId, available: Decimal, requested: Decimal) -> Self {
        AdminError::InsufficientFunds {
            account,
            available,
            requested,
        }
    }

    pub fn invalid_amount(amount: impl fmt::Display) -> Self {
        AdminError::InvalidAmount {
            amount: amount.to_string(),
        }
    }

    pub fn unknown_role(role: &str) -> Self {
        AdminError::UnknownRole {
            role: role.to_string(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        AdminError::MissingField {
            field: field.to_string(),
        }
    }

    pub fn invalid_operation(op: &str) -> Self {
        AdminError::InvalidOperation { op: op.to_string() }
    }

    pub fn already_in_state(account: AccountId, status: AccountStatus) -> Self {
        AdminError::AlreadyInState { account, status }
    }

    pub fn duplicate_field(field: &str, value: &str) -> Self {
        AdminError::DuplicateField {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        AdminError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }
}
