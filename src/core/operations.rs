//! Applying operation rows to an [`AdminService`]
//!
//! Rows name accounts by username (a login row may use an email instead), so
//! each row is resolved to account ids here and routed to the matching
//! service operation.

use crate::core::service::AdminService;
use crate::core::traits::{AccountStore, Clock, Ledger};
use crate::types::{
    Account, AdminError, Direction, NewAccount, Operation, OperationRecord, ProfileUpdate,
    StatusAction,
};

impl<S: AccountStore, L: Ledger, C: Clock> AdminService<S, L, C> {
    /// Apply one operation row
    ///
    /// # Errors
    ///
    /// - `MissingField` if a column the operation needs is empty
    /// - `AccountNotFound` if the actor or target username is unknown
    ///   (an unknown editor on `update` is `Unauthorized` instead)
    /// - Any error of the underlying operation
    pub fn apply(&self, record: &OperationRecord) -> Result<(), AdminError> {
        match record.op {
            Operation::Signup => {
                self.create_account(NewAccount {
                    username: record.target.clone(),
                    email: required(&record.email, "email")?.to_string(),
                    fullname: record.fullname.clone(),
                    password: required(&record.password, "password")?.to_string(),
                    role: record.role.ok_or_else(|| AdminError::missing_field("role"))?,
                })?;
            }
            Operation::Login => {
                self.login(&record.target, required(&record.password, "password")?)?;
            }
            Operation::Credit | Operation::Add | Operation::Minus => {
                let direction = match record.op {
                    Operation::Credit => Direction::Credit,
                    Operation::Minus => Direction::Minus,
                    _ => Direction::Add,
                };
                let amount = record
                    .amount
                    .ok_or_else(|| AdminError::missing_field("amount"))?;
                let actor = self.actor(record)?;
                let target = self.target(record)?;
                self.transfer(actor.id, target.id, amount, direction)?;
            }
            Operation::Activate | Operation::Deactivate => {
                let action = if record.op == Operation::Activate {
                    StatusAction::Activate
                } else {
                    StatusAction::Deactivate
                };
                let actor = self.actor(record)?;
                let target = self.target(record)?;
                self.set_status(actor.role, target.id, action)?;
            }
            Operation::Ban => {
                let actor = self.actor(record)?;
                let target = self.target(record)?;
                self.ban(actor.role, target.id)?;
            }
            Operation::Update => {
                let editor = record
                    .actor
                    .as_deref()
                    .and_then(|username| self.store().find_by_username(username))
                    .map(|account| account.id);
                let target = self.target(record)?;
                self.update_profile(
                    editor,
                    target.id,
                    ProfileUpdate {
                        username: None,
                        email: record.email.clone(),
                        fullname: record.fullname.clone(),
                        password: record.password.clone(),
                        role: record.role,
                    },
                )?;
            }
        }
        Ok(())
    }

    fn actor(&self, record: &OperationRecord) -> Result<Account, AdminError> {
        let username = required(&record.actor, "actor")?;
        self.store()
            .find_by_username(username)
            .ok_or_else(|| AdminError::account_not_found(username))
    }

    fn target(&self, record: &OperationRecord) -> Result<Account, AdminError> {
        self.store()
            .find_by_username(&record.target)
            .ok_or_else(|| AdminError::account_not_found(&record.target))
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AdminError> {
    value
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AdminError::missing_field(field))
}
