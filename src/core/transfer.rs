//! Transfer engine
//!
//! This module provides the [`TransferEngine`], which moves money between
//! accounts on behalf of an actor.
//!
//! The engine enforces:
//! - Positive amounts and no self-transfers
//! - Role hierarchy permissions (via [`crate::core::hierarchy`])
//! - Sufficient funds on the paying side
//! - One atomic unit for both balance writes and the ledger append
//!
//! # Directions
//!
//! | direction | who pays | who is credited | who may do it |
//! |---|---|---|---|
//! | `add` | actor | target | actor whose downstream set holds the target role; Mother Admin always |
//! | `minus` | target | actor | Mother Admin only (claw-back) |
//! | `credit` | nobody | target | Mother Admin only |
//!
//! The ledger record always names the actor as `from` and the target as
//! `to`, whichever way the money moved.

use crate::core::hierarchy;
use crate::core::traits::{AccountStore, Clock, Ledger};
use crate::types::{
    Account, AccountId, AccountStatus, AdminError, Direction, NewTransaction, TransactionRecord,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// Balance movement orchestrator
///
/// Cheap to clone; clones share the same store, ledger and clock.
#[derive(Debug)]
pub struct TransferEngine<S, L, C> {
    store: Arc<S>,
    ledger: Arc<L>,
    clock: Arc<C>,
}

impl<S, L, C> Clone for TransferEngine<S, L, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ledger: Arc::clone(&self.ledger),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: AccountStore, L: Ledger, C: Clock> TransferEngine<S, L, C> {
    pub fn new(store: Arc<S>, ledger: Arc<L>, clock: Arc<C>) -> Self {
        Self {
            store,
            ledger,
            clock,
        }
    }

    /// Move `amount` between actor and target
    ///
    /// # Arguments
    ///
    /// * `actor_id` - Account performing the operation
    /// * `target_id` - Counterparty
    /// * `amount` - Positive amount
    /// * `direction` - `Add` (actor pays target) or `Minus` (target pays actor);
    ///   `Credit` is forwarded to [`TransferEngine::credit`]
    ///
    /// # Returns
    ///
    /// The ledger record written for the transfer.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not positive (`InvalidAmount`)
    /// - Actor and target are the same account (`SelfTransfer`)
    /// - Either account does not exist (`AccountNotFound`)
    /// - The role hierarchy or account status forbids it (`PermissionDenied`)
    /// - The paying account cannot cover the amount (`InsufficientFunds`)
    ///
    /// On any error no balance changes and nothing is appended to the ledger.
    pub fn transfer(
        &self,
        actor_id: AccountId,
        target_id: AccountId,
        amount: Decimal,
        direction: Direction,
    ) -> Result<TransactionRecord, AdminError> {
        if direction == Direction::Credit {
            return self.credit(actor_id, target_id, amount);
        }

        validate_amount(amount)?;
        if actor_id == target_id {
            return Err(AdminError::SelfTransfer { account: actor_id });
        }

        let record = self
            .store
            .update_pair(actor_id, target_id, |actor, target| {
                authorize_transfer(actor, target, direction)?;

                let (payer, payee) = match direction {
                    Direction::Minus => (&mut *target, &mut *actor),
                    _ => (&mut *actor, &mut *target),
                };
                move_funds(payer, payee, amount, direction)?;

                // Last fallible step, so a failed append leaves balances untouched
                self.ledger.append(NewTransaction {
                    from: actor.snapshot(),
                    to: target.snapshot(),
                    amount,
                    direction,
                    created_at: self.clock.now(),
                })
            })?;

        info!(
            transaction = record.id,
            from = %record.from.username,
            to = %record.to.username,
            %amount,
            %direction,
            "transfer committed"
        );

        Ok(record)
    }

    /// Credit `amount` to the target without debiting anyone
    ///
    /// Only an active Mother Admin may credit. Crediting their own account is
    /// allowed and is how the system's funds are seeded.
    pub fn credit(
        &self,
        actor_id: AccountId,
        target_id: AccountId,
        amount: Decimal,
    ) -> Result<TransactionRecord, AdminError> {
        validate_amount(amount)?;

        let record = if actor_id == target_id {
            self.store.update(actor_id, |actor| {
                authorize_credit(actor, actor)?;
                actor.balance = credited(actor, amount)?;
                self.ledger.append(self.credit_record(actor, actor, amount))
            })?
        } else {
            self.store
                .update_pair(actor_id, target_id, |actor, target| {
                    authorize_credit(actor, target)?;
                    target.balance = credited(target, amount)?;
                    self.ledger.append(self.credit_record(actor, target, amount))
                })?
        };

        info!(
            transaction = record.id,
            by = %record.from.username,
            to = %record.to.username,
            %amount,
            "credit committed"
        );

        Ok(record)
    }

    fn credit_record(&self, actor: &Account, target: &Account, amount: Decimal) -> NewTransaction {
        NewTransaction {
            from: actor.snapshot(),
            to: target.snapshot(),
            amount,
            direction: Direction::Credit,
            created_at: self.clock.now(),
        }
    }
}

/// Amounts must be strictly positive
fn validate_amount(amount: Decimal) -> Result<(), AdminError> {
    if amount <= Decimal::ZERO {
        return Err(AdminError::invalid_amount(amount));
    }
    Ok(())
}

fn authorize_transfer(
    actor: &Account,
    target: &Account,
    direction: Direction,
) -> Result<(), AdminError> {
    let action = direction.as_str();

    if !actor.is_active() {
        return Err(AdminError::permission_denied(
            action,
            format!("actor account is {}", actor.status),
        ));
    }

    match direction {
        Direction::Minus if !actor.role.is_mother_admin() => Err(AdminError::permission_denied(
            action,
            "only Mother Admin may claw back funds",
        )),
        Direction::Add if !hierarchy::can_transfer_to(actor.role, target.role) => {
            Err(AdminError::permission_denied(
                action,
                format!("{} cannot send funds to {}", actor.role, target.role),
            ))
        }
        Direction::Add if target.status == AccountStatus::Banned => Err(
            AdminError::permission_denied(action, "target account is banned"),
        ),
        _ => Ok(()),
    }
}

fn authorize_credit(actor: &Account, target: &Account) -> Result<(), AdminError> {
    if !actor.role.is_mother_admin() {
        return Err(AdminError::permission_denied(
            "credit",
            "only Mother Admin may credit balances",
        ));
    }
    if !actor.is_active() {
        return Err(AdminError::permission_denied(
            "credit",
            format!("actor account is {}", actor.status),
        ));
    }
    if target.status == AccountStatus::Banned {
        return Err(AdminError::permission_denied(
            "credit",
            "target account is banned",
        ));
    }
    Ok(())
}

fn move_funds(
    payer: &mut Account,
    payee: &mut Account,
    amount: Decimal,
    direction: Direction,
) -> Result<(), AdminError> {
    if payer.balance < amount {
        return Err(AdminError::insufficient_funds(
            payer.id,
            payer.balance,
            amount,
        ));
    }

    let payer_balance = payer
        .balance
        .checked_sub(amount)
        .ok_or_else(|| AdminError::arithmetic_overflow(direction.as_str(), payer.id))?;
    let payee_balance = payee
        .balance
        .checked_add(amount)
        .ok_or_else(|| AdminError::arithmetic_overflow(direction.as_str(), payee.id))?;

    payer.balance = payer_balance;
    payee.balance = payee_balance;

    Ok(())
}

fn credited(target: &Account, amount: Decimal) -> Result<Decimal, AdminError> {
    target
        .balance
        .checked_add(amount)
        .ok_or_else(|| AdminError::arithmetic_overflow("credit", target.id))
}
