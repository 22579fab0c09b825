//! Admin service facade
//!
//! [`AdminService`] wires the account store, ledger and clock into the
//! transfer engine, status manager and authenticator, and exposes every
//! operation of the subsystem through one handle.
//!
//! # Architecture
//!
//! ```text
//! AdminService
//!     ├── TransferEngine   (store + ledger + clock)
//!     ├── StatusManager    (store)
//!     ├── Authenticator    (store + clock)
//!     └── Arc<L>           (ledger queries)
//! ```
//!
//! All collaborators are passed in at construction; nothing is global.

use crate::core::account_store::InMemoryAccountStore;
use crate::core::auth::Authenticator;
use crate::core::clock::SystemClock;
use crate::core::ledger::InMemoryLedger;
use crate::core::status::StatusManager;
use crate::core::traits::{AccountStore, Clock, Ledger};
use crate::core::transfer::TransferEngine;
use crate::types::{
    AccountId, AccountStatus, AccountView, AdminError, Direction, NewAccount, ProfileUpdate, Role,
    StatusAction, TransactionRecord,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Service wired to the in-memory store and ledger and the wall clock
pub type InMemoryAdminService = AdminService<InMemoryAccountStore, InMemoryLedger, SystemClock>;

/// Entry point for account, status, transfer and ledger operations
#[derive(Debug)]
pub struct AdminService<S, L, C> {
    store: Arc<S>,
    ledger: Arc<L>,
    transfers: TransferEngine<S, L, C>,
    status: StatusManager<S>,
    auth: Authenticator<S, C>,
}

impl<S, L, C> Clone for AdminService<S, L, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ledger: Arc::clone(&self.ledger),
            transfers: self.transfers.clone(),
            status: self.status.clone(),
            auth: self.auth.clone(),
        }
    }
}

impl InMemoryAdminService {
    /// Fresh service with empty in-memory storage
    pub fn in_memory() -> Self {
        AdminService::new(
            Arc::new(InMemoryAccountStore::new()),
            Arc::new(InMemoryLedger::new()),
            Arc::new(SystemClock),
        )
    }
}

impl<S: AccountStore, L: Ledger, C: Clock> AdminService<S, L, C> {
    pub fn new(store: Arc<S>, ledger: Arc<L>, clock: Arc<C>) -> Self {
        Self {
            transfers: TransferEngine::new(
                Arc::clone(&store),
                Arc::clone(&ledger),
                Arc::clone(&clock),
            ),
            status: StatusManager::new(Arc::clone(&store)),
            auth: Authenticator::new(Arc::clone(&store), clock),
            store,
            ledger,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    // Accounts

    pub fn create_account(&self, new_account: NewAccount) -> Result<AccountView, AdminError> {
        self.auth.create_account(new_account)
    }

    pub fn login(&self, identifier: &str, password: &str) -> Result<AccountView, AdminError> {
        self.auth.login(identifier, password)
    }

    pub fn login_with_email(&self, email: &str, password: &str) -> Result<AccountView, AdminError> {
        self.auth.login_with_email(email, password)
    }

    pub fn login_with_username(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccountView, AdminError> {
        self.auth.login_with_username(username, password)
    }

    pub fn list_accounts(&self) -> Vec<AccountView> {
        self.auth.list_accounts()
    }

    pub fn account(&self, id: AccountId) -> Result<AccountView, AdminError> {
        self.auth.account(id)
    }

    pub fn account_by_email(&self, email: &str) -> Result<AccountView, AdminError> {
        self.auth.account_by_email(email)
    }

    pub fn account_by_username(&self, username: &str) -> Result<AccountView, AdminError> {
        self.auth.account_by_username(username)
    }

    // Money movement

    pub fn transfer(
        &self,
        actor_id: AccountId,
        target_id: AccountId,
        amount: Decimal,
        direction: Direction,
    ) -> Result<TransactionRecord, AdminError> {
        self.transfers
            .transfer(actor_id, target_id, amount, direction)
    }

    pub fn credit(
        &self,
        actor_id: AccountId,
        target_id: AccountId,
        amount: Decimal,
    ) -> Result<TransactionRecord, AdminError> {
        self.transfers.credit(actor_id, target_id, amount)
    }

    // Status and profile

    pub fn set_status(
        &self,
        actor_role: Role,
        target_id: AccountId,
        action: StatusAction,
    ) -> Result<AccountStatus, AdminError> {
        self.status.set_status(actor_role, target_id, action)
    }

    pub fn ban(&self, actor_role: Role, target_id: AccountId) -> Result<AccountStatus, AdminError> {
        self.status.ban(actor_role, target_id)
    }

    pub fn update_profile(
        &self,
        editor_id: Option<AccountId>,
        target_id: AccountId,
        update: ProfileUpdate,
    ) -> Result<AccountView, AdminError> {
        self.status.update_profile(editor_id, target_id, update)
    }

    // Ledger

    /// Up to `limit` ledger records, newest first
    pub fn recent_transactions(&self, limit: usize) -> Vec<TransactionRecord> {
        self.ledger.recent(limit)
    }

    /// Ledger records involving `account` on either side, newest first
    pub fn transactions_for(&self, account: AccountId) -> Vec<TransactionRecord> {
        self.ledger.for_account(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    fn signup(service: &InMemoryAdminService, username: &str, role: Role) -> AccountView {
        service
            .create_account(NewAccount {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                fullname: None,
                password: format!("{}-password", username),
                role,
            })
            .unwrap()
    }

    #[test]
    fn test_end_to_end_money_flow() {
        let service = AdminService::in_memory();
        let root = signup(&service, "root", Role::MotherAdmin);
        let master = signup(&service, "master", Role::Master);
        let user = signup(&service, "user", Role::User);

        service.credit(root.id, root.id, Decimal::new(1000, 0)).unwrap();
        service
            .transfer(root.id, master.id, Decimal::new(300, 0), Direction::Add)
            .unwrap();
        service
            .transfer(master.id, user.id, Decimal::new(120, 0), Direction::Add)
            .unwrap();
        service
            .transfer(root.id, user.id, Decimal::new(20, 0), Direction::Minus)
            .unwrap();

        assert_eq!(service.account(root.id).unwrap().balance, Decimal::new(720, 0));
        assert_eq!(service.account(master.id).unwrap().balance, Decimal::new(180, 0));
        assert_eq!(service.account(user.id).unwrap().balance, Decimal::new(100, 0));

        let recent = service.recent_transactions(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].direction, Direction::Minus);
        assert_eq!(recent[1].direction, Direction::Add);

        let for_master = service.transactions_for(master.id);
        assert_eq!(for_master.len(), 2);
        assert_eq!(service.ledger().len(), 4);
    }

    #[test]
    fn test_deactivated_actor_regains_rights_after_reactivation() {
        let service = AdminService::in_memory();
        let root = signup(&service, "root", Role::MotherAdmin);
        let agent = signup(&service, "agent", Role::Agent);
        let user = signup(&service, "user", Role::User);
        service.credit(root.id, agent.id, Decimal::new(50, 0)).unwrap();

        service
            .set_status(Role::Master, agent.id, StatusAction::Deactivate)
            .unwrap();
        let err = service
            .transfer(agent.id, user.id, Decimal::ONE, Direction::Add)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        service
            .set_status(Role::Master, agent.id, StatusAction::Activate)
            .unwrap();
        service
            .transfer(agent.id, user.id, Decimal::ONE, Direction::Add)
            .unwrap();
    }

    #[test]
    fn test_login_through_service() {
        let service = AdminService::in_memory();
        let root = signup(&service, "root", Role::MotherAdmin);

        let view = service.login("root@example.com", "root-password").unwrap();
        assert_eq!(view.id, root.id);
        assert!(view.last_login.is_some());

        service.ban(Role::MotherAdmin, root.id).unwrap();
        let err = service.login_with_username("root", "root-password").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }
}
