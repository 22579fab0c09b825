//! Account creation, login and account lookups

use crate::core::password::{hash_password, verify_password, verify_unowned};
use crate::core::traits::{AccountStore, Clock};
use crate::types::{Account, AccountId, AccountView, AdminError, NewAccount};
use std::sync::Arc;
use tracing::{info, warn};

/// Signup, admin-side account creation and authentication
#[derive(Debug)]
pub struct Authenticator<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> Clone for Authenticator<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: AccountStore, C: Clock> Authenticator<S, C> {
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Create an account with zero balance and `Activated` status
    ///
    /// # Errors
    ///
    /// - `MissingField` if username, email or password is blank
    /// - `DuplicateField` if the email or username is already registered
    pub fn create_account(&self, new_account: NewAccount) -> Result<AccountView, AdminError> {
        for (field, value) in [
            ("username", &new_account.username),
            ("email", &new_account.email),
            ("password", &new_account.password),
        ] {
            if value.trim().is_empty() {
                return Err(AdminError::missing_field(field));
            }
        }

        // Cheap pre-check so duplicates don't pay for a hash; insert re-checks
        let email = new_account.email.trim();
        if self.store.find_by_email(email).is_some() {
            return Err(AdminError::duplicate_field("email", email));
        }
        if self.store.find_by_username(&new_account.username).is_some() {
            return Err(AdminError::duplicate_field(
                "username",
                new_account.username.trim(),
            ));
        }

        let password_hash = hash_password(&new_account.password)?;
        let account = self.store.insert(Account::new(
            new_account,
            password_hash,
            self.clock.now(),
        ))?;

        info!(account = %account.id, username = %account.username, role = %account.role, "account created");
        Ok(account.view())
    }

    /// Log in with an exact email address
    pub fn login_with_email(&self, email: &str, password: &str) -> Result<AccountView, AdminError> {
        self.authenticate(self.store.find_by_email(email), password)
    }

    /// Log in with a username, ignoring case and surrounding whitespace
    pub fn login_with_username(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccountView, AdminError> {
        self.authenticate(self.store.find_by_username(username), password)
    }

    /// Log in with either an email or a username
    ///
    /// An exact email match wins over a username match.
    pub fn login(&self, identifier: &str, password: &str) -> Result<AccountView, AdminError> {
        let account = self
            .store
            .find_by_email(identifier)
            .or_else(|| self.store.find_by_username(identifier));
        self.authenticate(account, password)
    }

    /// Every account, oldest first, ties broken by username
    pub fn list_accounts(&self) -> Vec<AccountView> {
        let mut accounts = self.store.all();
        accounts.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.username.cmp(&b.username))
        });
        accounts.iter().map(AccountView::from).collect()
    }

    pub fn account(&self, id: AccountId) -> Result<AccountView, AdminError> {
        self.store
            .get(id)
            .map(|account| account.view())
            .ok_or_else(|| AdminError::account_not_found(id))
    }

    pub fn account_by_email(&self, email: &str) -> Result<AccountView, AdminError> {
        self.store
            .find_by_email(email)
            .map(|account| account.view())
            .ok_or_else(|| AdminError::account_not_found(email))
    }

    pub fn account_by_username(&self, username: &str) -> Result<AccountView, AdminError> {
        self.store
            .find_by_username(username)
            .map(|account| account.view())
            .ok_or_else(|| AdminError::account_not_found(username.trim()))
    }

    fn authenticate(
        &self,
        account: Option<Account>,
        password: &str,
    ) -> Result<AccountView, AdminError> {
        let Some(account) = account else {
            verify_unowned(password);
            return Err(AdminError::InvalidCredentials);
        };
        if !verify_password(password, &account.password_hash) {
            return Err(AdminError::InvalidCredentials);
        }

        if !account.is_active() {
            warn!(account = %account.id, status = %account.status, "login refused");
            return Err(AdminError::permission_denied(
                "login",
                format!("account is {}", account.status),
            ));
        }

        let now = self.clock.now();
        let view = self.store.update(account.id, |account| {
            account.last_login = Some(now);
            Ok(account.view())
        })?;

        info!(account = %view.id, username = %view.username, "login succeeded");
        Ok(view)
    }
}
