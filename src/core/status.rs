//! Status and profile management
//!
//! Activate, deactivate and ban operations plus profile edits. All of them
//! are gated by [`crate::core::hierarchy`] and none of them move money.

use crate::core::hierarchy;
use crate::core::password::hash_password;
use crate::core::traits::AccountStore;
use crate::types::{
    AccountId, AccountStatus, AccountView, AdminError, ProfileUpdate, Role, StatusAction,
};
use std::sync::Arc;
use tracing::info;

/// Applies status changes and profile edits to stored accounts
#[derive(Debug)]
pub struct StatusManager<S> {
    store: Arc<S>,
}

impl<S> Clone for StatusManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AccountStore> StatusManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Activate or deactivate an account
    ///
    /// Permitted when the actor is a Mother Admin or the target's role is in
    /// the actor's downstream set. A banned account stays banned unless a
    /// Mother Admin changes it.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the target does not exist
    /// - `PermissionDenied` if the hierarchy forbids it or the target is
    ///   banned and the actor is not a Mother Admin
    /// - `AlreadyInState` if the target already has the requested status
    pub fn set_status(
        &self,
        actor_role: Role,
        target_id: AccountId,
        action: StatusAction,
    ) -> Result<AccountStatus, AdminError> {
        let status = action.target_status();

        self.store.update(target_id, |target| {
            if !hierarchy::can_manage_status(actor_role, target.role) {
                return Err(AdminError::permission_denied(
                    action.as_str(),
                    format!("{} cannot manage {}", actor_role, target.role),
                ));
            }
            if target.status == AccountStatus::Banned && !actor_role.is_mother_admin() {
                return Err(AdminError::permission_denied(
                    action.as_str(),
                    "only Mother Admin may lift a ban",
                ));
            }
            change_status(target.id, &mut target.status, status)
        })?;

        info!(account = %target_id, actor_role = %actor_role, %status, "status changed");
        Ok(status)
    }

    /// Ban an account; Mother Admin only
    pub fn ban(&self, actor_role: Role, target_id: AccountId) -> Result<AccountStatus, AdminError> {
        if !actor_role.is_mother_admin() {
            return Err(AdminError::permission_denied(
                "ban",
                "only Mother Admin may ban accounts",
            ));
        }

        self.store.update(target_id, |target| {
            change_status(target.id, &mut target.status, AccountStatus::Banned)
        })?;

        info!(account = %target_id, "account banned");
        Ok(AccountStatus::Banned)
    }

    /// Edit a profile on behalf of a strictly senior editor
    ///
    /// Fields left as `None` are untouched and an empty password never
    /// overwrites the stored hash. A role change must also land strictly
    /// below the editor, so an editor can never promote anyone to their own
    /// rank or above.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if no editor is given or the editor id is unknown
    /// - `AccountNotFound` if the target does not exist
    /// - `PermissionDenied` if the editor is not strictly senior
    /// - `MissingField` if a username or email is set to blank
    /// - `DuplicateField` if the new username or email is taken
    /// - `NoChanges` if no field would change
    pub fn update_profile(
        &self,
        editor_id: Option<AccountId>,
        target_id: AccountId,
        update: ProfileUpdate,
    ) -> Result<AccountView, AdminError> {
        let editor_id = editor_id.ok_or(AdminError::Unauthorized)?;
        let editor = self.store.get(editor_id).ok_or(AdminError::Unauthorized)?;

        // Hash outside the account lock; argon2 is deliberately slow
        let password_hash = update.new_password().map(hash_password).transpose()?;

        let view = self.store.update(target_id, |target| {
            if !hierarchy::can_modify(editor.role, target.role) {
                return Err(AdminError::permission_denied(
                    "update",
                    format!("{} cannot edit {}", editor.role, target.role),
                ));
            }

            let mut changed = false;

            if let Some(role) = update.role {
                if role != target.role {
                    if !hierarchy::can_modify(editor.role, role) {
                        return Err(AdminError::permission_denied(
                            "update",
                            format!("{} cannot assign role {}", editor.role, role),
                        ));
                    }
                    target.role = role;
                    changed = true;
                }
            }

            if let Some(username) = &update.username {
                changed |= replace_field(&mut target.username, username, "username")?;
            }
            if let Some(email) = &update.email {
                changed |= replace_field(&mut target.email, email, "email")?;
            }
            if let Some(fullname) = &update.fullname {
                let fullname = fullname.trim();
                if target.fullname != fullname {
                    target.fullname = fullname.to_string();
                    changed = true;
                }
            }
            if let Some(hash) = password_hash {
                target.password_hash = hash;
                changed = true;
            }

            if !changed {
                return Err(AdminError::NoChanges { account: target.id });
            }
            Ok(target.view())
        })?;

        info!(account = %target_id, editor = %editor.username, "profile updated");
        Ok(view)
    }
}

fn change_status(
    account: AccountId,
    current: &mut AccountStatus,
    requested: AccountStatus,
) -> Result<(), AdminError> {
    if *current == requested {
        return Err(AdminError::already_in_state(account, requested));
    }
    *current = requested;
    Ok(())
}

/// Set a required identity field, returning whether it changed
fn replace_field(current: &mut String, value: &str, field: &str) -> Result<bool, AdminError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AdminError::missing_field(field));
    }
    if current == value {
        return Ok(false);
    }
    *current = value.to_string();
    Ok(true)
}
