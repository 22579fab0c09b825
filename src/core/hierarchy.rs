//! Role hierarchy policy
//!
//! The single source of truth for who may act on whom. Every gated operation
//! (profile edit, activate/deactivate/ban, transfer) consults these functions;
//! nothing else in the crate orders roles.
//!
//! ```text
//! rank 0  Mother Admin
//! rank 1  Sub Admin
//! rank 2  Master
//! rank 3  Agent
//! rank 4  Sub Agent
//! rank 5  User
//! ```
//!
//! A role's downstream set is every role strictly below it. The functions are
//! pure and stateless.

use crate::types::{AdminError, Role};

/// Roles from highest to lowest privilege
pub const HIERARCHY: [Role; 6] = [
    Role::MotherAdmin,
    Role::SubAdmin,
    Role::Master,
    Role::Agent,
    Role::SubAgent,
    Role::User,
];

/// Position of `role` in [`HIERARCHY`]; 0 is the most privileged
pub fn rank(role: Role) -> usize {
    HIERARCHY
        .iter()
        .position(|candidate| *candidate == role)
        .unwrap_or(HIERARCHY.len())
}

/// Rank of a role given by name
///
/// # Errors
///
/// Returns [`AdminError::UnknownRole`] when the name is not one of the six
/// roles. Unknown roles are rejected, never ranked below everything else.
pub fn rank_of(role_name: &str) -> Result<usize, AdminError> {
    role_name.parse::<Role>().map(rank)
}

/// Roles strictly below `role`
pub fn downstream(role: Role) -> &'static [Role] {
    let start = (rank(role) + 1).min(HIERARCHY.len());
    &HIERARCHY[start..]
}

/// Whether `editor` may edit or change the status of an account holding `target`
///
/// Strict seniority is required: a role never modifies its own rank.
pub fn can_modify(editor: Role, target: Role) -> bool {
    rank(editor) < rank(target)
}

/// Whether `actor` may send funds to an account holding `target`
///
/// Mother Admin may send to anyone, peers included. Every other role may send
/// only to its downstream set.
pub fn can_transfer_to(actor: Role, target: Role) -> bool {
    in_downstream_or_mother_admin(actor, target)
}

/// Whether `actor` may activate or deactivate an account holding `target`
pub fn can_manage_status(actor: Role, target: Role) -> bool {
    in_downstream_or_mother_admin(actor, target)
}

fn in_downstream_or_mother_admin(actor: Role, target: Role) -> bool {
    actor.is_mother_admin() || downstream(actor).contains(&target)
}
