//! Role types for the admin ledger
//!
//! Every principal carries exactly one of six roles. The roles form a total
//! order from most to least privileged; that order lives in
//! [`crate::core::hierarchy`] and nowhere else.

use super::error::AdminError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Principal role
///
/// Serialized with the human-readable names used by the admin panel
/// (`"Mother Admin"`, `"Sub Agent"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Mother Admin")]
    MotherAdmin,
    #[serde(rename = "Sub Admin")]
    SubAdmin,
    Master,
    Agent,
    #[serde(rename = "Sub Agent")]
    SubAgent,
    User,
}

impl Role {
    /// Display name, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::MotherAdmin => "Mother Admin",
            Role::SubAdmin => "Sub Admin",
            Role::Master => "Master",
            Role::Agent => "Agent",
            Role::SubAgent => "Sub Agent",
            Role::User => "User",
        }
    }

    pub fn is_mother_admin(&self) -> bool {
        matches!(self, Role::MotherAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AdminError;

    /// Parse a role name
    ///
    /// Matching ignores case and surrounding whitespace, and accepts
    /// `-`/`_` in place of the space (`"sub_agent"`, `"mother-admin"`).
    /// Anything else is an [`AdminError::UnknownRole`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "mother admin" => Ok(Role::MotherAdmin),
            "sub admin" => Ok(Role::SubAdmin),
            "master" => Ok(Role::Master),
            "agent" => Ok(Role::Agent),
            "sub agent" => Ok(Role::SubAgent),
            "user" => Ok(Role::User),
            _ => Err(AdminError::unknown_role(s)),
        }
    }
}
