//! Password hashing
//!
//! Passwords are stored as Argon2id PHC strings with a random per-password
//! salt. Verification goes through `PasswordVerifier`, which compares in
//! constant time.

use crate::types::{AdminError, PasswordHashString};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2 with default parameters
pub fn hash_password(password: &str) -> Result<PasswordHashString, AdminError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AdminError::PasswordHash {
            message: e.to_string(),
        })?
        .to_string();

    Ok(PasswordHashString::new(hash))
}

/// Well-formed Argon2id hash with default parameters that no account owns
const UNOWNED_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Run a full verification for a login whose identifier matched nothing
///
/// Costs the same as a real verification and never succeeds.
pub fn verify_unowned(password: &str) -> bool {
    verify_password(password, &PasswordHashString::new(UNOWNED_HASH.to_string()))
}

/// Check a password against a stored hash
///
/// Returns `false` for a mismatch and for a hash that cannot be parsed; the
/// caller reports both as invalid credentials.
pub fn verify_password(password: &str, hash: &PasswordHashString) -> bool {
    let Ok(parsed) = PasswordHash::new(hash.as_str()) else {
        tracing::error!("stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
