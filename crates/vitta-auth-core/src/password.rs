//! Password hashing and verification
//!
//! Argon2id with a random per-call salt, producing PHC-format digests.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::AuthError;

/// Hash a password with Argon2id and a fresh random salt.
///
/// Accepts empty and arbitrary-length unicode input.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!("password hashing failed: {}", e);
            AuthError::Internal("password hashing failed".to_string())
        })?;

    Ok(hash.to_string())
}

/// Verify a password against a stored digest.
///
/// A malformed digest verifies as `false`; this function never panics on
/// well-formed string input.
pub fn verify_password(password: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        tracing::debug!("stored password digest is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
