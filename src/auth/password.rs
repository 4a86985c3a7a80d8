//! Password hashing
//!
//! Thin wrapper over bcrypt; verification is constant-time and salted by
//! the stored hash.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    HashFailed(String),
}

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| PasswordError::HashFailed(e.to_string()))
}

/// Check a plaintext password against a stored hash.
///
/// A malformed stored hash counts as a mismatch rather than an error; the
/// caller reports the same generic failure either way.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}
