use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use rand::rngs::OsRng;

use crate::domain::TaskdeckError;

pub fn hash_password(password: &str) -> Result<String, TaskdeckError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| TaskdeckError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// A malformed stored hash is an internal error; a wrong password is `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, TaskdeckError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| TaskdeckError::Internal(format!("Invalid stored password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
