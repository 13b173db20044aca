use std::sync::OnceLock;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use crate::error::AuthError;

// 19 MiB, 2 passes, 1 lane.
const MEMORY_KIB: u32 = 19_456;
const ITERATIONS: u32 = 2;
const PARALLELISM: u32 = 1;

fn hasher() -> Result<Argon2<'static>, AuthError> {
    let params = Params::new(MEMORY_KIB, ITERATIONS, PARALLELISM, None)
        .map_err(|e| AuthError::Internal(format!("Invalid Argon2 parameters: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a plaintext password into a salted Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a plaintext password against a stored digest.
///
/// Fails closed: a malformed digest or any hashing error is a mismatch.
pub fn verify_password(password: &str, digest: &str) -> bool {
    let parsed = match PasswordHash::new(digest) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "stored password digest is malformed");
            return false;
        }
    };

    let argon2 = match hasher() {
        Ok(argon2) => argon2,
        Err(e) => {
            tracing::warn!(error = %e, "password verification unavailable");
            return false;
        }
    };

    argon2.verify_password(password.as_bytes(), &parsed).is_ok()
}

/// Spend one verification against a throwaway digest.
///
/// Used when there is no stored digest to check, so unknown accounts cost
/// the same as wrong passwords.
pub fn burn_verification(password: &str) {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();

    if let Some(digest) = DUMMY.get_or_init(|| hash_password("eduquest-timing-equalizer").ok()) {
        let _ = verify_password(password, digest);
    }
}
