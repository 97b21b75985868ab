//! Credential and token primitives
//!
//! Pure functions only; the HTTP middleware that applies them lives in
//! the server crate.
//!
//! # Password storage
//!
//! Argon2id PHC strings (`$argon2id$v=19$...`). The salt and parameters
//! travel inside the string, so verification needs nothing else.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Session lifetime in days
pub const SESSION_TTL_DAYS: i64 = 30;

/// Prefix of the `Authorization` header value
pub const BEARER_PREFIX: &str = "Bearer ";

/// Generate an opaque session token (256 bits, hex encoded)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a password with Argon2id and a fresh random salt
///
/// ```
/// use lfdb_common::api::auth::{hash_password, verify_password};
///
/// let hash = hash_password("hunter2").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// assert!(verify_password("hunter2", &hash));
/// ```
pub fn hash_password(password: &str) -> Result<String> {
    // m=19456 KiB, t=2, p=1
    let params = Params::new(19456, 2, 1, None)
        .map_err(|e| Error::Internal(format!("Invalid Argon2 params: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a candidate password against a stored PHC hash
///
/// Unparseable or empty hashes never verify.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Extract the token from an `Authorization: Bearer <token>` value
pub fn parse_bearer(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Check a cron trigger against the configured secret
///
/// With no secret configured every trigger is accepted (development
/// mode). Otherwise the header must be exactly `Bearer <secret>`.
pub fn cron_request_allowed(header_value: Option<&str>, secret: Option<&str>) -> bool {
    match secret {
        None => true,
        Some(secret) => match header_value {
            // Digests keep the comparison length independent of the input
            Some(value) => {
                let expected = format!("{}{}", BEARER_PREFIX, secret);
                sha256_hex(value) == sha256_hex(&expected)
            }
            None => false,
        },
    }
}
