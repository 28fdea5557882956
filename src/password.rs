// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing with argon2id.
//!
//! Hashes are stored in PHC string form, so the salt and the cost parameters
//! travel with the hash and old rows keep verifying after a cost change.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::AuthxError;

/// Shortest password accepted at the admission boundary.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Hash and verify capability.
#[derive(Clone)]
pub struct Password {
    params: Params,
}

impl Default for Password {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Password {
    /// Custom cost: memory in KiB and iteration count.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, AuthxError> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| AuthxError::internal(format!("invalid argon2 cost: {e}")))?;
        Ok(Self { params })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, AuthxError> {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
            .map_err(|e| AuthxError::internal(format!("salt encoding failed: {e}")))?;
        self.hasher()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| {
                tracing::error!(error = %e, "password hashing failed");
                AuthxError::internal("password hashing failed")
            })
    }

    /// Constant-time comparison. A mismatch is `Unauthenticated`.
    pub fn verify(&self, hash: &str, plaintext: &str) -> Result<(), AuthxError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            tracing::error!(error = %e, "stored password hash is unreadable");
            AuthxError::internal("stored password hash is unreadable")
        })?;
        self.hasher()
            .verify_password(plaintext.as_bytes(), &parsed)
            .map_err(|_| AuthxError::unauthenticated("invalid credentials"))
    }

    /// Hash on the blocking pool.
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, AuthxError> {
        let password = self.clone();
        tokio::task::spawn_blocking(move || password.hash(&plaintext))
            .await
            .map_err(|e| AuthxError::internal(format!("hashing task failed: {e}")))?
    }

    /// Verify on the blocking pool.
    pub async fn verify_blocking(&self, hash: String, plaintext: String) -> Result<(), AuthxError> {
        let password = self.clone();
        tokio::task::spawn_blocking(move || password.verify(&hash, &plaintext))
            .await
            .map_err(|e| AuthxError::internal(format!("verification task failed: {e}")))?
    }
}

/// Admission check on a new password.
pub fn check_password(plaintext: &str) -> Result<(), AuthxError> {
    if plaintext.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthxError::invalid_argument(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Password {
        Password::with_cost(1024, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let password = cheap();
        let hash = password.hash("MyLittlePassword").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(password.verify(&hash, "MyLittlePassword").is_ok());
    }

    #[test]
    fn other_plaintext_is_rejected() {
        let password = cheap();
        let hash = password.hash("MyLittlePassword").unwrap();
        assert!(matches!(
            password.verify(&hash, "MyLittlePasswordwrong"),
            Err(AuthxError::Unauthenticated(_))
        ));
    }

    #[test]
    fn same_plaintext_gets_distinct_salts() {
        let password = cheap();
        assert_ne!(password.hash("secret1").unwrap(), password.hash("secret1").unwrap());
    }

    #[test]
    fn hashes_verify_across_cost_settings() {
        let hash = cheap().hash("secret1").unwrap();
        assert!(Password::default().verify(&hash, "secret1").is_ok());
    }

    #[test]
    fn garbage_hash_is_internal() {
        assert!(matches!(
            cheap().verify("not-a-phc-string", "secret1"),
            Err(AuthxError::Internal(_))
        ));
    }

    #[test]
    fn minimum_length() {
        assert!(check_password("12345").is_err());
        assert!(check_password("123456").is_ok());
    }

    #[tokio::test]
    async fn blocking_variants() {
        let password = cheap();
        let hash = password.hash_blocking("secret1".into()).await.unwrap();
        password
            .verify_blocking(hash, "secret1".into())
            .await
            .unwrap();
    }
}
