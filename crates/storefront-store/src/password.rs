//! Credential hashing with Argon2.

use crate::error::StoreError;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hashes new credentials and verifies submitted ones.
///
/// Verification reads the parameters from the stored PHC string, so hashes
/// produced with other parameters keep verifying.
#[derive(Clone, Default)]
pub struct CredentialHasher {
    argon: Argon2<'static>,
}

impl CredentialHasher {
    /// Argon2id with the crate's recommended parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Argon2id with explicit cost parameters.
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, StoreError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| StoreError::PasswordHash(e.to_string()))?;
        Ok(Self {
            argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Produce an Argon2 PHC string for the password.
    pub fn hash(&self, password: &str) -> Result<String, StoreError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StoreError::PasswordHash(e.to_string()))
    }

    /// True when the password matches the stored hash.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }
}
