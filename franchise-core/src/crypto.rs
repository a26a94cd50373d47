//! Password hashing and one-time token generation
//!
//! Passwords are stored as bcrypt digests. bcrypt is deliberately slow, so
//! [`PasswordHasher`] runs both hashing and verification on tokio's blocking
//! pool rather than on the request task.

use rand::{TryRngCore, rngs::OsRng};

use crate::{Error, error::CryptoError};

/// Work factor used when none is configured.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Bytes of entropy in an email verification token.
const VERIFICATION_TOKEN_BYTES: usize = 32;

/// bcrypt password hasher with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash `password` into a salted bcrypt digest.
    pub async fn hash(&self, password: &str) -> Result<String, Error> {
        let password = password.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| CryptoError::PasswordHash(format!("Hashing task failed: {e}")))?
            .map_err(|e| CryptoError::PasswordHash(e.to_string()).into())
    }

    /// Check `password` against a stored digest.
    ///
    /// A malformed digest never matches.
    pub async fn verify(&self, password: &str, digest: &str) -> Result<bool, Error> {
        let password = password.to_owned();
        let digest = digest.to_owned();

        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest))
            .await
            .map_err(|e| CryptoError::PasswordHash(format!("Verification task failed: {e}")))?;

        match outcome {
            Ok(matches) => Ok(matches),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password digest could not be parsed");
                Ok(false)
            }
        }
    }
}

/// Generate a 256-bit random token, hex encoded (64 characters).
///
/// # Panics
///
/// Panics if the OS random number generator is unavailable.
pub fn generate_verification_token() -> String {
    let mut bytes = [0u8; VERIFICATION_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    hex::encode(bytes)
}
