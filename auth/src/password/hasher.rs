use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;

/// Slow, salted primitive used for new digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Bcrypt { cost: u32 },
    Argon2id,
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Bcrypt {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Password hashing implementation.
///
/// New digests use the configured algorithm. Verification recognises both
/// bcrypt (`$2a$`, `$2b$`, `$2y$`) and Argon2 PHC strings, so switching the
/// algorithm does not lock out existing accounts.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher {
    algorithm: HashAlgorithm,
}

impl PasswordHasher {
    /// Create a hasher using bcrypt at its default cost.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bcrypt hasher with an explicit work factor (4..=31).
    pub fn bcrypt(cost: u32) -> Self {
        Self {
            algorithm: HashAlgorithm::Bcrypt { cost },
        }
    }

    /// Create an Argon2id hasher with default parameters.
    pub fn argon2() -> Self {
        Self {
            algorithm: HashAlgorithm::Argon2id,
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Returns
    /// Self-describing digest (modular crypt / PHC string format)
    ///
    /// # Errors
    /// * `HashingFailed` - Invalid cost or primitive failure
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        match self.algorithm {
            HashAlgorithm::Bcrypt { cost } => bcrypt::hash(password, cost)
                .map_err(|e| PasswordError::HashingFailed(e.to_string())),
            HashAlgorithm::Argon2id => {
                let salt = SaltString::generate(&mut OsRng);

                Argon2::default()
                    .hash_password(password.as_bytes(), &salt)
                    .map(|hash| hash.to_string())
                    .map_err(|e| PasswordError::HashingFailed(e.to_string()))
            }
        }
    }

    /// Verify a password against a stored digest.
    ///
    /// Malformed or unrecognised digests verify as `false`.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        if is_bcrypt_digest(hash) {
            bcrypt::verify(password, hash).unwrap_or(false)
        } else if hash.starts_with("$argon2") {
            PasswordHash::new(hash)
                .map(|parsed| {
                    Argon2::default()
                        .verify_password(password.as_bytes(), &parsed)
                        .is_ok()
                })
                .unwrap_or(false)
        } else {
            false
        }
    }
}

fn is_bcrypt_digest(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2x$", "$2y$"]
        .iter()
        .any(|prefix| hash.starts_with(prefix))
}
