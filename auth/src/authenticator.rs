use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::Duration;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token issuance.
///
/// Owns the process-wide signing key and the configured token lifetime.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
    token_ttl: Duration,
    dummy_digest: OnceLock<Option<String>>,
}

/// Plaintext behind the digest that stands in for accounts that do not exist.
const DUMMY_PASSWORD: &str = "dummy-password-for-absent-accounts";

/// Result of successful token issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// JWT access token
    pub access_token: String,
    /// Configured lifetime in milliseconds
    pub expires_in_ms: i64,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator with the default bcrypt hasher.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret for token signing (base64 or plain text)
    /// * `token_ttl` - Lifetime of issued tokens
    ///
    /// # Errors
    /// * `InvalidKey` - The secret is empty
    pub fn new(jwt_secret: &str, token_ttl: Duration) -> Result<Self, JwtError> {
        Self::with_hasher(jwt_secret, token_ttl, PasswordHasher::new())
    }

    /// Create a new authenticator with an explicit password hasher.
    pub fn with_hasher(
        jwt_secret: &str,
        token_ttl: Duration,
        password_hasher: PasswordHasher,
    ) -> Result<Self, JwtError> {
        Ok(Self {
            password_hasher,
            jwt_handler: JwtHandler::from_secret(jwt_secret)?,
            token_ttl,
            dummy_digest: OnceLock::new(),
        })
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Hash a password for storage.
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a plaintext password against a stored digest.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Check a password against a digest that may not exist.
    ///
    /// Without a stored digest the password is still run through the hasher
    /// against a digest made once with the configured algorithm and cost, so a
    /// missing account costs as much as a wrong password. That case is always
    /// `false`.
    pub fn verify_credentials(&self, password: &str, stored_hash: Option<&str>) -> bool {
        match stored_hash {
            Some(stored_hash) => self.verify_password(password, stored_hash),
            None => {
                if let Some(dummy) = self.dummy_digest() {
                    let _ = self.password_hasher.verify(password, dummy);
                }
                false
            }
        }
    }

    fn dummy_digest(&self) -> Option<&str> {
        self.dummy_digest
            .get_or_init(|| self.password_hasher.hash(DUMMY_PASSWORD).ok())
            .as_deref()
    }

    /// Verify credentials and issue a token for `subject`.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match (or digest is unusable)
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
        extra: HashMap<String, serde_json::Value>,
    ) -> Result<IssuedToken, AuthenticationError> {
        if !self.verify_password(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.issue_token(subject, extra)?)
    }

    /// Issue a token without password verification.
    ///
    /// For callers that already verified the credentials themselves.
    pub fn issue_token(
        &self,
        subject: &str,
        extra: HashMap<String, serde_json::Value>,
    ) -> Result<IssuedToken, JwtError> {
        let access_token = self.jwt_handler.issue(subject, extra, self.token_ttl)?;

        Ok(IssuedToken {
            access_token,
            expires_in_ms: self.token_ttl.num_milliseconds(),
        })
    }

    /// Validate and decode a token, exposing the failure kind.
    pub fn parse_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.jwt_handler.parse(token)
    }

    /// Boolean gate: token is intact, unexpired and issued to `subject`.
    pub fn is_token_valid(&self, token: &str, subject: &str) -> bool {
        self.jwt_handler.is_valid(token, subject)
    }
}
