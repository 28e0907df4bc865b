use std::collections::HashMap;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::JwtError;
use super::key::SigningKey;

/// JWT token codec: issues and parses HS256-signed, time-bound tokens.
///
/// Stateless and cheap to share; signing and verification are pure functions
/// of the token, the key and the clock.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a new JWT handler from derived key material.
    ///
    /// # Security Notes
    /// - The key should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(key: &SigningKey) -> Self {
        Self {
            encoding_key: key.encoding_key(),
            decoding_key: key.decoding_key(),
            algorithm: Algorithm::HS256,
        }
    }

    /// Derive the signing key from a configured secret and build a handler.
    ///
    /// # Errors
    /// * `InvalidKey` - The secret is empty
    pub fn from_secret(secret: &str) -> Result<Self, JwtError> {
        SigningKey::from_secret(secret).map(|key| Self::new(&key))
    }

    /// Issue a token for `subject` valid for `ttl` from now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed or the expiry overflows
    pub fn issue(
        &self,
        subject: &str,
        extra: HashMap<String, serde_json::Value>,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        self.issue_at(subject, extra, ttl, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject: &str,
        extra: HashMap<String, serde_json::Value>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = Claims::new(subject, extra, now, ttl)?;
        self.encode(&claims)
    }

    /// Sign an already-built claim set.
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode, verify and check the expiry of a token.
    ///
    /// # Errors
    /// * `Malformed` - Structure, encoding or claim set cannot be decoded
    /// * `SignatureInvalid` - MAC does not verify or algorithm is not HS256
    /// * `Expired` - Token is at or past its expiration second
    pub fn parse(&self, token: &str) -> Result<Claims, JwtError> {
        self.parse_at(token, Utc::now())
    }

    /// Parse a token as if the current time were `now`.
    pub fn parse_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        self.decode_structure(token)?;

        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below against the supplied clock, without leeway
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    JwtError::SignatureInvalid
                }
                _ => JwtError::Malformed(e.to_string()),
            })?;

        if claims.is_expired(now.timestamp()) {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }

    /// True iff the token parses, is unexpired and belongs to `expected_subject`.
    ///
    /// Every failure collapses to `false`; use [`JwtHandler::parse`] when the
    /// failure kind matters.
    pub fn is_valid(&self, token: &str, expected_subject: &str) -> bool {
        self.parse(token)
            .map(|claims| claims.sub == expected_subject)
            .unwrap_or(false)
    }

    /// Decode header and payload without trusting them, so that structural
    /// damage is reported as `Malformed` before the MAC is looked at.
    fn decode_structure(&self, token: &str) -> Result<(), JwtError> {
        if token.split('.').count() != 3 {
            return Err(JwtError::Malformed(
                "expected three dot-separated segments".to_string(),
            ));
        }

        let mut validation = Validation::new(self.algorithm);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|_| ())
            .map_err(|e| JwtError::Malformed(e.to_string()))
    }
}
