use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;

use super::errors::JwtError;

/// Symmetric key material for HS256 signing.
///
/// Secrets are usually provisioned base64-encoded, but plain strings are
/// still accepted: when the secret does not decode as base64 its raw UTF-8
/// bytes become the key.
#[derive(Clone)]
pub struct SigningKey {
    bytes: Vec<u8>,
}

impl SigningKey {
    /// Derive key material from a configured secret string.
    ///
    /// # Errors
    /// * `InvalidKey` - The secret is empty
    pub fn from_secret(secret: &str) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidKey("secret must not be empty".to_string()));
        }

        let bytes = match STANDARD.decode(secret) {
            Ok(decoded) if !decoded.is_empty() => decoded,
            _ => secret.as_bytes().to_vec(),
        };

        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.bytes)
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.bytes)
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.bytes.len())
            .finish()
    }
}
