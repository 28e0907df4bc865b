use thiserror::Error;

/// Error type for token operations.
///
/// The three parse failures are kept apart so callers can tell an expired
/// session (prompt re-login) from a forged or garbled token (reject outright).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwtError {
    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token is expired")]
    Expired,

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Signing key is invalid: {0}")]
    InvalidKey(String),
}
