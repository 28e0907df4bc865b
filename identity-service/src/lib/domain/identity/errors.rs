use thiserror::Error;

/// Error for IdentityId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for RoleId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for login handle validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandleError {
    #[error("Handle too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Handle too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Handle contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,

    #[error("Invalid email format: {0}")]
    InvalidEmail(String),
}

/// Error for role name validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleNameError {
    #[error("Role name must not be empty")]
    Empty,

    #[error("Role name contains invalid characters: {0}")]
    InvalidCharacters(String),
}

/// Error for plaintext password policy violations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Password too long: maximum {max} bytes, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Top-level error for all identity-related operations
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid identity ID: {0}")]
    InvalidIdentityId(#[from] IdentityIdError),

    #[error("Invalid role ID: {0}")]
    InvalidRoleId(#[from] RoleIdError),

    #[error("Invalid handle: {0}")]
    InvalidHandle(#[from] HandleError),

    #[error("Invalid role name: {0}")]
    InvalidRoleName(#[from] RoleNameError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordPolicyError),

    // Domain-level errors
    #[error("Identity not found: {0}")]
    NotFound(String),

    #[error("Identity already exists: {0}")]
    DuplicateIdentity(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Role not configured: {0}")]
    RoleNotConfigured(String),

    #[error("Role not found: {0}")]
    RoleNotFound(String),

    #[error("Role already exists: {0}")]
    DuplicateRole(String),

    #[error("Role is still in use: {0}")]
    RoleInUse(String),

    // Infrastructure errors
    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),

    #[error("Token issuance failed: {0}")]
    TokenIssuance(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for IdentityError {
    fn from(err: anyhow::Error) -> Self {
        IdentityError::Unknown(err.to_string())
    }
}
