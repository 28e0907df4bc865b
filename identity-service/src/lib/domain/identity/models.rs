use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::identity::errors::HandleError;
use crate::domain::identity::errors::IdentityIdError;
use crate::domain::identity::errors::RoleIdError;
use crate::domain::identity::errors::PasswordPolicyError;
use crate::domain::identity::errors::RoleNameError;

/// Identity aggregate entity.
///
/// A principal that can authenticate against this service.
#[derive(Clone)]
pub struct Identity {
    pub id: IdentityId,
    pub handle: LoginHandle,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub roles: RoleAssignment,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("password_hash", &"<redacted>")
            .field("display_name", &self.display_name)
            .field("roles", &self.roles)
            .field("enabled", &self.enabled)
            .field("created_at", &self.created_at)
            .field("last_login", &self.last_login)
            .finish()
    }
}

impl auth::Principal for Identity {
    fn has_role(&self, role: &str) -> bool {
        self.roles.names().any(|name| name.as_str() == role)
    }
}

/// Identity unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    /// Generate a new random identity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identity ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, IdentityIdError> {
        Uuid::parse_str(s)
            .map(IdentityId)
            .map_err(|e| IdentityIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Login handle value type: an email address or a username.
///
/// Anything containing `@` must be a valid email and is stored lower-cased.
/// Otherwise the handle is a username of 3-32 alphanumerics, `_` or `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoginHandle(String);

impl LoginHandle {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 32;

    /// Create a validated login handle.
    ///
    /// # Errors
    /// * `InvalidEmail` - Contains `@` but is not RFC 5322 compliant
    /// * `TooShort` / `TooLong` - Username length outside 3-32
    /// * `InvalidCharacters` - Username has characters other than alphanumerics, `_`, `-`
    pub fn new(handle: String) -> Result<Self, HandleError> {
        let handle = handle.trim();

        if handle.contains('@') {
            let normalized = handle.to_lowercase();
            return email_address::EmailAddress::from_str(&normalized)
                .map(|_| Self(normalized))
                .map_err(|e| HandleError::InvalidEmail(e.to_string()));
        }

        let handle = Self::with_valid_length(handle)?;
        let handle = Self::with_valid_chars(handle)?;
        Ok(Self(handle.to_string()))
    }

    fn with_valid_length(handle: &str) -> Result<&str, HandleError> {
        let length = handle.chars().count();
        if length < Self::MIN_LENGTH {
            Err(HandleError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(HandleError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(handle)
        }
    }

    fn with_valid_chars(handle: &str) -> Result<&str, HandleError> {
        if handle
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            Ok(handle)
        } else {
            Err(HandleError::InvalidCharacters)
        }
    }

    pub fn is_email(&self) -> bool {
        self.0.contains('@')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role name value type, normalized to upper case (e.g. `ADMIN`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleName(String);

impl RoleName {
    /// # Errors
    /// * `Empty` - Blank name
    /// * `InvalidCharacters` - Anything besides ASCII letters, digits and `_`
    pub fn new(name: &str) -> Result<Self, RoleNameError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RoleNameError::Empty);
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(RoleNameError::InvalidCharacters(name.to_string()));
        }
        Ok(Self(name.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleId(pub Uuid);

impl RoleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a role ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, RoleIdError> {
        Uuid::parse_str(s)
            .map(RoleId)
            .map_err(|e| RoleIdError::InvalidFormat(e.to_string()))
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

/// Named permission tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    pub description: Option<String>,
}

impl Role {
    pub fn new(name: RoleName, description: Option<String>) -> Self {
        Self {
            id: RoleId::new(),
            name,
            description,
        }
    }
}

/// Which identity shape a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleModel {
    /// Exactly one role per identity
    #[default]
    Single,
    /// A set of roles per identity
    Multi,
}

impl RoleModel {
    /// Assignment holding just `role`, in this model's shape.
    pub fn assign(&self, role: RoleName) -> RoleAssignment {
        match self {
            RoleModel::Single => RoleAssignment::Single(role),
            RoleModel::Multi => RoleAssignment::Multiple(BTreeSet::from([role])),
        }
    }
}

/// Roles held by an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleAssignment {
    Single(RoleName),
    Multiple(BTreeSet<RoleName>),
}

impl RoleAssignment {
    pub fn contains(&self, role: &RoleName) -> bool {
        match self {
            RoleAssignment::Single(held) => held == role,
            RoleAssignment::Multiple(held) => held.contains(role),
        }
    }

    pub fn names(&self) -> Box<dyn Iterator<Item = &RoleName> + '_> {
        match self {
            RoleAssignment::Single(held) => Box::new(std::iter::once(held)),
            RoleAssignment::Multiple(held) => Box::new(held.iter()),
        }
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.names().map(|name| name.as_str().to_string()).collect()
    }
}

/// Plaintext password accepted for hashing.
///
/// bcrypt ignores input past 72 bytes, so longer passwords are refused
/// rather than silently truncated.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 6;
    const MAX_BYTES: usize = 72;

    /// # Errors
    /// * `TooShort` - Fewer than 6 characters
    /// * `TooLong` - More than 72 bytes
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        if password.len() > Self::MAX_BYTES {
            return Err(PasswordPolicyError::TooLong {
                max: Self::MAX_BYTES,
                actual: password.len(),
            });
        }
        Ok(Self(password))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Command to register a new identity with domain types
#[derive(Debug)]
pub struct SignupCommand {
    pub handle: LoginHandle,
    pub password: Password,
    pub display_name: Option<String>,
}

impl SignupCommand {
    pub fn new(handle: LoginHandle, password: Password, display_name: Option<String>) -> Self {
        Self {
            handle,
            password,
            display_name,
        }
    }
}
