use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::identity::errors::IdentityError;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::LoginHandle;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::RoleId;
use crate::domain::identity::models::RoleName;
use crate::domain::identity::models::SignupCommand;

/// Port for identity domain service operations.
#[async_trait]
pub trait IdentityServicePort: Send + Sync + 'static {
    /// Register a new identity holding the default role.
    ///
    /// # Errors
    /// * `DuplicateIdentity` - Handle is already registered
    /// * `RoleNotConfigured` - Default role has not been provisioned
    /// * `DatabaseError` - Database operation failed
    async fn signup(&self, command: SignupCommand) -> Result<Identity, IdentityError>;

    /// Register a new identity holding the administrator role.
    ///
    /// # Errors
    /// * `DuplicateIdentity` - Handle is already registered
    /// * `RoleNotConfigured` - Administrator role has not been provisioned
    async fn create_administrator(&self, command: SignupCommand)
        -> Result<Identity, IdentityError>;

    /// Check a handle/password pair.
    ///
    /// Unknown handle, disabled identity and wrong password are
    /// indistinguishable to the caller.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Authentication failed
    /// * `DatabaseError` - Database operation failed
    async fn authenticate(
        &self,
        handle: &LoginHandle,
        password: &str,
    ) -> Result<Identity, IdentityError>;

    /// Issue a bearer token whose subject is the identity's handle.
    ///
    /// # Errors
    /// * `TokenIssuance` - Token encoding failed
    async fn issue_token(&self, identity: &Identity) -> Result<auth::IssuedToken, IdentityError>;

    /// Look up an identity by handle; absence is not an error.
    async fn find_by_handle(&self, handle: &LoginHandle)
        -> Result<Option<Identity>, IdentityError>;

    /// Retrieve identity by unique identifier.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    async fn get_identity(&self, id: &IdentityId) -> Result<Identity, IdentityError>;

    /// Retrieve every registered identity.
    async fn list_identities(&self) -> Result<Vec<Identity>, IdentityError>;

    /// Allow or refuse future logins for an identity.
    ///
    /// Tokens already issued stay valid until they expire.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    async fn set_enabled(&self, id: &IdentityId, enabled: bool)
        -> Result<Identity, IdentityError>;

    /// Retrieve every provisioned role.
    async fn list_roles(&self) -> Result<Vec<Role>, IdentityError>;

    /// Add a role.
    ///
    /// # Errors
    /// * `DuplicateRole` - A role with that name already exists
    async fn create_role(&self, role: Role) -> Result<Role, IdentityError>;

    /// Retrieve a role by identifier.
    ///
    /// # Errors
    /// * `RoleNotFound` - Role does not exist
    async fn get_role(&self, id: &RoleId) -> Result<Role, IdentityError>;

    /// Remove a role nobody holds and the service does not depend on.
    ///
    /// # Errors
    /// * `RoleNotFound` - Role does not exist
    /// * `RoleInUse` - Role is assigned or is the default/administrator role
    async fn delete_role(&self, id: &RoleId) -> Result<Role, IdentityError>;
}

/// Credential store: persistence operations for the identity aggregate.
#[async_trait]
pub trait IdentityRepository: Send + Sync + 'static {
    /// Persist a new identity.
    ///
    /// Handle uniqueness is enforced by the store itself, so concurrent
    /// creations with the same handle leave exactly one row.
    ///
    /// # Errors
    /// * `DuplicateIdentity` - Handle is already taken
    /// * `RoleNotConfigured` - A referenced role does not exist
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, identity: Identity) -> Result<Identity, IdentityError>;

    /// Retrieve identity by identifier.
    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, IdentityError>;

    /// Retrieve identity by login handle.
    async fn find_by_handle(&self, handle: &LoginHandle)
        -> Result<Option<Identity>, IdentityError>;

    /// Check whether a handle is taken.
    async fn exists_by_handle(&self, handle: &LoginHandle) -> Result<bool, IdentityError>;

    /// Retrieve all identities, newest first.
    async fn list_all(&self) -> Result<Vec<Identity>, IdentityError>;

    /// Store the time of the latest successful login.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    async fn record_login(&self, id: &IdentityId, at: DateTime<Utc>)
        -> Result<(), IdentityError>;

    /// Flip the enabled flag and return the updated identity.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    async fn set_enabled(&self, id: &IdentityId, enabled: bool)
        -> Result<Identity, IdentityError>;

    /// Check whether any identity holds `role`.
    async fn exists_with_role(&self, role: &RoleName) -> Result<bool, IdentityError>;
}

/// Persistence operations for roles.
#[async_trait]
pub trait RoleRepository: Send + Sync + 'static {
    /// Retrieve role by unique name.
    async fn find_by_name(&self, name: &RoleName) -> Result<Option<Role>, IdentityError>;

    /// Retrieve role by identifier.
    async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>, IdentityError>;

    /// Persist a new role. Creating an existing name returns the stored role.
    async fn create(&self, role: Role) -> Result<Role, IdentityError>;

    /// Retrieve all roles ordered by name.
    async fn list_all(&self) -> Result<Vec<Role>, IdentityError>;

    /// Remove a role.
    ///
    /// # Errors
    /// * `RoleNotFound` - Role does not exist
    /// * `RoleInUse` - An identity still holds the role
    async fn delete(&self, id: &RoleId) -> Result<(), IdentityError>;
}
