use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::identity::errors::IdentityError;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::LoginHandle;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::RoleId;
use crate::domain::identity::models::RoleModel;
use crate::domain::identity::models::RoleName;
use crate::domain::identity::models::SignupCommand;
use crate::domain::identity::ports::IdentityRepository;
use crate::domain::identity::ports::IdentityServicePort;
use crate::domain::identity::ports::RoleRepository;

/// Role names and identity shape the service assigns on registration.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    pub model: RoleModel,
    pub default_role: RoleName,
    pub admin_role: RoleName,
}

/// Domain service implementation for identity operations.
///
/// Concrete implementation of IdentityServicePort with dependency injection.
pub struct IdentityService<IR, RR>
where
    IR: IdentityRepository,
    RR: RoleRepository,
{
    identities: Arc<IR>,
    roles: Arc<RR>,
    authenticator: Arc<auth::Authenticator>,
    policy: RolePolicy,
}

impl<IR, RR> IdentityService<IR, RR>
where
    IR: IdentityRepository,
    RR: RoleRepository,
{
    /// Create a new identity service with injected dependencies.
    ///
    /// # Arguments
    /// * `identities` - Credential store implementation
    /// * `roles` - Role store implementation
    /// * `authenticator` - Password hashing and token issuance
    /// * `policy` - Default/administrator role names and role model
    pub fn new(
        identities: Arc<IR>,
        roles: Arc<RR>,
        authenticator: Arc<auth::Authenticator>,
        policy: RolePolicy,
    ) -> Self {
        Self {
            identities,
            roles,
            authenticator,
            policy,
        }
    }

    async fn register(
        &self,
        command: SignupCommand,
        role_name: &RoleName,
    ) -> Result<Identity, IdentityError> {
        // Fast path only; the store's unique index is the real guarantee
        if self.identities.exists_by_handle(&command.handle).await? {
            return Err(IdentityError::DuplicateIdentity(command.handle.to_string()));
        }

        let role = self
            .roles
            .find_by_name(role_name)
            .await?
            .ok_or_else(|| IdentityError::RoleNotConfigured(role_name.to_string()))?;

        let password_hash = self
            .authenticator
            .hash_password(command.password.expose())
            .map_err(|e| IdentityError::PasswordHashing(e.to_string()))?;

        let identity = Identity {
            id: IdentityId::new(),
            handle: command.handle,
            password_hash,
            display_name: command.display_name,
            roles: self.policy.model.assign(role.name),
            enabled: true,
            created_at: Utc::now(),
            last_login: None,
        };

        let created = self.identities.create(identity).await?;

        tracing::info!(
            identity_id = %created.id,
            handle = %created.handle,
            roles = ?created.roles.to_strings(),
            "Identity registered"
        );

        Ok(created)
    }
}

#[async_trait]
impl<IR, RR> IdentityServicePort for IdentityService<IR, RR>
where
    IR: IdentityRepository,
    RR: RoleRepository,
{
    async fn signup(&self, command: SignupCommand) -> Result<Identity, IdentityError> {
        let role = self.policy.default_role.clone();
        self.register(command, &role).await
    }

    async fn create_administrator(
        &self,
        command: SignupCommand,
    ) -> Result<Identity, IdentityError> {
        let role = self.policy.admin_role.clone();
        self.register(command, &role).await
    }

    async fn authenticate(
        &self,
        handle: &LoginHandle,
        password: &str,
    ) -> Result<Identity, IdentityError> {
        let stored = self.identities.find_by_handle(handle).await?;

        // Every failure path pays for one hash verification
        let password_matches = self.authenticator.verify_credentials(
            password,
            stored.as_ref().map(|identity| identity.password_hash.as_str()),
        );

        let Some(mut identity) = stored else {
            tracing::debug!(handle = %handle, "Login for unknown handle");
            return Err(IdentityError::InvalidCredentials);
        };

        if !identity.enabled {
            tracing::debug!(identity_id = %identity.id, "Login for disabled identity");
            return Err(IdentityError::InvalidCredentials);
        }

        if !password_matches {
            tracing::debug!(identity_id = %identity.id, "Password mismatch");
            return Err(IdentityError::InvalidCredentials);
        }

        let now = Utc::now();
        match self.identities.record_login(&identity.id, now).await {
            Ok(()) => identity.last_login = Some(now),
            Err(e) => tracing::warn!(
                identity_id = %identity.id,
                error = %e,
                "Failed to record last login"
            ),
        }

        Ok(identity)
    }

    async fn issue_token(&self, identity: &Identity) -> Result<auth::IssuedToken, IdentityError> {
        let mut extra = HashMap::new();
        extra.insert("uid".to_string(), serde_json::json!(identity.id.to_string()));
        extra.insert(
            "roles".to_string(),
            serde_json::json!(identity.roles.to_strings()),
        );

        self.authenticator
            .issue_token(identity.handle.as_str(), extra)
            .map_err(|e| IdentityError::TokenIssuance(e.to_string()))
    }

    async fn find_by_handle(
        &self,
        handle: &LoginHandle,
    ) -> Result<Option<Identity>, IdentityError> {
        self.identities.find_by_handle(handle).await
    }

    async fn get_identity(&self, id: &IdentityId) -> Result<Identity, IdentityError> {
        self.identities
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::NotFound(id.to_string()))
    }

    async fn list_identities(&self) -> Result<Vec<Identity>, IdentityError> {
        self.identities.list_all().await
    }

    async fn set_enabled(
        &self,
        id: &IdentityId,
        enabled: bool,
    ) -> Result<Identity, IdentityError> {
        let identity = self.identities.set_enabled(id, enabled).await?;

        tracing::info!(identity_id = %identity.id, enabled, "Identity login state changed");

        Ok(identity)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, IdentityError> {
        self.roles.list_all().await
    }

    async fn create_role(&self, role: Role) -> Result<Role, IdentityError> {
        if self.roles.find_by_name(&role.name).await?.is_some() {
            return Err(IdentityError::DuplicateRole(role.name.to_string()));
        }

        let requested = role.id;
        let created = self.roles.create(role).await?;

        // Lost a race with a concurrent creation of the same name
        if created.id != requested {
            return Err(IdentityError::DuplicateRole(created.name.to_string()));
        }

        tracing::info!(role_id = %created.id, role = %created.name, "Role created");

        Ok(created)
    }

    async fn get_role(&self, id: &RoleId) -> Result<Role, IdentityError> {
        self.roles
            .find_by_id(id)
            .await?
            .ok_or_else(|| IdentityError::RoleNotFound(id.to_string()))
    }

    async fn delete_role(&self, id: &RoleId) -> Result<Role, IdentityError> {
        let role = self.get_role(id).await?;

        if role.name == self.policy.default_role || role.name == self.policy.admin_role {
            return Err(IdentityError::RoleInUse(role.name.to_string()));
        }
        if self.identities.exists_with_role(&role.name).await? {
            return Err(IdentityError::RoleInUse(role.name.to_string()));
        }

        self.roles.delete(id).await?;

        tracing::info!(role_id = %role.id, role = %role.name, "Role deleted");

        Ok(role)
    }
}
