use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::identity::errors::IdentityError;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::LoginHandle;
use crate::identity::models::Role;
use crate::identity::models::RoleId;
use crate::identity::models::RoleName;
use crate::identity::ports::IdentityRepository;
use crate::identity::ports::RoleRepository;

/// Process-local credential store.
///
/// The handle index is checked and updated under the same write lock as
/// the insert, so it behaves like a unique index.
#[derive(Default)]
pub struct InMemoryIdentityRepository {
    state: RwLock<IdentityTable>,
}

#[derive(Default)]
struct IdentityTable {
    by_id: HashMap<IdentityId, Identity>,
    by_handle: HashMap<LoginHandle, IdentityId>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn create(&self, identity: Identity) -> Result<Identity, IdentityError> {
        let mut table = self.state.write().await;

        if table.by_handle.contains_key(&identity.handle) {
            return Err(IdentityError::DuplicateIdentity(identity.handle.to_string()));
        }

        table.by_handle.insert(identity.handle.clone(), identity.id);
        table.by_id.insert(identity.id, identity.clone());

        Ok(identity)
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, IdentityError> {
        Ok(self.state.read().await.by_id.get(id).cloned())
    }

    async fn find_by_handle(
        &self,
        handle: &LoginHandle,
    ) -> Result<Option<Identity>, IdentityError> {
        let table = self.state.read().await;
        Ok(table
            .by_handle
            .get(handle)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn exists_by_handle(&self, handle: &LoginHandle) -> Result<bool, IdentityError> {
        Ok(self.state.read().await.by_handle.contains_key(handle))
    }

    async fn list_all(&self) -> Result<Vec<Identity>, IdentityError> {
        let mut identities: Vec<Identity> =
            self.state.read().await.by_id.values().cloned().collect();
        identities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(identities)
    }

    async fn record_login(&self, id: &IdentityId, at: DateTime<Utc>) -> Result<(), IdentityError> {
        let mut table = self.state.write().await;
        let identity = table
            .by_id
            .get_mut(id)
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))?;
        identity.last_login = Some(at);
        Ok(())
    }

    async fn set_enabled(&self, id: &IdentityId, enabled: bool) -> Result<Identity, IdentityError> {
        let mut table = self.state.write().await;
        let identity = table
            .by_id
            .get_mut(id)
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))?;
        identity.enabled = enabled;
        Ok(identity.clone())
    }

    async fn exists_with_role(&self, role: &RoleName) -> Result<bool, IdentityError> {
        Ok(self
            .state
            .read()
            .await
            .by_id
            .values()
            .any(|identity| identity.roles.contains(role)))
    }
}

/// Process-local role store keyed by name.
#[derive(Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<HashMap<RoleName, Role>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_by_name(&self, name: &RoleName) -> Result<Option<Role>, IdentityError> {
        Ok(self.roles.read().await.get(name).cloned())
    }

    async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>, IdentityError> {
        Ok(self
            .roles
            .read()
            .await
            .values()
            .find(|role| role.id == *id)
            .cloned())
    }

    async fn create(&self, role: Role) -> Result<Role, IdentityError> {
        let mut roles = self.roles.write().await;
        Ok(roles.entry(role.name.clone()).or_insert(role).clone())
    }

    async fn list_all(&self) -> Result<Vec<Role>, IdentityError> {
        let mut roles: Vec<Role> = self.roles.read().await.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    // Holders are checked by the service; this store has no view of identities
    async fn delete(&self, id: &RoleId) -> Result<(), IdentityError> {
        let mut roles = self.roles.write().await;
        let name = roles
            .values()
            .find(|role| role.id == *id)
            .map(|role| role.name.clone())
            .ok_or_else(|| IdentityError::RoleNotFound(id.to_string()))?;
        roles.remove(&name);
        Ok(())
    }
}
