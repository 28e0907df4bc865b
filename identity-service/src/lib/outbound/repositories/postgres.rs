use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::identity::errors::IdentityError;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::LoginHandle;
use crate::identity::models::Role;
use crate::identity::models::RoleAssignment;
use crate::identity::models::RoleId;
use crate::identity::models::RoleModel;
use crate::identity::models::RoleName;
use crate::identity::ports::IdentityRepository;
use crate::identity::ports::RoleRepository;

const SELECT_IDENTITY: &str = r#"
    SELECT i.id, i.handle, i.password_hash, i.display_name, i.enabled,
           i.created_at, i.last_login,
           COALESCE(
               array_agg(r.name ORDER BY r.name) FILTER (WHERE r.name IS NOT NULL),
               '{}'
           ) AS roles
    FROM identities i
    LEFT JOIN identity_roles ir ON ir.identity_id = i.id
    LEFT JOIN roles r ON r.id = ir.role_id
"#;

#[derive(FromRow)]
struct IdentityRow {
    id: Uuid,
    handle: String,
    password_hash: String,
    display_name: Option<String>,
    enabled: bool,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
    roles: Vec<String>,
}

#[derive(FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    description: Option<String>,
}

fn database_error(e: sqlx::Error) -> IdentityError {
    IdentityError::DatabaseError(e.to_string())
}

pub struct PostgresIdentityRepository {
    pool: PgPool,
    role_model: RoleModel,
}

impl PostgresIdentityRepository {
    pub fn new(pool: PgPool, role_model: RoleModel) -> Self {
        Self { pool, role_model }
    }

    fn to_identity(&self, row: IdentityRow) -> Result<Identity, IdentityError> {
        let names = row
            .roles
            .iter()
            .map(|name| RoleName::new(name))
            .collect::<Result<BTreeSet<_>, _>>()?;

        let roles = match self.role_model {
            RoleModel::Multi => RoleAssignment::Multiple(names),
            RoleModel::Single => {
                let mut names = names.into_iter();
                match (names.next(), names.next()) {
                    (Some(role), None) => RoleAssignment::Single(role),
                    _ => {
                        return Err(IdentityError::DatabaseError(format!(
                            "identity {} must hold exactly one role, found {}",
                            row.id,
                            row.roles.len()
                        )))
                    }
                }
            }
        };

        Ok(Identity {
            id: IdentityId(row.id),
            handle: LoginHandle::new(row.handle)?,
            password_hash: row.password_hash,
            display_name: row.display_name,
            roles,
            enabled: row.enabled,
            created_at: row.created_at,
            last_login: row.last_login,
        })
    }
}

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn create(&self, identity: Identity) -> Result<Identity, IdentityError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        sqlx::query(
            r#"
            INSERT INTO identities (id, handle, password_hash, display_name, enabled, created_at, last_login)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(identity.id.0)
        .bind(identity.handle.as_str())
        .bind(&identity.password_hash)
        .bind(&identity.display_name)
        .bind(identity.enabled)
        .bind(identity.created_at)
        .bind(identity.last_login)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("identities_handle_key")
                {
                    return IdentityError::DuplicateIdentity(identity.handle.to_string());
                }
            }
            database_error(e)
        })?;

        let names = identity.roles.to_strings();
        let linked = sqlx::query(
            r#"
            INSERT INTO identity_roles (identity_id, role_id)
            SELECT $1, id FROM roles WHERE name = ANY($2)
            "#,
        )
        .bind(identity.id.0)
        .bind(&names)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        // Dropping the transaction rolls the identity insert back
        if linked.rows_affected() < names.len() as u64 {
            return Err(IdentityError::RoleNotConfigured(names.join(", ")));
        }

        tx.commit().await.map_err(database_error)?;

        Ok(identity)
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, IdentityError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "{SELECT_IDENTITY} WHERE i.id = $1 GROUP BY i.id"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(|r| self.to_identity(r)).transpose()
    }

    async fn find_by_handle(
        &self,
        handle: &LoginHandle,
    ) -> Result<Option<Identity>, IdentityError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "{SELECT_IDENTITY} WHERE i.handle = $1 GROUP BY i.id"
        ))
        .bind(handle.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(|r| self.to_identity(r)).transpose()
    }

    async fn exists_by_handle(&self, handle: &LoginHandle) -> Result<bool, IdentityError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM identities WHERE handle = $1)")
            .bind(handle.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(database_error)
    }

    async fn list_all(&self) -> Result<Vec<Identity>, IdentityError> {
        let rows = sqlx::query_as::<_, IdentityRow>(&format!(
            "{SELECT_IDENTITY} GROUP BY i.id ORDER BY i.created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter().map(|r| self.to_identity(r)).collect()
    }

    async fn record_login(&self, id: &IdentityId, at: DateTime<Utc>) -> Result<(), IdentityError> {
        let result = sqlx::query("UPDATE identities SET last_login = $2 WHERE id = $1")
            .bind(id.0)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn set_enabled(&self, id: &IdentityId, enabled: bool) -> Result<Identity, IdentityError> {
        let result = sqlx::query("UPDATE identities SET enabled = $2 WHERE id = $1")
            .bind(id.0)
            .bind(enabled)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::NotFound(id.to_string()));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))
    }

    async fn exists_with_role(&self, role: &RoleName) -> Result<bool, IdentityError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM identity_roles ir
                JOIN roles r ON r.id = ir.role_id
                WHERE r.name = $1
            )
            "#,
        )
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)
    }
}

pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TryFrom<RoleRow> for Role {
    type Error = IdentityError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        Ok(Role {
            id: RoleId(row.id),
            name: RoleName::new(&row.name)?,
            description: row.description,
        })
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_by_name(&self, name: &RoleName) -> Result<Option<Role>, IdentityError> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description FROM roles WHERE name = $1",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(Role::try_from).transpose()
    }

    async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>, IdentityError> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description FROM roles WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(Role::try_from).transpose()
    }

    async fn create(&self, role: Role) -> Result<Role, IdentityError> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(role.id.0)
        .bind(role.name.as_str())
        .bind(&role.description)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        self.find_by_name(&role.name)
            .await?
            .ok_or_else(|| IdentityError::RoleNotConfigured(role.name.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<Role>, IdentityError> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description FROM roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter().map(Role::try_from).collect()
    }

    async fn delete(&self, id: &RoleId) -> Result<(), IdentityError> {
        // identity_roles references roles with ON DELETE RESTRICT
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_foreign_key_violation() {
                        return IdentityError::RoleInUse(id.to_string());
                    }
                }
                database_error(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::RoleNotFound(id.to_string()));
        }

        Ok(())
    }
}
