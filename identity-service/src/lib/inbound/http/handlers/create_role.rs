use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::list_roles::RoleData;
use super::ApiError;
use super::ApiSuccess;
use crate::identity::errors::IdentityError;
use crate::identity::models::Role;
use crate::identity::models::RoleName;
use crate::inbound::http::middleware::AuthenticatedIdentity;
use crate::inbound::http::router::AppState;

pub async fn create_role(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedIdentity>,
    Json(body): Json<CreateRoleRequest>,
) -> Result<ApiSuccess<RoleData>, ApiError> {
    let role = state
        .identity_service
        .create_role(body.try_into_role()?)
        .await?;

    tracing::info!(created_by = %caller.id, role = %role.name, "Role added");

    Ok(ApiSuccess::new(StatusCode::CREATED, (&role).into()))
}

/// HTTP request body for adding a role (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateRoleRequest {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

impl CreateRoleRequest {
    pub fn try_into_role(self) -> Result<Role, IdentityError> {
        let name = RoleName::new(&self.name)?;
        let description = self
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        Ok(Role::new(name, description))
    }
}
