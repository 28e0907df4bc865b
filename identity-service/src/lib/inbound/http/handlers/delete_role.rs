use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::list_roles::RoleData;
use super::ApiError;
use super::ApiSuccess;
use crate::identity::errors::IdentityError;
use crate::identity::models::RoleId;
use crate::inbound::http::middleware::AuthenticatedIdentity;
use crate::inbound::http::router::AppState;

/// Remove a role and echo what was removed.
pub async fn delete_role(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedIdentity>,
    Path(role_id): Path<String>,
) -> Result<ApiSuccess<RoleData>, ApiError> {
    let role_id = RoleId::from_string(&role_id).map_err(IdentityError::from)?;

    let role = state.identity_service.delete_role(&role_id).await?;

    tracing::info!(deleted_by = %caller.id, role = %role.name, "Role removed");

    Ok(ApiSuccess::new(StatusCode::OK, (&role).into()))
}
