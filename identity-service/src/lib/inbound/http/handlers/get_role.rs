use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use super::list_roles::RoleData;
use super::ApiError;
use super::ApiSuccess;
use crate::identity::errors::IdentityError;
use crate::identity::models::RoleId;
use crate::inbound::http::router::AppState;

pub async fn get_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> Result<ApiSuccess<RoleData>, ApiError> {
    let role_id = RoleId::from_string(&role_id).map_err(IdentityError::from)?;

    state
        .identity_service
        .get_role(&role_id)
        .await
        .map_err(ApiError::from)
        .map(|ref role| ApiSuccess::new(StatusCode::OK, role.into()))
}
