use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiSuccess;
use super::IdentityData;
use crate::identity::models::IdentityId;
use crate::inbound::http::router::AppState;

pub async fn get_identity(
    State(state): State<AppState>,
    Path(identity_id): Path<String>,
) -> Result<ApiSuccess<IdentityData>, ApiError> {
    let identity_id =
        IdentityId::from_string(&identity_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .identity_service
        .get_identity(&identity_id)
        .await
        .map_err(ApiError::from)
        .map(|ref identity| ApiSuccess::new(StatusCode::OK, identity.into()))
}
