use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiSuccess;
use super::IdentityData;
use crate::inbound::http::middleware::ForwardedUser;
use crate::inbound::http::router::AppState;

/// Identity of the caller, as forwarded by the access guard.
pub async fn current_identity(
    State(state): State<AppState>,
    ForwardedUser(identity_id): ForwardedUser,
) -> Result<ApiSuccess<IdentityData>, ApiError> {
    state
        .identity_service
        .get_identity(&identity_id)
        .await
        .map_err(ApiError::from)
        .map(|ref identity| ApiSuccess::new(StatusCode::OK, identity.into()))
}
