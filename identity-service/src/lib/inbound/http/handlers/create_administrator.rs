use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;

use super::signup::SignupRequest;
use super::ApiError;
use super::ApiSuccess;
use super::IdentityData;
use crate::inbound::http::middleware::AuthenticatedIdentity;
use crate::inbound::http::router::AppState;

/// Register an identity holding the administrator role.
pub async fn create_administrator(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedIdentity>,
    Json(body): Json<SignupRequest>,
) -> Result<ApiSuccess<IdentityData>, ApiError> {
    let identity = state
        .identity_service
        .create_administrator(body.try_into_command()?)
        .await?;

    tracing::info!(
        created_by = %caller.id,
        identity_id = %identity.id,
        "Administrator created"
    );

    Ok(ApiSuccess::new(StatusCode::CREATED, (&identity).into()))
}
