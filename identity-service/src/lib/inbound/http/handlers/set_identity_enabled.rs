use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::IdentityData;
use crate::identity::models::IdentityId;
use crate::inbound::http::middleware::AuthenticatedIdentity;
use crate::inbound::http::router::AppState;

/// Allow or refuse logins for an identity. Issued tokens are not revoked.
pub async fn set_identity_enabled(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedIdentity>,
    Path(identity_id): Path<String>,
    Json(body): Json<SetEnabledRequest>,
) -> Result<ApiSuccess<IdentityData>, ApiError> {
    let identity_id =
        IdentityId::from_string(&identity_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let identity = state
        .identity_service
        .set_enabled(&identity_id, body.enabled)
        .await?;

    tracing::info!(
        changed_by = %caller.id,
        identity_id = %identity.id,
        enabled = identity.enabled,
        "Identity login state updated"
    );

    Ok(ApiSuccess::new(StatusCode::OK, (&identity).into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}
