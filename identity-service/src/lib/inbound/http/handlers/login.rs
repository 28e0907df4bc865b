use std::fmt;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::IdentityData;
use super::INVALID_CREDENTIALS;
use crate::identity::models::LoginHandle;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    // A handle that cannot exist fails exactly like an unknown one
    let handle = LoginHandle::new(body.handle)
        .map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let identity = state
        .identity_service
        .authenticate(&handle, &body.password)
        .await?;

    let issued = state.identity_service.issue_token(&identity).await?;

    tracing::info!(identity_id = %identity.id, "Login succeeded");

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LoginResponseData {
            token: issued.access_token,
            expires_in: issued.expires_in_ms,
            user: (&identity).into(),
        },
    ))
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    handle: String,
    password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("handle", &self.handle)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub token: String,
    /// Token lifetime in milliseconds
    pub expires_in: i64,
    pub user: IdentityData,
}
