use std::fmt;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use super::IdentityData;
use crate::identity::errors::HandleError;
use crate::identity::errors::PasswordPolicyError;
use crate::identity::models::LoginHandle;
use crate::identity::models::Password;
use crate::identity::models::SignupCommand;
use crate::inbound::http::router::AppState;

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<ApiSuccess<IdentityData>, ApiError> {
    state
        .identity_service
        .signup(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref identity| ApiSuccess::new(StatusCode::CREATED, identity.into()))
}

/// HTTP request body for registering an identity (raw JSON)
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct SignupRequest {
    handle: String,
    password: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("handle", &self.handle)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}

#[derive(Debug, Clone, Error)]
pub enum ParseSignupRequestError {
    #[error("Invalid handle: {0}")]
    Handle(#[from] HandleError),

    #[error("Invalid password: {0}")]
    Password(#[from] PasswordPolicyError),
}

impl SignupRequest {
    pub fn try_into_command(self) -> Result<SignupCommand, ParseSignupRequestError> {
        let handle = LoginHandle::new(self.handle)?;
        let password = Password::new(self.password)?;
        let display_name = self
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        Ok(SignupCommand::new(handle, password, display_name))
    }
}

impl From<ParseSignupRequestError> for ApiError {
    fn from(err: ParseSignupRequestError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}
