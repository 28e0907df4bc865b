use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::identity::errors::IdentityError;
use crate::identity::models::Identity;

pub mod create_administrator;
pub mod create_role;
pub mod current_identity;
pub mod delete_role;
pub mod get_identity;
pub mod get_role;
pub mod list_identities;
pub mod list_roles;
pub mod login;
pub mod set_identity_enabled;
pub mod signup;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";
pub const ACCESS_DENIED: &str = "Access denied";
const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// Failure returned to HTTP clients.
///
/// Messages are safe to show; internal detail is logged before conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized(AUTHENTICATION_REQUIRED.to_string())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden(ACCESS_DENIED.to_string())
    }

    pub fn internal() -> Self {
        ApiError::InternalServerError(INTERNAL_ERROR.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!(error = %e, "Unhandled error");
        Self::internal()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotFound(_) | IdentityError::RoleNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            IdentityError::DuplicateIdentity(_)
            | IdentityError::DuplicateRole(_)
            | IdentityError::RoleInUse(_) => ApiError::Conflict(err.to_string()),
            IdentityError::InvalidCredentials => {
                ApiError::Unauthorized(INVALID_CREDENTIALS.to_string())
            }
            IdentityError::InvalidHandle(_)
            | IdentityError::InvalidPassword(_)
            | IdentityError::InvalidRoleName(_) => ApiError::UnprocessableEntity(err.to_string()),
            IdentityError::InvalidIdentityId(_) | IdentityError::InvalidRoleId(_) => {
                ApiError::BadRequest(err.to_string())
            }
            IdentityError::RoleNotConfigured(_)
            | IdentityError::PasswordHashing(_)
            | IdentityError::TokenIssuance(_)
            | IdentityError::DatabaseError(_)
            | IdentityError::Unknown(_) => {
                tracing::error!(error = %err, "Request failed");
                ApiError::internal()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// Public view of an identity. The password hash never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityData {
    pub id: String,
    pub handle: String,
    pub display_name: Option<String>,
    pub roles: Vec<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&Identity> for IdentityData {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            handle: identity.handle.to_string(),
            display_name: identity.display_name.clone(),
            roles: identity.roles.to_strings(),
            enabled: identity.enabled,
            created_at: identity.created_at,
            last_login: identity.last_login,
        }
    }
}
