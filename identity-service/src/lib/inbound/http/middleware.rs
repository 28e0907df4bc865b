use std::sync::Arc;

use async_trait::async_trait;
use auth::access::authorize;
use auth::AccessDecision;
use auth::AccessState;
use auth::Requirement;
use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use super::handlers::ApiError;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::LoginHandle;
use crate::inbound::http::router::AppState;

/// Header carrying the resolved identity to handlers behind the guard.
pub const FORWARDED_USER_HEADER: &str = "x-user-id";

/// Extension type holding the identity resolved for this request
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity(pub Arc<Identity>);

impl std::ops::Deref for AuthenticatedIdentity {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.0
    }
}

/// State for one guarded route group.
#[derive(Clone)]
pub struct GuardState {
    app: AppState,
    requirement: Arc<Requirement>,
}

impl GuardState {
    pub fn new(app: AppState, requirement: Requirement) -> Self {
        Self {
            app,
            requirement: Arc::new(requirement),
        }
    }
}

/// Middleware that enforces a route group's [`Requirement`].
///
/// Any client-supplied `X-User-Id` is dropped. On success the resolved
/// identity id is forwarded in that header and the identity itself in the
/// request extensions.
pub async fn access_guard(
    State(guard): State<GuardState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    req.headers_mut().remove(FORWARDED_USER_HEADER);

    if !guard.requirement.needs_identity() {
        return Ok(next.run(req).await);
    }

    let access = resolve_caller(&guard.app, req.headers()).await?;

    match authorize(&access, &guard.requirement) {
        AccessDecision::Allow => {}
        AccessDecision::Unauthenticated => return Err(ApiError::unauthorized()),
        AccessDecision::Forbidden => {
            if let Some(identity) = access.principal() {
                tracing::warn!(
                    identity_id = %identity.id,
                    requirement = ?guard.requirement,
                    path = %req.uri().path(),
                    "Insufficient privilege"
                );
            }
            return Err(ApiError::forbidden());
        }
    }

    if let AccessState::Authenticated(identity) = access {
        let value = HeaderValue::from_str(&identity.id.to_string()).map_err(|e| {
            tracing::error!(error = %e, "Identity id is not a valid header value");
            ApiError::internal()
        })?;
        req.headers_mut().insert(FORWARDED_USER_HEADER, value);
        req.extensions_mut()
            .insert(AuthenticatedIdentity(Arc::new(identity)));
    }

    Ok(next.run(req).await)
}

/// Turn the bearer token, if any, into an access state.
///
/// Every token failure collapses into `Unauthenticated`; the reason is only
/// logged. Store failures are returned as errors.
async fn resolve_caller(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AccessState<Identity>, ApiError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(AccessState::Unauthenticated);
    };

    let claims = match state.authenticator.parse_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(reason = %e, "Token rejected");
            return Ok(AccessState::Unauthenticated);
        }
    };

    let Ok(handle) = LoginHandle::new(claims.sub) else {
        tracing::warn!("Token subject is not a valid handle");
        return Ok(AccessState::Unauthenticated);
    };

    match state.identity_service.find_by_handle(&handle).await? {
        Some(identity) => Ok(AccessState::Authenticated(identity)),
        None => {
            tracing::warn!(handle = %handle, "Token subject is not registered");
            Ok(AccessState::Unauthenticated)
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty()).then_some(token)
}

/// Identity id forwarded by an upstream access guard.
///
/// The header is trusted as-is, so this extractor only belongs behind the
/// guard (or a gateway running it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardedUser(pub IdentityId);

#[async_trait]
impl<S> FromRequestParts<S> for ForwardedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(FORWARDED_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| IdentityId::from_string(value).ok())
            .map(ForwardedUser)
            .ok_or_else(ApiError::unauthorized)
    }
}
