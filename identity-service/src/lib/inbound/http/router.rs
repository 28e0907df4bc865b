use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::Requirement;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::create_administrator::create_administrator;
use super::handlers::create_role::create_role;
use super::handlers::current_identity::current_identity;
use super::handlers::delete_role::delete_role;
use super::handlers::get_identity::get_identity;
use super::handlers::get_role::get_role;
use super::handlers::list_identities::list_identities;
use super::handlers::list_roles::list_roles;
use super::handlers::login::login;
use super::handlers::set_identity_enabled::set_identity_enabled;
use super::handlers::signup::signup;
use super::middleware::access_guard;
use super::middleware::GuardState;
use crate::identity::ports::IdentityServicePort;

#[derive(Clone)]
pub struct AppState {
    pub identity_service: Arc<dyn IdentityServicePort>,
    pub authenticator: Arc<Authenticator>,
}

/// Role names the routes are guarded with.
#[derive(Debug, Clone)]
pub struct RouteRoles {
    /// Required for administration routes
    pub admin: String,
    /// Any of these may browse the identity directory
    pub directory: Vec<String>,
}

impl Default for RouteRoles {
    fn default() -> Self {
        Self {
            admin: "ADMIN".to_string(),
            directory: vec!["ADMIN".to_string(), "COMMISSIONER".to_string()],
        }
    }
}

pub fn create_router(
    identity_service: Arc<dyn IdentityServicePort>,
    authenticator: Arc<Authenticator>,
    roles: RouteRoles,
) -> Router {
    let state = AppState {
        identity_service,
        authenticator,
    };

    let guarded = |requirement: Requirement| {
        middleware::from_fn_with_state(GuardState::new(state.clone(), requirement), access_guard)
    };

    let public_routes = Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route_layer(guarded(Requirement::Public));

    let authenticated_routes = Router::new()
        .route("/api/users/me", get(current_identity))
        .route("/api/users/:identity_id", get(get_identity))
        .route_layer(guarded(Requirement::Authenticated));

    let directory_routes = Router::new()
        .route("/api/users", get(list_identities))
        .route_layer(guarded(Requirement::any_role(roles.directory)));

    let admin_routes = Router::new()
        .route("/api/users", post(create_administrator))
        .route("/api/users/:identity_id/enabled", put(set_identity_enabled))
        .route("/api/roles", get(list_roles).post(create_role))
        .route("/api/roles/:role_id", get(get_role).delete(delete_role))
        .route_layer(guarded(Requirement::role(roles.admin)));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            // Headers stay out of the span: they carry bearer tokens
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(directory_routes)
        .merge(admin_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
