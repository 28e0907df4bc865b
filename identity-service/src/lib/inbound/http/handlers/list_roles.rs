use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::identity::models::Role;
use crate::inbound::http::router::AppState;

pub async fn list_roles(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<RoleData>>, ApiError> {
    let roles = state.identity_service.list_roles().await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        roles.iter().map(RoleData::from).collect(),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleData {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<&Role> for RoleData {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id.0.to_string(),
            name: role.name.to_string(),
            description: role.description.clone(),
        }
    }
}
