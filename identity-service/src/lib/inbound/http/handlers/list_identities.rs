use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiSuccess;
use super::IdentityData;
use crate::inbound::http::router::AppState;

pub async fn list_identities(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<IdentityData>>, ApiError> {
    let identities = state.identity_service.list_identities().await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        identities.iter().map(IdentityData::from).collect(),
    ))
}
