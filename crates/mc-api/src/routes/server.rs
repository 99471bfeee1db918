use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use mc_lifecycle::ServerSize;

use crate::dto::{StartRequest, StatusResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Current lifecycle status, derived fresh. Performs no action.
pub async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let derived = mc_lifecycle::derive_state(state.cloud.as_ref()).await?;
    Ok(Json(StatusResponse::from_derived(&derived)))
}

/// One step of the transition driver: at most one provider action.
/// The returned status reflects the state *before* the action; poll
/// again to observe its effect.
pub async fn wait(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let derived = mc_lifecycle::step(state.cloud.as_ref()).await?;
    Ok(Json(StatusResponse::from_derived(&derived)))
}

pub async fn start_server(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Result<StatusCode, ApiError> {
    let size = req
        .size
        .ok_or_else(|| ApiError::BadRequest("missing size".into()))?;
    let size: ServerSize = size
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid size: {size}")))?;

    mc_lifecycle::try_start(state.cloud.as_ref(), size).await?;
    Ok(StatusCode::OK)
}

pub async fn stop_server(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    mc_lifecycle::try_stop(state.cloud.as_ref()).await?;
    Ok(StatusCode::OK)
}
