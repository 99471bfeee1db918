use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::MinecraftStatus;
use crate::error::ApiError;
use crate::state::AppState;

const STATUS_API_URL: &str = "https://api.mcsrvstat.us/3";
const USER_AGENT: &str = "mc-server-manager";

/// Read-only passthrough to the public Minecraft ping service.
pub async fn game_status(State(state): State<AppState>) -> Result<Json<MinecraftStatus>, ApiError> {
    let status: MinecraftStatus = state
        .http
        .get(format!("{STATUS_API_URL}/{}", state.config.mc_server_addr))
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .json()
        .await?;

    Ok(Json(status))
}

/// Signal the host agent to restart the game process, out of band via
/// a server label. A no-op when no server exists.
pub async fn restart_game(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    if let Some(server) = state.cloud.find_server().await? {
        state.cloud.request_restart(&server).await?;
    }
    Ok(StatusCode::OK)
}
