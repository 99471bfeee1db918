pub mod minecraft;
pub mod server;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(server::get_status))
        .route("/api/server/wait", get(server::wait))
        .route("/api/server/start", post(server::start_server))
        .route("/api/server/stop", post(server::stop_server))
        .route("/api/minecraft/status", get(minecraft::game_status))
        .route("/api/minecraft/restart", post(minecraft::restart_game))
        .with_state(state)
}
