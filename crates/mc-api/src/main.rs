mod config;
mod dto;
mod error;
mod poller;
mod routes;
mod state;

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use mc_lifecycle::HetznerServerCloud;

use crate::config::AppConfig;
use crate::poller::spawn_poller;
use crate::routes::api_router;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let cloud: Arc<dyn mc_lifecycle::ServerCloud> =
        Arc::new(HetznerServerCloud::from_env().expect("failed to build Hetzner client"));

    // Background lifecycle poller
    spawn_poller(cloud.clone(), config.poll_interval_secs);

    let state = AppState {
        cloud,
        http: reqwest::Client::new(),
        config: config.clone(),
    };

    let app = api_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .expect("failed to bind listener");

    tracing::info!(addr = %config.listen_addr, "starting server manager API");

    axum::serve(listener, app).await.expect("server error");
}
