use std::sync::Arc;

use mc_lifecycle::ServerCloud;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub cloud: Arc<dyn ServerCloud>,
    pub http: reqwest::Client,
    pub config: AppConfig,
}
