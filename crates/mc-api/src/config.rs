use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub poll_interval_secs: u64,
    /// Address the public Minecraft ping service should look up.
    pub mc_server_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            listen_addr: env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".into())
                .parse()
                .expect("LISTEN_ADDR must be a valid socket address"),
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "15".into())
                .parse()
                .expect("POLL_INTERVAL_SECS must be a valid u64"),
            mc_server_addr: env::var("MC_SERVER_ADDR").expect("MC_SERVER_ADDR must be set"),
        }
    }
}
