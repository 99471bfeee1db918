//! Host-side agent, run on the game server itself.
//!
//! The control plane cannot reach into the machine, so "restart the
//! game process" is signaled out of band: a label on the cloud
//! resource. This agent polls for that label, restarts the systemd
//! unit, and clears the signal.

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use mc_lifecycle::{HetznerServerCloud, ServerCloud};

const DEFAULT_SERVICE_UNIT: &str = "minecraft.service";
const DEFAULT_POLL_SECS: u64 = 10;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cloud = HetznerServerCloud::from_env().expect("failed to build Hetzner client");

    let unit = std::env::var("MC_SERVICE_UNIT").unwrap_or_else(|_| DEFAULT_SERVICE_UNIT.into());
    let poll_secs = std::env::var("AGENT_POLL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_POLL_SECS);

    tracing::info!(unit = %unit, poll_secs, "agent watching for restart signals");

    let mut interval = tokio::time::interval(Duration::from_secs(poll_secs));
    loop {
        interval.tick().await;
        if let Err(e) = poll_once(&cloud, &unit).await {
            tracing::error!(error = %e, "restart poll failed");
        }
    }
}

async fn poll_once(cloud: &HetznerServerCloud, unit: &str) -> mc_lifecycle::Result<()> {
    let Some(server) = cloud.find_server().await? else {
        return Ok(());
    };
    if !server.restart_requested {
        return Ok(());
    }

    tracing::info!(unit = %unit, "restart requested, restarting game service");
    match tokio::process::Command::new("systemctl")
        .arg("restart")
        .arg(unit)
        .status()
        .await
    {
        Ok(status) if status.success() => {
            // Only clear the signal once the restart actually happened,
            // so a failed attempt is retried on the next poll.
            cloud.acknowledge_restart(&server).await?;
        }
        Ok(status) => {
            tracing::error!(code = ?status.code(), "systemctl restart exited nonzero");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to invoke systemctl");
        }
    }
    Ok(())
}
