use std::sync::Arc;
use std::time::Duration;

use mc_lifecycle::ServerCloud;

/// Spawn the background lifecycle poller.
///
/// Each tick runs one driver step: derive the state, issue at most one
/// provider action. Failures are logged and retried implicitly on the
/// next tick; the step itself holds no state to corrupt.
pub fn spawn_poller(cloud: Arc<dyn ServerCloud>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        let mut last_state = None;
        loop {
            interval.tick().await;
            match mc_lifecycle::step(cloud.as_ref()).await {
                Ok(derived) => {
                    if last_state != Some(derived.state) {
                        tracing::info!(state = %derived.state, "lifecycle state changed");
                        last_state = Some(derived.state);
                    }
                }
                Err(e) => tracing::error!(error = %e, "lifecycle step failed"),
            }
        }
    });
}
