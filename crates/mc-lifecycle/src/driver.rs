//! The transition driver: derive, then act once.
//!
//! Invoked repeatedly by an external poller. Each call issues at most
//! one provider action and returns the state as observed *before* that
//! action took effect; the next poll observes the result. There is no
//! saved cursor or step counter, only provider truth, which makes every
//! step reentrant and safe after a crash.

use crate::state::{Derived, LogicalState, derive_state};
use crate::{Result, ServerCloud};

/// Advance the lifecycle by at most one provider action.
pub async fn step(cloud: &dyn ServerCloud) -> Result<Derived> {
    let derived = derive_state(cloud).await?;

    match (derived.state, &derived.server) {
        (LogicalState::Stopped, Some(server)) => {
            // A snapshot may already exist if a previous step raced the
            // provider; never create a duplicate.
            if cloud.snapshot_for_server(server.id).await?.is_none() {
                tracing::info!(server_id = %server.id, "requesting snapshot before teardown");
                cloud
                    .create_snapshot(server.id, &format!("Snapshot for server {}", server.id))
                    .await?;
            }
        }

        (LogicalState::SnapshotCreated, Some(server)) => {
            tracing::info!(server_id = %server.id, "snapshot available, deleting server");
            cloud.delete_server(server.id).await?;
        }

        (LogicalState::Created, Some(server)) => {
            if let Some(target) = server.target_size
                && server.resize_pending()
            {
                tracing::info!(server_id = %server.id, size = %target, "resizing server");
                cloud.resize(server.id, target).await?;
            }
        }

        (LogicalState::Upgraded, Some(server)) => {
            tracing::info!(server_id = %server.id, "powering on server");
            cloud.power_on(server.id).await?;
        }

        // Everything else is either converging (the next poll will see
        // progress) or stable (nothing to do).
        _ => {}
    }

    Ok(derived)
}
