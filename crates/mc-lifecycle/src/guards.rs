//! Human-initiated transitions, each guarded by a precondition on the
//! freshly derived logical state. Nothing is cached between the check
//! and the action beyond the single derivation performed here.

use crate::state::{LogicalState, derive_state};
use crate::types::ServerSize;
use crate::{Error, Result, ServerCloud};

/// Begin bringing the server up at the requested size.
///
/// Only valid from `deleted` (no managed server exists). Boots from
/// the most recently created snapshot and the first pre-allocated
/// primary IP. The comparator is strict greater-than, so snapshots
/// sharing the maximal timestamp resolve to the earliest-encountered
/// candidate in provider response order.
pub async fn try_start(cloud: &dyn ServerCloud, size: ServerSize) -> Result<()> {
    let derived = derive_state(cloud).await?;
    if derived.state != LogicalState::Deleted {
        return Err(Error::Precondition {
            action: "start",
            state: derived.state,
        });
    }

    let snapshots = cloud.list_snapshots().await?;
    let latest = snapshots
        .into_iter()
        .reduce(|latest, candidate| {
            if candidate.created > latest.created {
                candidate
            } else {
                latest
            }
        })
        .ok_or(Error::NoSnapshots)?;

    let ips = cloud.list_primary_ips().await?;
    let ip = ips.into_iter().next().ok_or(Error::NoPrimaryIps)?;

    tracing::info!(snapshot_id = %latest.id, ip = %ip.ip, size = %size, "starting server");
    cloud.create_server(latest.id, ip.id, size).await?;
    Ok(())
}

/// Begin tearing the server down.
///
/// Only valid from `running`. Records the teardown intent on the
/// server *before* powering it off: a crash between the two still
/// leaves the resource discoverable as "should be stopped" on the next
/// derivation pass.
pub async fn try_stop(cloud: &dyn ServerCloud) -> Result<()> {
    let derived = derive_state(cloud).await?;
    let server = match derived.server {
        Some(server) if derived.state == LogicalState::Running => server,
        _ => {
            return Err(Error::Precondition {
                action: "stop",
                state: derived.state,
            });
        }
    };

    tracing::info!(server_id = %server.id, "stopping server");
    cloud.mark_for_deletion(&server).await?;
    cloud.power_off(server.id).await?;
    Ok(())
}
