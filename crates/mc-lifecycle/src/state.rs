//! Logical state derivation.
//!
//! Maps the raw, eventually-consistent resource set the provider
//! reports onto a single authoritative [`LogicalState`]. The mapping
//! is a total, deterministic function of (server-or-absence, intent
//! labels, associated snapshot): unchanged provider data always yields
//! the same state, so callers can poll at any cadence.

use serde::Serialize;
use std::fmt;

use crate::types::{ManagedServer, PowerStatus, ServerId, ServerSize, SnapshotStatus};
use crate::{Result, ServerCloud};

/// Lifecycle phase of the managed server, computed fresh every poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogicalState {
    Running,
    Stopping,
    Stopped,
    SnapshotCreating,
    SnapshotCreated,
    Deleting,
    Deleted,
    Creating,
    Created,
    Upgraded,
    Starting,
    Unknown,
}

impl fmt::Display for LogicalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::SnapshotCreating => "snapshot-creating",
            Self::SnapshotCreated => "snapshot-created",
            Self::Deleting => "deleting",
            Self::Deleted => "deleted",
            Self::Creating => "creating",
            Self::Created => "created",
            Self::Upgraded => "upgraded",
            Self::Starting => "starting",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Result of one derivation pass: the logical state plus the raw
/// server it was derived from (absent only for `Deleted`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    pub state: LogicalState,
    pub server: Option<ManagedServer>,
}

impl Derived {
    pub fn server_id(&self) -> Option<ServerId> {
        self.server.as_ref().map(|s| s.id)
    }

    /// Size tier to show a human: the requested tier while a resize is
    /// still converging, the actual one otherwise.
    pub fn size(&self) -> Option<ServerSize> {
        self.server.as_ref().map(|s| s.display_size())
    }
}

/// Derive the logical state from provider truth. Pure apart from the
/// resource fetches; performs no action.
pub async fn derive_state(cloud: &dyn ServerCloud) -> Result<Derived> {
    let Some(server) = cloud.find_server().await? else {
        return Ok(Derived {
            state: LogicalState::Deleted,
            server: None,
        });
    };

    let state = match server.status {
        PowerStatus::Running => {
            if server.marked_for_deletion() {
                // Intent already recorded; power-off is in flight or pending.
                LogicalState::Stopping
            } else {
                LogicalState::Running
            }
        }

        PowerStatus::Stopping => LogicalState::Stopping,

        // `off` carries three sub-lifecycles, disambiguated in this
        // precedence order: teardown intent, pending resize, ready to
        // power on.
        PowerStatus::Off => {
            if server.marked_for_deletion() {
                snapshot_state(cloud, server.id).await?
            } else if server.resize_pending() {
                LogicalState::Created
            } else {
                LogicalState::Upgraded
            }
        }

        PowerStatus::Deleting => LogicalState::Deleting,

        PowerStatus::Starting | PowerStatus::Initializing => {
            if server.resize_pending() {
                // Still materializing at the old size; a resize action
                // is outstanding.
                LogicalState::Creating
            } else {
                LogicalState::Starting
            }
        }

        PowerStatus::Migrating | PowerStatus::Rebuilding | PowerStatus::Unknown => {
            LogicalState::Unknown
        }
    };

    Ok(Derived {
        state,
        server: Some(server),
    })
}

/// Sub-lifecycle of a server that is off and marked for teardown:
/// where is its snapshot?
async fn snapshot_state(cloud: &dyn ServerCloud, server_id: ServerId) -> Result<LogicalState> {
    let Some(snapshot) = cloud.snapshot_for_server(server_id).await? else {
        return Ok(LogicalState::Stopped);
    };

    Ok(match snapshot.status {
        SnapshotStatus::Creating | SnapshotStatus::Unavailable => LogicalState::SnapshotCreating,
        SnapshotStatus::Available => LogicalState::SnapshotCreated,
    })
}
