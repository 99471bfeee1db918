//! Lifecycle core for a single cloud-hosted game server.
//!
//! The provider owns all state: every decision here is re-derived from
//! what the cloud API reports, nothing is cached across polls. The
//! crate splits into the pure state derivation ([`derive_state`]), the
//! transition driver ([`step`], one action per invocation) and the
//! human-initiated guards ([`try_start`], [`try_stop`]), all working
//! against the [`ServerCloud`] seam so tests can run on fixtures.

mod driver;
mod guards;
pub mod hetzner;
mod state;
mod types;

pub use driver::step;
pub use guards::{try_start, try_stop};
pub use hetzner::HetznerServerCloud;
pub use state::{Derived, LogicalState, derive_state};
pub use types::*;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cloud api error: {0}")]
    Cloud(#[from] hetzner_api::Error),

    #[error("cannot {action} server from state: {state}")]
    Precondition {
        action: &'static str,
        state: LogicalState,
    },

    #[error("no snapshots available to start the server from")]
    NoSnapshots,

    #[error("no primary IPs available to assign to the server")]
    NoPrimaryIps,

    #[error("unknown server size: {0}")]
    UnknownSize(String),

    #[error("missing env var: {0}")]
    MissingEnv(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Cloud operations the lifecycle needs, in domain terms.
///
/// Implemented by [`HetznerServerCloud`] for production and by an
/// in-memory fake in tests. Intent labels (`target-state`,
/// `target-size`, restart signaling) are encoded and decoded behind
/// this trait; the state machine only sees typed values.
///
/// Every mutating call must be idempotent or benign when repeated:
/// two overlapping pollers may both observe the same state and issue
/// the same action, and nothing here prevents that structurally.
#[async_trait]
pub trait ServerCloud: Send + Sync + 'static {
    /// The managed server, if one exists. At most one is expected at a
    /// time; if the provider reports more, the first in response order
    /// wins.
    async fn find_server(&self) -> Result<Option<ManagedServer>>;

    /// Record the intent to tear the server down (`target-state=deleted`).
    async fn mark_for_deletion(&self, server: &ManagedServer) -> Result<()>;

    async fn power_on(&self, id: ServerId) -> Result<()>;

    async fn power_off(&self, id: ServerId) -> Result<()>;

    async fn delete_server(&self, id: ServerId) -> Result<()>;

    /// Create the server from a snapshot and a pre-allocated primary IP,
    /// at the requested size tier.
    async fn create_server(
        &self,
        snapshot: SnapshotId,
        ip: PrimaryIpId,
        size: ServerSize,
    ) -> Result<ManagedServer>;

    /// Request snapshot creation, correlated to the server id. A
    /// provider-side "locked" answer means an equivalent action is
    /// already in flight and is treated as success.
    async fn create_snapshot(&self, server_id: ServerId, description: &str) -> Result<()>;

    /// The snapshot most recently correlated to the server, if any.
    /// With several candidates the first in provider response order is
    /// picked deterministically.
    async fn snapshot_for_server(&self, server_id: ServerId) -> Result<Option<Snapshot>>;

    async fn list_snapshots(&self) -> Result<Vec<Snapshot>>;

    async fn list_primary_ips(&self) -> Result<Vec<PrimaryIp>>;

    /// Resize the (powered off) server to the given tier.
    async fn resize(&self, id: ServerId, size: ServerSize) -> Result<()>;

    /// Signal the host agent to restart the game process.
    async fn request_restart(&self, server: &ManagedServer) -> Result<()>;

    /// Clear a previously signaled restart.
    async fn acknowledge_restart(&self, server: &ManagedServer) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    /// Side-effecting calls issued against the fake, in order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Action {
        PowerOn(ServerId),
        PowerOff(ServerId),
        DeleteServer(ServerId),
        CreateServer {
            snapshot: SnapshotId,
            ip: PrimaryIpId,
            size: ServerSize,
        },
        CreateSnapshot(ServerId),
        Resize(ServerId, ServerSize),
        MarkForDeletion(ServerId),
        RequestRestart(ServerId),
        AcknowledgeRestart(ServerId),
    }

    #[derive(Debug, Default)]
    pub struct FakeState {
        pub server: Option<ManagedServer>,
        pub snapshots: Vec<Snapshot>,
        pub ips: Vec<PrimaryIp>,
        pub actions: Vec<Action>,
    }

    /// In-memory [`ServerCloud`] over fixed fixtures.
    ///
    /// Records every action without simulating its provider-side
    /// effect (actions are asynchronous in production too), except for
    /// label writes, which Hetzner applies synchronously.
    #[derive(Debug, Default)]
    pub struct FakeCloud {
        pub inner: Mutex<FakeState>,
    }

    impl FakeCloud {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_server(server: ManagedServer) -> Self {
            let fake = Self::default();
            fake.inner.lock().unwrap().server = Some(server);
            fake
        }

        pub fn add_snapshot(&self, snapshot: Snapshot) {
            self.inner.lock().unwrap().snapshots.push(snapshot);
        }

        pub fn add_ip(&self, ip: PrimaryIp) {
            self.inner.lock().unwrap().ips.push(ip);
        }

        pub fn actions(&self) -> Vec<Action> {
            self.inner.lock().unwrap().actions.clone()
        }

        fn record(&self, action: Action) {
            self.inner.lock().unwrap().actions.push(action);
        }
    }

    #[async_trait]
    impl ServerCloud for FakeCloud {
        async fn find_server(&self) -> Result<Option<ManagedServer>> {
            Ok(self.inner.lock().unwrap().server.clone())
        }

        async fn mark_for_deletion(&self, server: &ManagedServer) -> Result<()> {
            self.record(Action::MarkForDeletion(server.id));
            if let Some(s) = self.inner.lock().unwrap().server.as_mut() {
                s.target_state = Some(TargetState::Deleted);
            }
            Ok(())
        }

        async fn power_on(&self, id: ServerId) -> Result<()> {
            self.record(Action::PowerOn(id));
            Ok(())
        }

        async fn power_off(&self, id: ServerId) -> Result<()> {
            self.record(Action::PowerOff(id));
            Ok(())
        }

        async fn delete_server(&self, id: ServerId) -> Result<()> {
            self.record(Action::DeleteServer(id));
            Ok(())
        }

        async fn create_server(
            &self,
            snapshot: SnapshotId,
            ip: PrimaryIpId,
            size: ServerSize,
        ) -> Result<ManagedServer> {
            self.record(Action::CreateServer { snapshot, ip, size });
            Ok(ManagedServer {
                id: ServerId(4242),
                name: "mc-server".into(),
                status: PowerStatus::Initializing,
                size_code: size.server_type()?.into(),
                target_state: Some(TargetState::Running),
                target_size: Some(size),
                restart_requested: false,
            })
        }

        async fn create_snapshot(&self, server_id: ServerId, _description: &str) -> Result<()> {
            self.record(Action::CreateSnapshot(server_id));
            Ok(())
        }

        async fn snapshot_for_server(&self, server_id: ServerId) -> Result<Option<Snapshot>> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .snapshots
                .iter()
                .find(|s| s.server_id == Some(server_id))
                .cloned())
        }

        async fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
            Ok(self.inner.lock().unwrap().snapshots.clone())
        }

        async fn list_primary_ips(&self) -> Result<Vec<PrimaryIp>> {
            Ok(self.inner.lock().unwrap().ips.clone())
        }

        async fn resize(&self, id: ServerId, size: ServerSize) -> Result<()> {
            self.record(Action::Resize(id, size));
            Ok(())
        }

        async fn request_restart(&self, server: &ManagedServer) -> Result<()> {
            self.record(Action::RequestRestart(server.id));
            if let Some(s) = self.inner.lock().unwrap().server.as_mut() {
                s.restart_requested = true;
            }
            Ok(())
        }

        async fn acknowledge_restart(&self, server: &ManagedServer) -> Result<()> {
            self.record(Action::AcknowledgeRestart(server.id));
            if let Some(s) = self.inner.lock().unwrap().server.as_mut() {
                s.restart_requested = false;
            }
            Ok(())
        }
    }

    /// A server fixture with sensible defaults for derivation tests.
    pub fn server(status: PowerStatus) -> ManagedServer {
        ManagedServer {
            id: ServerId(17),
            name: "mc-server".into(),
            status,
            size_code: "cpx31".into(),
            target_state: None,
            target_size: None,
            restart_requested: false,
        }
    }

    pub fn snapshot(
        id: i64,
        server_id: Option<ServerId>,
        status: SnapshotStatus,
        created: DateTime<Utc>,
    ) -> Snapshot {
        Snapshot {
            id: SnapshotId(id),
            description: format!("Snapshot for server {}", server_id.map(|s| s.0).unwrap_or(0)),
            created,
            status,
            server_id,
        }
    }

    pub fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }
}
