//! Hetzner Cloud implementation of [`ServerCloud`].
//!
//! This is the only place raw labels exist: intent labels are decoded
//! into typed values on the way in and re-encoded from them on the way
//! out. Label writes replace the whole set, so encoding always starts
//! from the server's current typed fields.

use async_trait::async_trait;
use std::collections::HashMap;

use hetzner_api::{CreateServerPublicNet, CreateServerRequest, HetznerClient};

use crate::types::{
    ManagedServer, PowerStatus, PrimaryIp, PrimaryIpId, ServerId, ServerSize, Snapshot,
    SnapshotId, SnapshotStatus, TargetState,
};
use crate::{Error, Result, ServerCloud};

const TARGET_STATE_LABEL: &str = "target-state";
const TARGET_SIZE_LABEL: &str = "target-size";
const ACTION_LABEL: &str = "action";
const ACTION_RESTART: &str = "restart";

const DEFAULT_MANAGED_BY: &str = "mc-server-manager";
const DEFAULT_LOCATION: &str = "fsn1";
const DEFAULT_SERVER_NAME: &str = "mc-server";

/// Hetzner Cloud provider using the in-house `hetzner-api` client.
pub struct HetznerServerCloud {
    client: HetznerClient,
    server_name: String,
    location: String,
    ssh_key: Option<String>,
}

impl HetznerServerCloud {
    /// Create from env vars:
    ///
    /// - `HETZNER_API_TOKEN` (required)
    /// - `HETZNER_LOCATION` (default: `"fsn1"`)
    /// - `HETZNER_SSH_KEY_ID` (optional)
    /// - `SERVER_NAME` (default: `"mc-server"`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let token = std::env::var("HETZNER_API_TOKEN")
            .map_err(|_| Error::MissingEnv("HETZNER_API_TOKEN".into()))?;

        let location =
            std::env::var("HETZNER_LOCATION").unwrap_or_else(|_| DEFAULT_LOCATION.into());
        let server_name =
            std::env::var("SERVER_NAME").unwrap_or_else(|_| DEFAULT_SERVER_NAME.into());
        let ssh_key = std::env::var("HETZNER_SSH_KEY_ID").ok();

        let client = HetznerClient::new(token, DEFAULT_MANAGED_BY);
        tracing::info!(
            managed_by = client.managed_by(),
            location = %location,
            server_name = %server_name,
            "hetzner provider configured"
        );

        Ok(Self {
            client,
            server_name,
            location,
            ssh_key,
        })
    }
}

fn decode_status(status: hetzner_api::ServerStatus) -> PowerStatus {
    match status {
        hetzner_api::ServerStatus::Running => PowerStatus::Running,
        hetzner_api::ServerStatus::Initializing => PowerStatus::Initializing,
        hetzner_api::ServerStatus::Starting => PowerStatus::Starting,
        hetzner_api::ServerStatus::Stopping => PowerStatus::Stopping,
        hetzner_api::ServerStatus::Off => PowerStatus::Off,
        hetzner_api::ServerStatus::Deleting => PowerStatus::Deleting,
        hetzner_api::ServerStatus::Migrating => PowerStatus::Migrating,
        hetzner_api::ServerStatus::Rebuilding => PowerStatus::Rebuilding,
        hetzner_api::ServerStatus::Unknown => PowerStatus::Unknown,
    }
}

fn decode_server(server: hetzner_api::Server) -> ManagedServer {
    let target_state = server.labels.get(TARGET_STATE_LABEL).map(|v| {
        if v == TargetState::Deleted.as_str() {
            TargetState::Deleted
        } else {
            TargetState::Running
        }
    });

    let target_size = server.labels.get(TARGET_SIZE_LABEL).map(|v| {
        v.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %v, "unrecognized target-size label, treating as unknown");
            ServerSize::Unknown
        })
    });

    let restart_requested = server
        .labels
        .get(ACTION_LABEL)
        .is_some_and(|v| v == ACTION_RESTART);

    ManagedServer {
        id: ServerId(server.id),
        name: server.name,
        status: decode_status(server.status),
        size_code: server.server_type.name,
        target_state,
        target_size,
        restart_requested,
    }
}

/// Full label set for a server, rebuilt from its typed fields. The
/// ownership label is stamped by the client.
fn encode_labels(server: &ManagedServer) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    if let Some(target) = server.target_state {
        labels.insert(TARGET_STATE_LABEL.into(), target.as_str().into());
    }
    if let Some(size) = server.target_size {
        labels.insert(TARGET_SIZE_LABEL.into(), size.to_string());
    }
    if server.restart_requested {
        labels.insert(ACTION_LABEL.into(), ACTION_RESTART.into());
    }
    labels
}

fn decode_snapshot(image: hetzner_api::Image) -> Snapshot {
    let server_id = image
        .labels
        .get(hetzner_api::SERVER_ID_LABEL)
        .and_then(|v| v.parse().ok())
        .map(ServerId);

    let status = match image.status {
        hetzner_api::ImageStatus::Available => SnapshotStatus::Available,
        hetzner_api::ImageStatus::Creating => SnapshotStatus::Creating,
        hetzner_api::ImageStatus::Unavailable => SnapshotStatus::Unavailable,
    };

    Snapshot {
        id: SnapshotId(image.id),
        description: image.description,
        created: image.created,
        status,
        server_id,
    }
}

#[async_trait]
impl ServerCloud for HetznerServerCloud {
    async fn find_server(&self) -> Result<Option<ManagedServer>> {
        let servers = self.client.list_servers().await?;
        Ok(servers.into_iter().next().map(decode_server))
    }

    async fn mark_for_deletion(&self, server: &ManagedServer) -> Result<()> {
        let mut updated = server.clone();
        updated.target_state = Some(TargetState::Deleted);
        self.client
            .set_server_labels(server.id.0, encode_labels(&updated))
            .await?;
        tracing::info!(server_id = %server.id, "marked server for deletion");
        Ok(())
    }

    async fn power_on(&self, id: ServerId) -> Result<()> {
        self.client.power_on(id.0).await?;
        tracing::info!(server_id = %id, "hetzner: server powered on");
        Ok(())
    }

    async fn power_off(&self, id: ServerId) -> Result<()> {
        self.client.power_off(id.0).await?;
        tracing::info!(server_id = %id, "hetzner: server powered off");
        Ok(())
    }

    async fn delete_server(&self, id: ServerId) -> Result<()> {
        self.client.delete_server(id.0).await?;
        tracing::info!(server_id = %id, "hetzner: server deleted");
        Ok(())
    }

    async fn create_server(
        &self,
        snapshot: SnapshotId,
        ip: PrimaryIpId,
        size: ServerSize,
    ) -> Result<ManagedServer> {
        let server_type = size.server_type()?;

        let mut labels = HashMap::new();
        labels.insert(
            TARGET_STATE_LABEL.to_string(),
            TargetState::Running.as_str().to_string(),
        );
        labels.insert(TARGET_SIZE_LABEL.to_string(), size.to_string());

        let server = self
            .client
            .create_server(&CreateServerRequest {
                name: self.server_name.clone(),
                server_type: server_type.into(),
                image: snapshot.0,
                location: self.location.clone(),
                labels,
                ssh_keys: self.ssh_key.iter().cloned().collect(),
                public_net: CreateServerPublicNet {
                    enable_ipv4: true,
                    enable_ipv6: false,
                    ipv4: ip.0,
                },
            })
            .await?;

        tracing::info!(server_id = server.id, %size, "hetzner: server created");
        Ok(decode_server(server))
    }

    async fn create_snapshot(&self, server_id: ServerId, description: &str) -> Result<()> {
        self.client.create_snapshot(server_id.0, description).await?;
        tracing::info!(server_id = %server_id, "hetzner: snapshot requested");
        Ok(())
    }

    async fn snapshot_for_server(&self, server_id: ServerId) -> Result<Option<Snapshot>> {
        let images = self.client.snapshots_for_server(server_id.0).await?;
        tracing::debug!(server_id = %server_id, count = images.len(), "fetched server snapshots");
        Ok(images.into_iter().next().map(decode_snapshot))
    }

    async fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        let images = self.client.list_snapshots().await?;
        Ok(images.into_iter().map(decode_snapshot).collect())
    }

    async fn list_primary_ips(&self) -> Result<Vec<PrimaryIp>> {
        let ips = self.client.list_primary_ips().await?;
        Ok(ips
            .into_iter()
            .map(|ip| PrimaryIp {
                id: PrimaryIpId(ip.id),
                ip: ip.ip,
            })
            .collect())
    }

    async fn resize(&self, id: ServerId, size: ServerSize) -> Result<()> {
        self.client.change_server_type(id.0, size.server_type()?).await?;
        tracing::info!(server_id = %id, %size, "hetzner: server resize requested");
        Ok(())
    }

    async fn request_restart(&self, server: &ManagedServer) -> Result<()> {
        let mut updated = server.clone();
        updated.restart_requested = true;
        self.client
            .set_server_labels(server.id.0, encode_labels(&updated))
            .await?;
        tracing::info!(server_id = %server.id, "restart signaled to host agent");
        Ok(())
    }

    async fn acknowledge_restart(&self, server: &ManagedServer) -> Result<()> {
        let mut updated = server.clone();
        updated.restart_requested = false;
        self.client
            .set_server_labels(server.id.0, encode_labels(&updated))
            .await?;
        tracing::info!(server_id = %server.id, "restart acknowledged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn raw_server(labels: &[(&str, &str)]) -> hetzner_api::Server {
        let json = serde_json::json!({
            "id": 17,
            "name": "mc-server",
            "status": "off",
            "server_type": { "name": "cpx31" },
            "public_net": { "ipv4": { "ip": "192.0.2.10" } },
            "labels": labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn decodes_intent_labels_to_typed_values() {
        let server = decode_server(raw_server(&[
            ("target-state", "deleted"),
            ("target-size", "large"),
            ("action", "restart"),
        ]));

        assert_eq!(server.id, ServerId(17));
        assert_eq!(server.status, PowerStatus::Off);
        assert_eq!(server.target_state, Some(TargetState::Deleted));
        assert_eq!(server.target_size, Some(ServerSize::Large));
        assert!(server.restart_requested);
    }

    #[test]
    fn absent_labels_decode_to_none() {
        let server = decode_server(raw_server(&[]));
        assert_eq!(server.target_state, None);
        assert_eq!(server.target_size, None);
        assert!(!server.restart_requested);
    }

    #[test]
    fn garbage_target_size_decodes_to_unknown() {
        let server = decode_server(raw_server(&[("target-size", "xxl")]));
        assert_eq!(server.target_size, Some(ServerSize::Unknown));
    }

    #[test]
    fn encode_labels_round_trips_through_decode() {
        let original = decode_server(raw_server(&[
            ("target-state", "deleted"),
            ("target-size", "small"),
        ]));

        let labels = encode_labels(&original);
        assert_eq!(labels.get("target-state").map(String::as_str), Some("deleted"));
        assert_eq!(labels.get("target-size").map(String::as_str), Some("small"));
        assert!(!labels.contains_key("action"));
    }

    #[test]
    fn encode_labels_drops_a_cleared_restart_signal() {
        let mut server = decode_server(raw_server(&[("action", "restart")]));
        server.restart_requested = false;
        assert!(!encode_labels(&server).contains_key("action"));
    }

    #[test]
    fn decodes_snapshot_correlation_label() {
        let image: hetzner_api::Image = serde_json::from_value(serde_json::json!({
            "id": 3,
            "description": "Snapshot for server 17",
            "created": Utc::now().to_rfc3339(),
            "status": "available",
            "labels": { "server-id": "17" },
        }))
        .unwrap();

        let snapshot = decode_snapshot(image);
        assert_eq!(snapshot.server_id, Some(ServerId(17)));
        assert_eq!(snapshot.status, SnapshotStatus::Available);
    }
}
