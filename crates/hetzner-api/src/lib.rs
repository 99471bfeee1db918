//! Typed Rust client for the Hetzner Cloud API.
//!
//! Covers the subset needed for managing a single game server:
//! servers (list, create, delete, power, labels, resize), images
//! (snapshots) and primary IPs. Every call is scoped to resources
//! carrying the controller's `managed-by` ownership label.

mod types;

pub use types::*;

use serde::Deserialize;
use std::collections::HashMap;

const BASE_URL: &str = "https://api.hetzner.cloud/v1";

/// Ownership label key stamped on every managed resource.
pub const MANAGED_BY_LABEL: &str = "managed-by";

/// Label correlating a snapshot to the server it was taken from.
pub const SERVER_ID_LABEL: &str = "server-id";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("hetzner api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("hetzner api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Deserialize)]
struct ServersEnvelope {
    servers: Vec<Server>,
}

#[derive(Debug, Deserialize)]
struct ServerEnvelope {
    server: Server,
}

#[derive(Debug, Deserialize)]
struct ImagesEnvelope {
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct PrimaryIpsEnvelope {
    primary_ips: Vec<PrimaryIp>,
}

/// Client for the Hetzner Cloud REST API.
#[derive(Clone)]
pub struct HetznerClient {
    token: String,
    managed_by: String,
    base_url: String,
    http: reqwest::Client,
}

impl HetznerClient {
    /// `managed_by` is the ownership label value scoping all calls.
    pub fn new(token: impl Into<String>, managed_by: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            managed_by: managed_by.into(),
            base_url: BASE_URL.into(),
            http: reqwest::Client::new(),
        }
    }

    #[cfg(test)]
    fn with_base_url(
        token: impl Into<String>,
        managed_by: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            managed_by: managed_by.into(),
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn managed_by(&self) -> &str {
        &self.managed_by
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn auth(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn selector(&self) -> String {
        format!("{MANAGED_BY_LABEL}={}", self.managed_by)
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    // ── Servers ──────────────────────────────────────────────────────

    pub async fn list_servers(&self) -> Result<Vec<Server>> {
        let resp = self
            .http
            .get(self.url("/servers"))
            .query(&[("label_selector", self.selector())])
            .header("Authorization", self.auth())
            .send()
            .await?;

        let envelope: ServersEnvelope = Self::check(resp, "list servers").await?.json().await?;
        Ok(envelope.servers)
    }

    /// Replace the server's labels. The ownership label is always
    /// re-stamped so the resource stays discoverable.
    pub async fn set_server_labels(
        &self,
        server_id: i64,
        labels: HashMap<String, String>,
    ) -> Result<()> {
        let mut labels = labels;
        labels.insert(MANAGED_BY_LABEL.into(), self.managed_by.clone());

        let resp = self
            .http
            .put(self.url(&format!("/servers/{server_id}")))
            .header("Authorization", self.auth())
            .json(&serde_json::json!({ "labels": labels }))
            .send()
            .await?;

        Self::check(resp, "set server labels").await?;
        Ok(())
    }

    pub async fn power_on(&self, server_id: i64) -> Result<()> {
        let resp = self
            .http
            .post(self.url(&format!("/servers/{server_id}/actions/poweron")))
            .header("Authorization", self.auth())
            .send()
            .await?;

        Self::check(resp, "power on server").await?;
        Ok(())
    }

    pub async fn power_off(&self, server_id: i64) -> Result<()> {
        let resp = self
            .http
            .post(self.url(&format!("/servers/{server_id}/actions/poweroff")))
            .header("Authorization", self.auth())
            .send()
            .await?;

        Self::check(resp, "power off server").await?;
        Ok(())
    }

    pub async fn delete_server(&self, server_id: i64) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/servers/{server_id}")))
            .header("Authorization", self.auth())
            .send()
            .await?;

        Self::check(resp, "delete server").await?;
        Ok(())
    }

    pub async fn create_server(&self, req: &CreateServerRequest) -> Result<Server> {
        let mut req = req.clone();
        req.labels
            .insert(MANAGED_BY_LABEL.into(), self.managed_by.clone());

        let resp = self
            .http
            .post(self.url("/servers"))
            .header("Authorization", self.auth())
            .json(&req)
            .send()
            .await?;

        let envelope: ServerEnvelope = Self::check(resp, "create server").await?.json().await?;
        Ok(envelope.server)
    }

    /// Change the server's type. The server must be powered off.
    /// Disk size is kept so the server can still be downsized later.
    pub async fn change_server_type(&self, server_id: i64, server_type: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.url(&format!("/servers/{server_id}/actions/change_type")))
            .header("Authorization", self.auth())
            .json(&serde_json::json!({
                "server_type": server_type,
                "upgrade_disk": false,
            }))
            .send()
            .await?;

        Self::check(resp, "change server type").await?;
        Ok(())
    }

    // ── Images (snapshots) ───────────────────────────────────────────

    /// Request a snapshot of the server, labeled with its id.
    ///
    /// Hetzner answers 423 (locked) when an equivalent action is
    /// already in flight; that is treated as success, not an error.
    pub async fn create_snapshot(&self, server_id: i64, description: &str) -> Result<()> {
        let labels = HashMap::from([
            (MANAGED_BY_LABEL.to_string(), self.managed_by.clone()),
            (SERVER_ID_LABEL.to_string(), server_id.to_string()),
        ]);

        let resp = self
            .http
            .post(self.url(&format!("/servers/{server_id}/actions/create_image")))
            .header("Authorization", self.auth())
            .json(&serde_json::json!({
                "description": description,
                "type": "snapshot",
                "labels": labels,
            }))
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::LOCKED {
            return Ok(());
        }
        Self::check(resp, "create snapshot").await?;
        Ok(())
    }

    pub async fn list_snapshots(&self) -> Result<Vec<Image>> {
        let resp = self
            .http
            .get(self.url("/images"))
            .query(&[("label_selector", self.selector())])
            .header("Authorization", self.auth())
            .send()
            .await?;

        let envelope: ImagesEnvelope = Self::check(resp, "list snapshots").await?.json().await?;
        Ok(envelope.images)
    }

    /// Snapshots correlated to `server_id` via the `server-id` label.
    ///
    /// At most one is expected by convention, but the API does not
    /// enforce that; callers get whatever the provider returns, in
    /// response order.
    pub async fn snapshots_for_server(&self, server_id: i64) -> Result<Vec<Image>> {
        let selector = format!("{},{SERVER_ID_LABEL}={server_id}", self.selector());
        let resp = self
            .http
            .get(self.url("/images"))
            .query(&[("label_selector", selector)])
            .header("Authorization", self.auth())
            .send()
            .await?;

        let envelope: ImagesEnvelope = Self::check(resp, "list server snapshots")
            .await?
            .json()
            .await?;
        Ok(envelope.images)
    }

    pub async fn delete_snapshot(&self, image_id: i64) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/images/{image_id}")))
            .header("Authorization", self.auth())
            .send()
            .await?;

        Self::check(resp, "delete snapshot").await?;
        Ok(())
    }

    // ── Primary IPs ──────────────────────────────────────────────────

    pub async fn list_primary_ips(&self) -> Result<Vec<PrimaryIp>> {
        let resp = self
            .http
            .get(self.url("/primary_ips"))
            .query(&[("label_selector", self.selector())])
            .header("Authorization", self.auth())
            .send()
            .await?;

        let envelope: PrimaryIpsEnvelope =
            Self::check(resp, "list primary ips").await?.json().await?;
        Ok(envelope.primary_ips)
    }
}
