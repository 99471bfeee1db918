use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Server types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub id: i64,
    pub name: String,
    pub status: ServerStatus,
    pub server_type: ServerType,
    pub public_net: PublicNet,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Running,
    Initializing,
    Starting,
    Stopping,
    Off,
    Deleting,
    Migrating,
    Rebuilding,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerType {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicNet {
    pub ipv4: Option<PublicIpv4>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicIpv4 {
    pub ip: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateServerRequest {
    pub name: String,
    pub server_type: String,
    /// Image (snapshot) id to boot from.
    pub image: i64,
    pub location: String,
    pub labels: HashMap<String, String>,
    pub ssh_keys: Vec<String>,
    pub public_net: CreateServerPublicNet,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateServerPublicNet {
    pub enable_ipv4: bool,
    pub enable_ipv6: bool,
    /// Pre-allocated primary IP id.
    pub ipv4: i64,
}

// ── Image (snapshot) types ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub id: i64,
    pub description: String,
    pub created: DateTime<Utc>,
    pub status: ImageStatus,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Available,
    Creating,
    #[serde(other)]
    Unavailable,
}

// ── Primary IP types ─────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryIp {
    pub id: i64,
    pub ip: String,
    #[serde(rename = "type")]
    pub family: IpFamily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    Ipv4,
    Ipv6,
}
