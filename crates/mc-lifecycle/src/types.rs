use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Provider-side server identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerId(pub i64);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Provider-side snapshot (image) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub i64);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Provider-side primary IP identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimaryIpId(pub i64);

impl fmt::Display for PrimaryIpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Power status as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStatus {
    Running,
    Initializing,
    Starting,
    Stopping,
    Off,
    Deleting,
    Migrating,
    Rebuilding,
    Unknown,
}

/// Desired end state recorded on the server as an intent label.
///
/// `Deleted` marks the server for teardown (snapshot, then delete);
/// it is never reversed once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Running,
    Deleted,
}

impl TargetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Deleted => "deleted",
        }
    }
}

/// Size tier of the managed server, mapped to Hetzner server types.
///
/// The tier-to-code direction is total for the defined tiers and fails
/// loudly for `Unknown`. The reverse direction never fails: codes we
/// do not recognize degrade to `Unknown`, since that mapping is only
/// used to inform a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerSize {
    Small,
    Medium,
    Large,
    Unknown,
}

impl ServerSize {
    /// Provider server type code for this tier.
    pub fn server_type(&self) -> Result<&'static str, Error> {
        match self {
            Self::Small => Ok("cpx21"),
            Self::Medium => Ok("cpx31"),
            Self::Large => Ok("cpx41"),
            Self::Unknown => Err(Error::UnknownSize("unknown".into())),
        }
    }

    /// Tier for a provider server type code, degrading to `Unknown`.
    pub fn from_server_type(code: &str) -> Self {
        match code {
            "cpx21" => Self::Small,
            "cpx31" => Self::Medium,
            "cpx41" => Self::Large,
            other => {
                tracing::warn!(code = other, "unrecognized server type, treating as unknown");
                Self::Unknown
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ServerSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(Error::UnknownSize(other.to_string())),
        }
    }
}

/// The managed game server as reported by the provider.
///
/// Never persisted: every poll fetches a fresh copy and re-derives the
/// logical state from it. The intent labels arrive already decoded to
/// typed values; raw label strings stay at the provider boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedServer {
    pub id: ServerId,
    pub name: String,
    pub status: PowerStatus,
    /// Provider server type code as reported (e.g. `cpx31`).
    pub size_code: String,
    pub target_state: Option<TargetState>,
    pub target_size: Option<ServerSize>,
    /// Out-of-band signal for the host agent to restart the game process.
    pub restart_requested: bool,
}

impl ManagedServer {
    /// Tier the server is currently running as.
    pub fn actual_size(&self) -> ServerSize {
        ServerSize::from_server_type(&self.size_code)
    }

    /// Tier to show a human: the requested one if a resize is still
    /// converging, the actual one otherwise.
    pub fn display_size(&self) -> ServerSize {
        self.target_size.unwrap_or_else(|| self.actual_size())
    }

    /// A requested size differs from the one the server has.
    pub fn resize_pending(&self) -> bool {
        self.target_size.is_some_and(|target| target != self.actual_size())
    }

    pub fn marked_for_deletion(&self) -> bool {
        self.target_state == Some(TargetState::Deleted)
    }
}

/// Snapshot lifecycle status at the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    Available,
    Creating,
    Unavailable,
}

/// A snapshot (provider image) correlated to the server it was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub description: String,
    pub created: DateTime<Utc>,
    pub status: SnapshotStatus,
    pub server_id: Option<ServerId>,
}

/// A pre-allocated primary IP, consumed by reference at server creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryIp {
    pub id: PrimaryIpId,
    pub ip: String,
}
