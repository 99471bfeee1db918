use mc_lifecycle::{Derived, LogicalState, ServerSize};
use serde::{Deserialize, Serialize};

// ── Requests ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    /// Requested size tier, one of `small`, `medium`, `large`.
    pub size: Option<String>,
}

// ── Responses ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub state: LogicalState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<ServerSize>,
    pub running: bool,
    pub can_start: bool,
    pub can_stop: bool,
}

impl StatusResponse {
    pub fn from_derived(derived: &Derived) -> Self {
        Self {
            state: derived.state,
            size: derived.size(),
            running: derived.state == LogicalState::Running,
            can_start: derived.state == LogicalState::Deleted,
            can_stop: derived.state == LogicalState::Running,
        }
    }
}

/// Subset of the public ping service's answer that the frontend uses.
#[derive(Debug, Serialize, Deserialize)]
pub struct MinecraftStatus {
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<MinecraftPlayers>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MinecraftPlayers {
    pub online: u32,
    pub max: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list: Vec<MinecraftPlayer>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MinecraftPlayer {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_response_flags_follow_the_derived_state() {
        let derived = Derived {
            state: LogicalState::Deleted,
            server: None,
        };
        let resp = StatusResponse::from_derived(&derived);
        assert!(resp.can_start);
        assert!(!resp.can_stop);
        assert!(!resp.running);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["state"], "deleted");
        assert_eq!(json["canStart"], true);
        assert!(json.get("size").is_none());
    }
}
