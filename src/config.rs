//! Engine configuration.

use serde::Deserialize;

use crate::sync::SyncError;

/// Bundle id of the controlling app.
pub const OWN_APP_BUNDLE_ID: &str = "com.netrivet.gertrude.app";

/// Signing team id the controlling app's bundle id may be prefixed with.
pub const OWN_APP_TEAM_ID: &str = "WFN83LM943";

/// Bundle id of the OS menu bar / UI server process.
pub const SYSTEM_UI_SERVER_BUNDLE_ID: &str = "com.apple.systemuiserver";

/// Uids strictly below this belong to system processes.
pub const SYSTEM_USER_THRESHOLD: u32 = 500;

pub const DNS_PORT: u16 = 53;

/// Distinct entries kept in the decision buffer between flushes.
pub const DECISION_BUFFER_CAPACITY: usize = 2000;

/// Process tokens remembered by the user-id cache.
pub const USER_ID_CACHE_CAPACITY: usize = 4096;

/// How long a failed process-token lookup is remembered.
pub const USER_ID_NEGATIVE_TTL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub own_app_bundle_id: String,
    pub own_app_team_id: Option<String>,
    pub system_ui_server_bundle_id: String,
    /// Platform binaries carry no team prefix.
    pub system_ui_server_team_id: Option<String>,
    pub system_user_threshold: u32,
    pub dns_port: u16,
    pub buffer_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            own_app_bundle_id: OWN_APP_BUNDLE_ID.to_string(),
            own_app_team_id: Some(OWN_APP_TEAM_ID.to_string()),
            system_ui_server_bundle_id: SYSTEM_UI_SERVER_BUNDLE_ID.to_string(),
            system_ui_server_team_id: None,
            system_user_threshold: SYSTEM_USER_THRESHOLD,
            dns_port: DNS_PORT,
            buffer_capacity: DECISION_BUFFER_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        let config: Self = serde_json::from_str(json)?;
        if config.buffer_capacity == 0 {
            return Err(SyncError::InvalidConfig(
                "bufferCapacity must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn is_own_app(&self, bundle_id: &str) -> bool {
        bundle_matches(
            bundle_id,
            &self.own_app_bundle_id,
            self.own_app_team_id.as_deref(),
        )
    }

    pub fn is_system_ui_server(&self, bundle_id: &str) -> bool {
        bundle_matches(
            bundle_id,
            &self.system_ui_server_bundle_id,
            self.system_ui_server_team_id.as_deref(),
        )
    }

    pub fn is_system_user(&self, user_id: u32) -> bool {
        user_id < self.system_user_threshold
    }
}

/// Exact match, or exactly `<team_id>.<expected>` when a team id is set.
fn bundle_matches(actual: &str, expected: &str, team_id: Option<&str>) -> bool {
    if actual == expected {
        return true;
    }
    team_id
        .and_then(|team| actual.strip_prefix(team))
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|rest| rest == expected)
}
