//! Sync wire messages and key decoding.

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::apps::AppIdManifest;
use crate::keys::{AppScope, DomainPattern, FilterKey, Key, PathPattern};
use crate::suspension::FilterSuspension;

use super::error::{Result, SyncError};

/// One update pushed by the controlling app.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SyncMessage {
    /// Full replacement of one user's key set.
    #[serde(rename_all = "camelCase")]
    UserKeys {
        user_id: u32,
        keys: Vec<Value>,
        #[serde(default)]
        manifest: Option<AppIdManifest>,
    },
    AppManifest {
        manifest: AppIdManifest,
    },
    #[serde(rename_all = "camelCase")]
    SetSuspension {
        user_id: u32,
        suspension: FilterSuspension,
    },
    #[serde(rename_all = "camelCase")]
    RevokeSuspension { user_id: u32 },
    /// Full replacement of the exempt-user list.
    #[serde(rename_all = "camelCase")]
    ExemptUsers { user_ids: Vec<u32> },
}

impl SyncMessage {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Wire form of a key.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeyPayload {
    Domain { domain: String, scope: AppScope },
    AnySubdomain { domain: String, scope: AppScope },
    Skeleton { scope: AppScope },
    DomainRegex { pattern: String, scope: AppScope },
    Path { path: String, scope: AppScope },
    IpAddress { ip: String, scope: AppScope },
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyRecord {
    pub id: Uuid,
    pub key: KeyPayload,
}

impl TryFrom<KeyRecord> for FilterKey {
    type Error = SyncError;

    fn try_from(record: KeyRecord) -> Result<Self> {
        let id = record.id;
        let invalid = |reason: &str| SyncError::InvalidKey {
            id,
            reason: reason.to_string(),
        };

        let key = match record.key {
            KeyPayload::Domain { domain, scope } => Key::Domain {
                domain: non_empty(domain).ok_or_else(|| invalid("empty domain"))?,
                scope,
            },
            KeyPayload::AnySubdomain { domain, scope } => Key::AnySubdomain {
                domain: non_empty(domain).ok_or_else(|| invalid("empty domain"))?,
                scope,
            },
            KeyPayload::Skeleton { scope } => Key::Skeleton { scope },
            KeyPayload::DomainRegex { pattern, scope } => {
                let source = non_empty(pattern).ok_or_else(|| invalid("empty pattern"))?;
                let pattern = DomainPattern::new(&source).map_err(|e| invalid(&e.to_string()))?;
                Key::DomainRegex { pattern, scope }
            }
            KeyPayload::Path { path, scope } => Key::Path {
                path: PathPattern::parse(&path).ok_or_else(|| invalid("path key needs domain/path"))?,
                scope,
            },
            KeyPayload::IpAddress { ip, scope } => Key::IpAddress {
                ip: non_empty(ip).ok_or_else(|| invalid("empty ip address"))?,
                scope,
            },
        };

        Ok(FilterKey::with_id(id, key))
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Outcome of decoding one key set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeySetReport {
    pub accepted: usize,
    pub rejected: usize,
}

/// Decode a key set, dropping entries that are malformed or of a variant
/// this version does not know.
pub fn decode_keys(values: Vec<Value>) -> (Vec<FilterKey>, KeySetReport) {
    let mut keys = Vec::with_capacity(values.len());
    let mut report = KeySetReport::default();

    for value in values {
        let decoded = serde_json::from_value::<KeyRecord>(value)
            .map_err(SyncError::from)
            .and_then(FilterKey::try_from);
        match decoded {
            Ok(key) => {
                keys.push(key);
                report.accepted += 1;
            }
            Err(e) => {
                log::warn!("KEY_REJECTED error={}", e);
                report.rejected += 1;
            }
        }
    }

    (keys, report)
}
