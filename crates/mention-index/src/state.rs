use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use storykit_protocol::Freshness;

pub const INDEX_STATE_SCHEMA_VERSION: u32 = 1;

/// Persisted freshness record for one project's mention index.
///
/// A missing state file reads as `Stale`: an index that never rebuilt is by
/// definition not fresh. Incremental operations leave this file untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexState {
    pub schema_version: u32,
    pub project_id: String,
    pub freshness: Freshness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub built_at_unix_ms: Option<u64>,
    #[serde(default)]
    pub last_errors: Vec<String>,
}

impl IndexState {
    #[must_use]
    pub fn stale(project_id: impl Into<String>) -> Self {
        Self {
            schema_version: INDEX_STATE_SCHEMA_VERSION,
            project_id: project_id.into(),
            freshness: Freshness::Stale,
            built_at_unix_ms: None,
            last_errors: Vec::new(),
        }
    }
}

/// `Ok(None)` when the file does not exist yet.
pub async fn read_index_state(path: impl AsRef<Path>) -> Result<Option<IndexState>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let bytes = tokio::fs::read(path).await?;
    let state: IndexState = serde_json::from_slice(&bytes)?;
    if state.schema_version != INDEX_STATE_SCHEMA_VERSION {
        return Err(IndexError::SchemaVersion {
            found: state.schema_version,
            expected: INDEX_STATE_SCHEMA_VERSION,
        });
    }
    Ok(Some(state))
}

pub async fn write_index_state(path: impl AsRef<Path>, state: &IndexState) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[must_use]
pub fn unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
