use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance of the records a pass reconciled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncSource {
    /// Fetched from an upstream source during this pass.
    Live,
    /// Every fetcher failed; the versioned backup score list was used.
    Fallback,
}

/// One field-level change emitted by reconciliation, kept for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub game_id: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub source: String,
}

/// Record of one sync pass, appended through the persistence gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLogEntry {
    pub timestamp: DateTime<Utc>,
    pub added: u32,
    pub updated: u32,
    pub errors: Vec<String>,
    pub source: SyncSource,
    pub changes: Vec<FieldChange>,
}
