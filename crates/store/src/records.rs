use chrono::{DateTime, Utc};
use chunkup_protocol::UploadMode;
use serde::{Deserialize, Serialize};

/// Completion record of one chunk, kept in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    pub file_id: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub uploaded: bool,
    /// Milliseconds since the Unix epoch. Absent on legacy records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ChunkRecord {
    /// Builds the record written after a chunk is processed.
    pub fn uploaded(file_id: &str, chunk_index: u32, total_chunks: u32, now: DateTime<Utc>) -> Self {
        Self {
            file_id: file_id.to_string(),
            chunk_index,
            total_chunks,
            uploaded: true,
            timestamp: Some(now.timestamp_millis()),
        }
    }

    /// Returns `true` if the record is older than `cutoff` or carries no
    /// timestamp at all.
    pub fn is_older_than(&self, cutoff: DateTime<Utc>) -> bool {
        match self.timestamp {
            Some(ts) => ts < cutoff.timestamp_millis(),
            None => true,
        }
    }
}

/// Descriptive record of one file, kept in the blob registry.
///
/// Written once before the first chunk is sent and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobRecord {
    pub file_id: String,
    pub file_name: String,
    pub file_size: u64,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<DateTime<Utc>>,
    pub stored_at: DateTime<Utc>,
}

/// Durable mode of one upload session, kept in the ledger.
///
/// Written when the session starts and rewritten when it degrades, so a
/// resumed session never goes back to the service after chunks were
/// recorded without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub file_id: String,
    pub mode: UploadMode,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(file_id: &str, mode: UploadMode, now: DateTime<Utc>) -> Self {
        Self {
            file_id: file_id.to_string(),
            mode,
            updated_at: now,
        }
    }
}
