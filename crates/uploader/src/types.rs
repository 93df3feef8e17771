use chunkup_protocol::ListingStatus;
use serde::{Deserialize, Serialize};

use crate::remote::DeleteOutcome;

/// One row of the file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListing {
    pub file_id: String,
    pub file_name: String,
    /// Byte size, decimal.
    pub size: String,
    pub mime_type: String,
    /// Uploaded chunk indices, decimal, ascending.
    pub uploaded_chunks: Vec<String>,
    pub status: ListingStatus,
}

/// What the remote service said about a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteDelete {
    Deleted,
    NotImplemented,
    /// The call failed; local data was purged anyway.
    Failed(String),
}

impl From<DeleteOutcome> for RemoteDelete {
    fn from(outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Deleted => Self::Deleted,
            DeleteOutcome::NotImplemented => Self::NotImplemented,
        }
    }
}

/// Result of deleting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub file_id: String,
    pub remote: RemoteDelete,
    /// Ledger entries removed (chunks and metadata).
    pub purged_entries: usize,
    /// Whether a blob registry record existed.
    pub blob_removed: bool,
}

/// Result of one garbage collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcReport {
    /// Chunk entries inspected.
    pub scanned: usize,
    /// Chunk entries removed.
    pub removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_field_names() {
        let listing = FileListing {
            file_id: "f1".into(),
            file_name: "a.txt".into(),
            size: "12".into(),
            mime_type: "text/plain".into(),
            uploaded_chunks: vec!["0".into()],
            status: ListingStatus::Completed,
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["fileId"], "f1");
        assert_eq!(json["mimeType"], "text/plain");
        assert_eq!(json["uploadedChunks"][0], "0");
        assert_eq!(json["status"], "completed");
    }

    #[test]
    fn delete_outcome_conversion() {
        assert_eq!(RemoteDelete::from(DeleteOutcome::Deleted), RemoteDelete::Deleted);
        assert_eq!(
            RemoteDelete::from(DeleteOutcome::NotImplemented),
            RemoteDelete::NotImplemented
        );
    }
}
