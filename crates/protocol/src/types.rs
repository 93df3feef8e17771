use serde::{Deserialize, Serialize};

/// Current state of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "error")]
    Error,
}

/// Status carried by an [`UploadMetadata`] record.
///
/// The client writes its own session status; the service reports
/// `in_progress` and `failed`. Each value is kept as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataStatus {
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "failed")]
    Failed,
}

impl From<UploadStatus> for MetadataStatus {
    fn from(status: UploadStatus) -> Self {
        match status {
            UploadStatus::Uploading => MetadataStatus::Uploading,
            UploadStatus::Completed => MetadataStatus::Completed,
            UploadStatus::Error => MetadataStatus::Error,
        }
    }
}

/// Where chunk uploads are being confirmed.
///
/// A session only ever moves from `Remote` to `LocalFallback`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadMode {
    /// Chunks are sent to the upload service and recorded locally.
    #[serde(rename = "remote")]
    Remote,
    /// Chunks are recorded locally only, without remote confirmation.
    #[serde(rename = "local_fallback")]
    LocalFallback,
}

impl UploadMode {
    pub fn is_remote(self) -> bool {
        matches!(self, UploadMode::Remote)
    }
}

/// Status reported for a file in the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus {
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "in_progress")]
    InProgress,
}

/// Snapshot published after each processed chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub file_id: String,
    pub file_name: String,
    /// Completed chunk indices in completion order.
    pub uploaded_chunks: Vec<u32>,
    pub total_chunks: u32,
    /// Percentage in `[0, 100]`.
    pub progress: f64,
    pub status: UploadStatus,
}

/// Consolidated record persisted when an upload finishes.
///
/// Also the shape returned by the upload service's metadata endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub file_id: String,
    pub file_name: String,
    /// File size in bytes, as a decimal string.
    pub size: String,
    /// Uploaded chunk indices as decimal strings.
    pub uploaded_chunks: Vec<String>,
    pub status: MetadataStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    /// RFC 3339 timestamp.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uploaded_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<UploadMode>,
}
