//! Request and response bodies exchanged with the upload service.
//!
//! Upload requests are snake_case JSON, unlike the camelCase records in
//! [`crate::types`]. The download response is camelCase.

use serde::{Deserialize, Serialize};

/// Asks the upload service to issue an identifier for a new upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitUploadRequest {
    pub file_name: String,
    pub total_chunks: u32,
    pub user_id: String,
}

/// Identifier issued by the upload service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitUploadResponse {
    pub file_id: String,
}

/// Sends one chunk of an upload.
///
/// `content` is base64-encoded in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadChunkRequest {
    pub file_id: String,
    pub chunk_index: u32,
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
    /// SHA-256 hex digest of `content` (empty means no verification).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
}

/// Stored file returned by the upload service.
///
/// `content` is base64-encoded in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
    pub file_name: String,
}

/// Custom base64 serde module for byte payloads.
mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
