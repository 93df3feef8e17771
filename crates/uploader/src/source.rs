//! Local source file inspection.

use std::path::Path;

use chrono::{DateTime, Utc};
use chunkup_store::BlobRecord;

use crate::error::UploadError;

/// MIME type used when the extension is unknown.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Descriptive facts about a file about to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub modified: Option<DateTime<Utc>>,
}

impl SourceFile {
    /// Reads name, size and modification time of a regular file.
    pub fn inspect(path: &Path) -> Result<Self, UploadError> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(UploadError::NotFound(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = metadata.modified().ok().map(DateTime::<Utc>::from);

        Ok(Self {
            mime_type: detect_content_type(&name)
                .unwrap_or(FALLBACK_MIME_TYPE)
                .to_string(),
            name,
            size: metadata.len(),
            modified,
        })
    }

    /// Blob registry record for this file under `file_id`.
    pub fn blob_record(&self, file_id: &str, stored_at: DateTime<Utc>) -> BlobRecord {
        BlobRecord {
            file_id: file_id.to_string(),
            file_name: self.name.clone(),
            file_size: self.size,
            mime_type: self.mime_type.clone(),
            last_modified_at: self.modified,
            stored_at,
        }
    }
}

/// Guesses a MIME type from the file extension.
pub fn detect_content_type(name: &str) -> Option<&'static str> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("txt" | "log") => Some("text/plain"),
        Some("csv") => Some("text/csv"),
        Some("html" | "htm") => Some("text/html"),
        Some("json") => Some("application/json"),
        Some("pdf") => Some("application/pdf"),
        Some("zip") => Some("application/zip"),
        Some("gz") => Some("application/gzip"),
        Some("tar") => Some("application/x-tar"),
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        Some("svg") => Some("image/svg+xml"),
        Some("mp3") => Some("audio/mpeg"),
        Some("wav") => Some("audio/wav"),
        Some("mp4") => Some("video/mp4"),
        Some("webm") => Some("video/webm"),
        Some("mov") => Some("video/quicktime"),
        _ => None,
    }
}
