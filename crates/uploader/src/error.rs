//! Upload error types.

/// Errors that can fail an upload-related call.
///
/// Remote failures never appear here for uploads: they are absorbed into the
/// local fallback mode. Only downloads, whose content lives on the service
/// alone, report one.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("local store error: {0}")]
    Store(#[from] chunkup_store::StoreError),

    #[error("transfer error: {0}")]
    Transfer(#[from] chunkup_transfer::TransferError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("source file changed: expected {expected} bytes, found {actual}")]
    SourceChanged { expected: u64, actual: u64 },

    #[error("content of {file_id} is not available from the upload service: {source}")]
    ContentUnavailable {
        file_id: String,
        #[source]
        source: RemoteError,
    },

    #[error("cancelled")]
    Cancelled,
}

/// Errors from the upload service.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid auth token")]
    InvalidToken,

    #[error("upload service unavailable")]
    Unavailable,
}
