use std::time::Duration;

/// Size of every chunk except possibly the last one: 4 MiB.
///
/// Fixed by the upload service contract; not configurable at runtime.
pub const CHUNK_SIZE: u64 = 4 * 1024 * 1024;

/// Age after which abandoned ledger entries are garbage-collected.
pub const LEDGER_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Delay between chunks while the remote service is in use.
pub const REMOTE_CHUNK_DELAY: Duration = Duration::from_millis(100);

/// Delay between chunks once a session records locally only.
pub const LOCAL_CHUNK_DELAY: Duration = Duration::from_millis(50);

/// Timeout applied to each request against the upload service.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Prefix of identifiers synthesized on the client when the upload service
/// could not issue one.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Upload service routes, relative to the configured base URL.
pub mod routes {
    pub const INIT_UPLOAD: &str = "/v1/init-upload";
    pub const UPLOAD_CHUNK: &str = "/v1/upload-chunk";

    /// `GET` (download) and `DELETE` target for a stored file.
    pub fn file(file_id: &str) -> String {
        format!("/v1/files/{file_id}")
    }

    /// `GET` target for an upload's metadata.
    pub fn metadata(file_id: &str) -> String {
        format!("/v1/uploads/{file_id}/metadata")
    }
}
