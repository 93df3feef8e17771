//! Session initialization: obtain a file id, choose the mode, register the
//! blob and the session's mode.

use chrono::Utc;
use chunkup_protocol::constants::LOCAL_ID_PREFIX;
use chunkup_protocol::{InitUploadRequest, UploadMode};
use chunkup_store::{LocalStore, SessionRecord};
use chunkup_transfer::{ChunkPlan, UploadSession};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{RemoteError, UploadError};
use crate::remote::UploadService;
use crate::source::SourceFile;

/// Returns `true` for identifiers in the locally generated namespace.
///
/// The service never issues such ids: one that does is treated as a failed
/// init.
pub fn is_local_file_id(file_id: &str) -> bool {
    file_id.starts_with(LOCAL_ID_PREFIX)
}

/// Generates a fresh local identifier.
pub fn local_file_id() -> String {
    format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4())
}

/// Starts a new upload session for `source`.
///
/// A failed init is not an error: the session falls back to a local id and
/// `LocalFallback` mode for its whole lifetime. The blob record and the
/// session record are written before any chunk.
pub(crate) async fn start_session(
    service: &dyn UploadService,
    store: &LocalStore,
    source: &SourceFile,
    user_id: &str,
) -> Result<UploadSession, UploadError> {
    let plan = ChunkPlan::new(source.size)?;

    let request = InitUploadRequest {
        file_name: source.name.clone(),
        total_chunks: plan.total_chunks(),
        user_id: user_id.to_string(),
    };

    let (file_id, mode) = match request_file_id(service, &request).await {
        Ok(file_id) => (file_id, UploadMode::Remote),
        Err(e) => {
            warn!(
                file = %source.name,
                error = %e,
                "init upload failed, continuing in local fallback"
            );
            (local_file_id(), UploadMode::LocalFallback)
        }
    };

    let now = Utc::now();
    store.blobs().put(&source.blob_record(&file_id, now))?;
    store
        .ledger()
        .put_session(&SessionRecord::new(&file_id, mode, now))?;

    info!(
        file_id = %file_id,
        file = %source.name,
        size = source.size,
        chunks = plan.total_chunks(),
        mode = ?mode,
        "upload session started"
    );

    Ok(UploadSession::new(file_id, source.name.clone(), plan, mode))
}

async fn request_file_id(
    service: &dyn UploadService,
    request: &InitUploadRequest,
) -> Result<String, RemoteError> {
    let resp = service.init_upload(request).await?;
    if resp.file_id.trim().is_empty() {
        return Err(RemoteError::Malformed("empty file_id".into()));
    }
    if is_local_file_id(&resp.file_id) {
        return Err(RemoteError::Malformed(format!(
            "file_id {} uses the local prefix",
            resp.file_id
        )));
    }
    Ok(resp.file_id)
}
