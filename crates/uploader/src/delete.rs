//! Remote-then-local file deletion.

use chunkup_store::LocalStore;
use tracing::{info, warn};

use crate::error::UploadError;
use crate::remote::UploadService;
use crate::types::{DeleteReport, RemoteDelete};

/// Deletes `file_id` remotely, then purges every local trace of it.
///
/// The remote outcome never prevents the local purge. Deleting an unknown
/// or already deleted id succeeds.
pub async fn delete_file(
    service: &dyn UploadService,
    store: &LocalStore,
    file_id: &str,
) -> Result<DeleteReport, UploadError> {
    let remote = match service.delete_file(file_id).await {
        Ok(outcome) => RemoteDelete::from(outcome),
        Err(e) => {
            warn!(file_id, error = %e, "remote delete failed, purging local data");
            RemoteDelete::Failed(e.to_string())
        }
    };

    let blob_removed = store.blobs().delete(file_id)?;
    let purged_entries = store.ledger().purge_file(file_id)?;

    info!(
        file_id,
        remote = ?remote,
        purged_entries,
        blob_removed,
        "file deleted"
    );

    Ok(DeleteReport {
        file_id: file_id.to_string(),
        remote,
        purged_entries,
        blob_removed,
    })
}
