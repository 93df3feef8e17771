//! Upload orchestrator.
//!
//! Ties the service, the local store and the transmitter together behind
//! the public upload, resume, listing, lookup, download, delete and GC
//! operations.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chunkup_protocol::{DownloadResponse, UploadMetadata, UploadMode};
use chunkup_store::{LocalStore, SessionRecord};
use chunkup_transfer::{ChunkPlan, ProgressEmitter, UploadSession};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::UploaderConfig;
use crate::error::UploadError;
use crate::remote::UploadService;
use crate::session::start_session;
use crate::source::SourceFile;
use crate::transmitter::Transmitter;
use crate::types::{DeleteReport, FileListing, GcReport};

/// Client-side upload orchestrator for one store instance.
pub struct Uploader {
    service: Arc<dyn UploadService>,
    store: LocalStore,
    config: UploaderConfig,
}

impl Uploader {
    /// Creates an orchestrator.
    pub fn new(service: Arc<dyn UploadService>, store: LocalStore, config: UploaderConfig) -> Self {
        Self {
            service,
            store,
            config,
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    /// Uploads the file at `path`.
    ///
    /// Remote failures never fail the call: the session degrades to local
    /// fallback and still completes. Only local errors (unreadable source,
    /// store failure) and cancellation are returned.
    pub async fn upload_file(
        &self,
        path: &Path,
        user_id: Option<&str>,
        progress: &ProgressEmitter,
        cancel: CancellationToken,
    ) -> Result<UploadSession, UploadError> {
        let source = SourceFile::inspect(path)?;
        let user_id = user_id.unwrap_or(&self.config.default_user_id);

        let mut session =
            start_session(self.service.as_ref(), &self.store, &source, user_id).await?;

        self.transmitter(progress, &cancel)
            .run(&mut session, path, user_id)
            .await?;
        Ok(session)
    }

    /// Continues an interrupted upload of `file_id` from `path`.
    ///
    /// Only chunks missing from the ledger are processed. The mode comes from
    /// the session record: a session that started locally or degraded stays
    /// in local fallback, and so does one with no record at all. Only a
    /// session recorded as remote tries the service again.
    pub async fn resume(
        &self,
        file_id: &str,
        path: &Path,
        user_id: Option<&str>,
        progress: &ProgressEmitter,
        cancel: CancellationToken,
    ) -> Result<UploadSession, UploadError> {
        let blob = self
            .store
            .blobs()
            .get(file_id)?
            .ok_or_else(|| UploadError::NotFound(file_id.to_string()))?;

        let source = SourceFile::inspect(path)?;
        if source.size != blob.file_size {
            return Err(UploadError::SourceChanged {
                expected: blob.file_size,
                actual: source.size,
            });
        }

        let mode = self
            .store
            .ledger()
            .get_session(file_id)?
            .map_or(UploadMode::LocalFallback, |rec| rec.mode);
        self.store
            .ledger()
            .put_session(&SessionRecord::new(file_id, mode, Utc::now()))?;

        let plan = ChunkPlan::new(blob.file_size)?;
        let mut session = UploadSession::new(file_id.to_string(), blob.file_name, plan, mode);
        let restored = session.restore_chunks(self.store.ledger().uploaded_chunks(file_id)?);

        info!(
            file_id,
            restored,
            total = session.total_chunks(),
            mode = ?mode,
            "resuming upload"
        );

        let user_id = user_id.unwrap_or(&self.config.default_user_id);
        self.transmitter(progress, &cancel)
            .run(&mut session, path, user_id)
            .await?;
        Ok(session)
    }

    /// Lists every registered file, completed ones first.
    pub fn list_files(&self) -> Result<Vec<FileListing>, UploadError> {
        crate::registry::list_files(&self.store)
    }

    /// Indices recorded as uploaded for `file_id`, ascending.
    pub fn uploaded_chunks(&self, file_id: &str) -> Result<Vec<u32>, UploadError> {
        Ok(self
            .store
            .ledger()
            .uploaded_chunks(file_id)?
            .into_iter()
            .collect())
    }

    /// Looks up upload metadata, asking the service first.
    pub async fn get_upload_metadata(&self, file_id: &str) -> Result<UploadMetadata, UploadError> {
        match self.service.get_metadata(file_id).await {
            Ok(metadata) => return Ok(metadata),
            Err(e) => debug!(file_id, error = %e, "remote metadata unavailable, using local"),
        }

        self.store
            .ledger()
            .get_metadata(file_id)?
            .ok_or_else(|| UploadError::NotFound(file_id.to_string()))
    }

    /// Downloads the content of a stored file from the service.
    ///
    /// Content is never kept locally. If the service cannot provide it, an
    /// id with no local metadata is `NotFound` and a known one is
    /// `ContentUnavailable`.
    pub async fn download_file(&self, file_id: &str) -> Result<DownloadResponse, UploadError> {
        match self.service.download_file(file_id).await {
            Ok(file) => Ok(file),
            Err(e) => {
                debug!(file_id, error = %e, "remote download failed");
                if self.store.ledger().get_metadata(file_id)?.is_none() {
                    return Err(UploadError::NotFound(file_id.to_string()));
                }
                Err(UploadError::ContentUnavailable {
                    file_id: file_id.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Deletes a file remotely and purges its local data.
    pub async fn delete_file(&self, file_id: &str) -> Result<DeleteReport, UploadError> {
        crate::delete::delete_file(self.service.as_ref(), &self.store, file_id).await
    }

    /// Removes expired ledger entries as of now.
    pub fn collect_garbage(&self) -> Result<GcReport, UploadError> {
        self.collect_garbage_at(Utc::now())
    }

    /// Removes ledger entries expired as of `now`.
    pub fn collect_garbage_at(&self, now: DateTime<Utc>) -> Result<GcReport, UploadError> {
        crate::gc::collect_garbage(self.store.ledger(), now)
    }

    fn transmitter<'a>(
        &'a self,
        progress: &'a ProgressEmitter,
        cancel: &'a CancellationToken,
    ) -> Transmitter<'a> {
        Transmitter {
            service: self.service.as_ref(),
            ledger: self.store.ledger(),
            config: &self.config,
            progress,
            cancel,
        }
    }
}
