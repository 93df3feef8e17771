//! Sequential chunk transmission.
//!
//! Chunks are processed strictly in index order, one at a time. Every
//! processed chunk is recorded in the ledger whether or not the service
//! received it; a service failure only downgrades the session to local
//! fallback for the remaining chunks. The downgrade is persisted before the
//! failed chunk is recorded, so a later resume stays local.

use std::path::Path;

use chrono::Utc;
use chunkup_protocol::{UploadChunkRequest, UploadMetadata};
use chunkup_store::{ChunkRecord, Ledger, SessionRecord};
use chunkup_transfer::{Chunk, ChunkRange, ChunkReader, ProgressEmitter, TransferError, UploadSession};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::UploaderConfig;
use crate::error::UploadError;
use crate::remote::UploadService;

/// Drives one session from its pending chunks to completion.
pub(crate) struct Transmitter<'a> {
    pub service: &'a dyn UploadService,
    pub ledger: &'a Ledger,
    pub config: &'a UploaderConfig,
    pub progress: &'a ProgressEmitter,
    pub cancel: &'a CancellationToken,
}

impl Transmitter<'_> {
    /// Processes every pending chunk of `session`, reading from `path`.
    ///
    /// On success the session is `Completed` and the consolidated metadata
    /// record is stored. On cancellation the session is marked `Error`, a
    /// final snapshot is emitted and the chunks already recorded stay in the
    /// ledger.
    pub async fn run(
        &self,
        session: &mut UploadSession,
        path: &Path,
        user_id: &str,
    ) -> Result<(), UploadError> {
        let pending: Vec<ChunkRange> = session.pending_ranges().collect();
        if !pending.is_empty() {
            let mut reader = open_reader(path).await?;

            for range in pending {
                if self.cancel.is_cancelled() {
                    return Err(self.abort(session));
                }

                let (r, chunk) = read_chunk(reader, range).await?;
                reader = r;
                self.process(session, chunk?).await?;
            }
        }

        session.complete()?;
        self.ledger.put_metadata(&consolidated_metadata(session, user_id))?;

        info!(
            file_id = %session.file_id(),
            chunks = session.total_chunks(),
            mode = ?session.mode(),
            "upload completed"
        );
        Ok(())
    }

    /// Sends (in remote mode), records and reports one chunk.
    async fn process(&self, session: &mut UploadSession, chunk: Chunk) -> Result<(), UploadError> {
        let index = chunk.index;
        let total = session.total_chunks();

        if session.mode().is_remote() {
            self.send(session, chunk).await?;
        }

        self.ledger
            .put_chunk(&ChunkRecord::uploaded(session.file_id(), index, total, Utc::now()))?;
        session.record_chunk(index)?;
        self.progress.emit(&session.snapshot());

        debug!(
            file_id = %session.file_id(),
            chunk = index,
            total,
            mode = ?session.mode(),
            "chunk processed"
        );

        let delay = self.config.chunk_delay(session.mode());
        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.cancel.cancelled() => {}
            }
        }
        Ok(())
    }

    /// Sends one chunk, degrading the session on failure.
    async fn send(&self, session: &mut UploadSession, chunk: Chunk) -> Result<(), UploadError> {
        let request = UploadChunkRequest {
            file_id: session.file_id().to_string(),
            chunk_index: chunk.index,
            content: chunk.data,
            checksum: chunk.checksum,
        };

        if let Err(e) = self.service.upload_chunk(&request).await
            && session.degrade()
        {
            warn!(
                file_id = %session.file_id(),
                chunk = chunk.index,
                error = %e,
                "chunk upload failed, continuing in local fallback"
            );
            self.ledger.put_session(&SessionRecord::new(
                session.file_id(),
                session.mode(),
                Utc::now(),
            ))?;
        }
        Ok(())
    }

    fn abort(&self, session: &mut UploadSession) -> UploadError {
        session.fail();
        self.progress.emit(&session.snapshot());
        info!(
            file_id = %session.file_id(),
            uploaded = session.uploaded_count(),
            total = session.total_chunks(),
            "upload cancelled"
        );
        UploadError::Cancelled
    }
}

async fn open_reader(path: &Path) -> Result<ChunkReader, UploadError> {
    let path = path.to_path_buf();
    let reader = tokio::task::spawn_blocking(move || ChunkReader::open(&path))
        .await
        .map_err(std::io::Error::other)??;
    Ok(reader)
}

/// Reads one range on the blocking pool, handing the reader back.
async fn read_chunk(
    mut reader: ChunkReader,
    range: ChunkRange,
) -> Result<(ChunkReader, Result<Chunk, TransferError>), UploadError> {
    let result = tokio::task::spawn_blocking(move || {
        let chunk = reader.read_chunk(&range);
        (reader, chunk)
    })
    .await
    .map_err(std::io::Error::other)?;
    Ok(result)
}

/// Session-level record stored once the loop finishes.
fn consolidated_metadata(session: &UploadSession, user_id: &str) -> UploadMetadata {
    let mut indices = session.uploaded_chunks().to_vec();
    indices.sort_unstable();

    UploadMetadata {
        file_id: session.file_id().to_string(),
        file_name: session.file_name().to_string(),
        size: session.total_size().to_string(),
        uploaded_chunks: indices.iter().map(ToString::to_string).collect(),
        status: session.status().into(),
        user_id: user_id.to_string(),
        uploaded_at: Utc::now().to_rfc3339(),
        mode: Some(session.mode()),
    }
}
