use std::collections::HashSet;

use chunkup_protocol::{UploadMode, UploadProgress, UploadStatus};

use crate::{ChunkPlan, ChunkRange, TransferError};

/// In-memory state of one upload call.
///
/// Owned by a single writer for the duration of the upload. Enforces:
/// - each chunk index is recorded at most once and lies in `[0, total_chunks)`
/// - `Completed` is reachable only when every chunk is recorded
/// - the mode only degrades, `Remote` to `LocalFallback`
#[derive(Debug, Clone)]
pub struct UploadSession {
    file_id: String,
    file_name: String,
    plan: ChunkPlan,
    /// Completed indices in completion order.
    uploaded: Vec<u32>,
    seen: HashSet<u32>,
    mode: UploadMode,
    status: UploadStatus,
}

impl UploadSession {
    /// Creates a new session in `Uploading` status.
    pub fn new(file_id: String, file_name: String, plan: ChunkPlan, mode: UploadMode) -> Self {
        Self {
            file_id,
            file_name,
            plan,
            uploaded: Vec::with_capacity(plan.total_chunks() as usize),
            seen: HashSet::new(),
            mode,
            status: UploadStatus::Uploading,
        }
    }

    /// Records a finished chunk.
    ///
    /// Returns `Ok(false)` if the index was already recorded.
    pub fn record_chunk(&mut self, index: u32) -> Result<bool, TransferError> {
        let total = self.plan.total_chunks();
        if index >= total {
            return Err(TransferError::ChunkOutOfRange { index, total });
        }
        if !self.seen.insert(index) {
            return Ok(false);
        }
        self.uploaded.push(index);
        Ok(true)
    }

    /// Seeds the session with chunks finished by an earlier, interrupted call.
    ///
    /// Indices outside the plan are ignored. Returns how many were accepted.
    pub fn restore_chunks(&mut self, indices: impl IntoIterator<Item = u32>) -> usize {
        indices
            .into_iter()
            .filter(|&i| matches!(self.record_chunk(i), Ok(true)))
            .count()
    }

    /// Switches to `LocalFallback`. Returns `true` only on the transition.
    pub fn degrade(&mut self) -> bool {
        if self.mode == UploadMode::LocalFallback {
            return false;
        }
        self.mode = UploadMode::LocalFallback;
        true
    }

    /// Marks the session completed.
    pub fn complete(&mut self) -> Result<(), TransferError> {
        let total = self.plan.total_chunks();
        let uploaded = self.uploaded_count();
        if uploaded != total {
            return Err(TransferError::Incomplete { uploaded, total });
        }
        self.status = UploadStatus::Completed;
        Ok(())
    }

    /// Marks the session failed (cancelled or aborted by a local error).
    pub fn fail(&mut self) {
        self.status = UploadStatus::Error;
    }

    /// Percentage of recorded chunks; an empty file counts as done.
    pub fn progress(&self) -> f64 {
        let total = self.plan.total_chunks();
        if total == 0 {
            return 100.0;
        }
        f64::from(self.uploaded_count()) / f64::from(total) * 100.0
    }

    /// Returns the observer-facing snapshot.
    pub fn snapshot(&self) -> UploadProgress {
        UploadProgress {
            file_id: self.file_id.clone(),
            file_name: self.file_name.clone(),
            uploaded_chunks: self.uploaded.clone(),
            total_chunks: self.plan.total_chunks(),
            progress: self.progress(),
            status: self.status,
        }
    }

    /// Ranges of the chunks not yet recorded, in index order.
    pub fn pending_ranges(&self) -> impl Iterator<Item = ChunkRange> + '_ {
        self.plan.ranges().filter(|r| !self.seen.contains(&r.index))
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn total_size(&self) -> u64 {
        self.plan.total_size()
    }

    pub fn total_chunks(&self) -> u32 {
        self.plan.total_chunks()
    }

    /// Completed indices in completion order.
    pub fn uploaded_chunks(&self) -> &[u32] {
        &self.uploaded
    }

    pub fn uploaded_count(&self) -> u32 {
        self.uploaded.len() as u32
    }

    pub fn mode(&self) -> UploadMode {
        self.mode
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == UploadStatus::Completed
    }
}
