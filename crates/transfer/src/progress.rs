use tokio::sync::mpsc;
use tracing::trace;

use chunkup_protocol::UploadProgress;

/// Callback invoked with each progress snapshot.
pub type ProgressCallback = Box<dyn Fn(&UploadProgress) + Send + Sync>;

/// Publishes session snapshots to caller-owned observers.
///
/// Emission never blocks and never fails: a full or closed channel drops the
/// snapshot, and having no observers at all is fine.
#[derive(Default)]
pub struct ProgressEmitter {
    callbacks: Vec<ProgressCallback>,
    channel: Option<mpsc::Sender<UploadProgress>>,
}

impl ProgressEmitter {
    /// Creates an emitter with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an emitter feeding a bounded channel, returning its receiver.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<UploadProgress>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let emitter = Self {
            callbacks: Vec::new(),
            channel: Some(tx),
        };
        (emitter, rx)
    }

    /// Registers a progress callback.
    pub fn on_progress(&mut self, callback: ProgressCallback) {
        self.callbacks.push(callback);
    }

    /// Delivers a snapshot to every observer.
    pub fn emit(&self, progress: &UploadProgress) {
        for cb in &self.callbacks {
            cb(progress);
        }
        if let Some(tx) = &self.channel {
            // Full or closed: drop the snapshot rather than stall the upload.
            if let Err(e) = tx.try_send(progress.clone()) {
                trace!(file_id = %progress.file_id, error = %e, "progress snapshot dropped");
            }
        }
    }
}
