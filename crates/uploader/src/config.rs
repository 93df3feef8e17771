use std::time::Duration;

use chunkup_protocol::UploadMode;
use chunkup_protocol::constants::{LOCAL_CHUNK_DELAY, REMOTE_CHUNK_DELAY};

/// User id sent when the caller does not supply one.
pub const DEFAULT_USER_ID: &str = "default-user";

/// Tunables of the upload orchestrator.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Pause after each chunk sent to the service.
    pub remote_chunk_delay: Duration,
    /// Pause after each chunk recorded in local fallback.
    pub local_chunk_delay: Duration,
    /// User id used when `upload_file` is called without one.
    pub default_user_id: String,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            remote_chunk_delay: REMOTE_CHUNK_DELAY,
            local_chunk_delay: LOCAL_CHUNK_DELAY,
            default_user_id: DEFAULT_USER_ID.into(),
        }
    }
}

impl UploaderConfig {
    /// Configuration without inter-chunk pauses.
    pub fn without_delays() -> Self {
        Self {
            remote_chunk_delay: Duration::ZERO,
            local_chunk_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Pause applied after a chunk processed in `mode`.
    pub fn chunk_delay(&self, mode: UploadMode) -> Duration {
        match mode {
            UploadMode::Remote => self.remote_chunk_delay,
            UploadMode::LocalFallback => self.local_chunk_delay,
        }
    }
}
