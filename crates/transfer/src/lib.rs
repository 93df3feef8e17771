//! Chunked upload building blocks: planning, reading, session state, progress.
//!
//! Nothing here talks to the network or to durable storage; the uploader
//! crate wires these pieces to the upload service and the local store.

mod chunked;
mod progress;
mod types;

pub use chunked::{Chunk, ChunkPlan, ChunkRange, ChunkRanges, ChunkReader, checksum_bytes};
pub use progress::{ProgressCallback, ProgressEmitter};
pub use types::UploadSession;

pub use chunkup_protocol::CHUNK_SIZE;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file too large to plan: {0} bytes")]
    TooLarge(u64),

    #[error("chunk {index} out of range (total {total})")]
    ChunkOutOfRange { index: u32, total: u32 },

    #[error("session incomplete: {uploaded} of {total} chunks uploaded")]
    Incomplete { uploaded: u32, total: u32 },
}
