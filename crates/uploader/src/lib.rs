//! Resumable chunked upload orchestration.
//!
//! This crate implements the **client-side business logic** of chunked
//! uploads: it splits a file into fixed-size chunks, sends them to an
//! [`UploadService`] one at a time, and keeps a durable local ledger of
//! every processed chunk so an interrupted upload can be resumed and a
//! failing service never loses a file.
//!
//! # Pipeline
//!
//! 1. **Inspect**: read name, size and MIME type of the source file
//! 2. **Init**: obtain a file id from the service, or fall back to a
//!    locally generated `local-` id
//! 3. **Register**: store the blob record and the session's mode before any
//!    chunk
//! 4. **Transmit**: send, record and report each chunk in index order;
//!    a failed send downgrades the rest of the session, durably, to local
//!    fallback
//! 5. **Finish**: store the consolidated metadata record
//!
//! Listing, metadata lookup, deletion and time-based GC operate on the same
//! local store. Downloads come from the service only.

mod delete;
pub mod config;
pub mod error;
mod gc;
pub mod orchestrator;
mod registry;
pub mod remote;
mod session;
pub mod source;
mod transmitter;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience.
pub use config::{DEFAULT_USER_ID, UploaderConfig};
pub use delete::delete_file;
pub use error::{RemoteError, UploadError};
pub use gc::collect_garbage;
pub use orchestrator::Uploader;
pub use registry::list_files;
pub use remote::{
    DeleteOutcome, HttpServiceConfig, HttpUploadService, OfflineService, ServiceFuture,
    UploadService,
};
pub use session::{is_local_file_id, local_file_id};
pub use source::{SourceFile, detect_content_type};
pub use types::{DeleteReport, FileListing, GcReport, RemoteDelete};

pub use chunkup_protocol::DownloadResponse;
pub use chunkup_store::LocalStore;
pub use chunkup_transfer::{ProgressEmitter, UploadSession};
pub use tokio_util::sync::CancellationToken;
