//! Wire and record schemas for chunked uploads.
//!
//! Shared by the uploader crates and the wire compatibility tests. Types here
//! carry no behavior beyond (de)serialization and small derived helpers.

pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::CHUNK_SIZE;
pub use messages::{DownloadResponse, InitUploadRequest, InitUploadResponse, UploadChunkRequest};
pub use types::{
    ListingStatus, MetadataStatus, UploadMetadata, UploadMode, UploadProgress, UploadStatus,
};
