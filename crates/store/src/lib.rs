//! Local durable store for upload bookkeeping.
//!
//! Two independent key spaces:
//! - the **ledger**: one small record per uploaded chunk, the current mode of
//!   each session, and one consolidated metadata record per finished upload
//! - the **blob registry**: one descriptive record per file, written when the
//!   upload starts
//!
//! Both are local to one client instance, survive restarts when backed by
//! [`FileKeySpace`], and only offer single-key atomic writes. Several
//! processes may share one store directory: each key is its own file, so
//! writers of different keys never lose each other's records. Records that
//! fail to deserialize read as absent and are removed opportunistically.

mod blobs;
mod keyspace;
mod ledger;
mod paths;
mod records;

use std::path::Path;
use std::sync::Arc;

pub use blobs::BlobRegistry;
pub use keyspace::{FileKeySpace, KeySpace, MemoryKeySpace};
pub use ledger::{Ledger, LedgerEntry};
pub use paths::{config_dir, default_store_dir};
pub use records::{BlobRecord, ChunkRecord, SessionRecord};

/// Errors from local store operations.
///
/// There is no fallback beneath local storage, so these reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store directory not available")]
    NoStoreDir,
}

/// Ledger and blob registry of one client instance.
#[derive(Clone)]
pub struct LocalStore {
    ledger: Ledger,
    blobs: BlobRegistry,
}

impl LocalStore {
    /// Wraps two existing key spaces.
    pub fn new(ledger: Arc<dyn KeySpace>, blobs: Arc<dyn KeySpace>) -> Self {
        Self {
            ledger: Ledger::new(ledger),
            blobs: BlobRegistry::new(blobs),
        }
    }

    /// Opens (or creates) a file-backed store under `dir`.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let ledger = FileKeySpace::open(dir.join("ledger"))?;
        let blobs = FileKeySpace::open(dir.join("blobs"))?;
        Ok(Self::new(Arc::new(ledger), Arc::new(blobs)))
    }

    /// Opens the store in the platform default location.
    pub fn open_default() -> Result<Self, StoreError> {
        let dir = default_store_dir().ok_or(StoreError::NoStoreDir)?;
        Self::open(&dir)
    }

    /// Creates an ephemeral store, isolated from every other instance.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryKeySpace::new()),
            Arc::new(MemoryKeySpace::new()),
        )
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn blobs(&self) -> &BlobRegistry {
        &self.blobs
    }
}
