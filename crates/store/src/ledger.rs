use std::collections::BTreeSet;
use std::sync::Arc;

use chunkup_protocol::UploadMetadata;
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tracing::{debug, warn};

use crate::records::{ChunkRecord, SessionRecord};
use crate::{KeySpace, StoreError};

/// Root of every ledger key.
const ROOT: &str = "upload/";
const CHUNK_SEGMENT: &str = "chunk/";
const METADATA_SEGMENT: &str = "metadata";
const SESSION_SEGMENT: &str = "session";

/// Key prefix owning every entry of one file.
///
/// The file id is percent-encoded so it never contains `/`, which keeps one
/// file's prefix from matching another file's keys.
fn file_prefix(file_id: &str) -> String {
    format!("{ROOT}{}/", utf8_percent_encode(file_id, NON_ALPHANUMERIC))
}

fn chunk_key(file_id: &str, index: u32) -> String {
    // Zero-padded so key order matches index order.
    format!("{}{CHUNK_SEGMENT}{index:010}", file_prefix(file_id))
}

fn metadata_key(file_id: &str) -> String {
    format!("{}{METADATA_SEGMENT}", file_prefix(file_id))
}

fn session_key(file_id: &str) -> String {
    format!("{}{SESSION_SEGMENT}", file_prefix(file_id))
}

/// Splits a chunk key into its file id and index.
fn parse_chunk_key(key: &str) -> Option<(String, u32)> {
    let rest = key.strip_prefix(ROOT)?;
    let (encoded_id, rest) = rest.split_once('/')?;
    let index = rest.strip_prefix(CHUNK_SEGMENT)?.parse().ok()?;
    let file_id = percent_decode_str(encoded_id).decode_utf8().ok()?;
    Some((file_id.into_owned(), index))
}

/// A chunk entry as found during a full ledger scan.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub key: String,
    pub file_id: String,
    pub chunk_index: u32,
    /// `None` if the stored value could not be deserialized.
    pub record: Option<ChunkRecord>,
}

/// Per-chunk and per-session bookkeeping.
#[derive(Clone)]
pub struct Ledger {
    space: Arc<dyn KeySpace>,
}

impl Ledger {
    pub fn new(space: Arc<dyn KeySpace>) -> Self {
        Self { space }
    }

    /// Upserts a chunk record. Writing the same key twice leaves one entry.
    pub fn put_chunk(&self, record: &ChunkRecord) -> Result<(), StoreError> {
        let value = serde_json::to_string(record)?;
        self.space
            .put(&chunk_key(&record.file_id, record.chunk_index), value)
    }

    /// Returns the record of one chunk.
    pub fn get_chunk(&self, file_id: &str, index: u32) -> Result<Option<ChunkRecord>, StoreError> {
        let key = chunk_key(file_id, index);
        let Some(raw) = self.space.get(&key)? else {
            return Ok(None);
        };
        Ok(self.decode_or_discard::<ChunkRecord>(&key, &raw))
    }

    /// Returns the indices recorded as uploaded for `file_id`, ascending.
    ///
    /// Gaps are reported faithfully: a missing middle chunk does not hide
    /// the chunks after it.
    pub fn uploaded_chunks(&self, file_id: &str) -> Result<BTreeSet<u32>, StoreError> {
        let prefix = format!("{}{CHUNK_SEGMENT}", file_prefix(file_id));
        let mut indices = BTreeSet::new();
        for (key, raw) in self.space.scan_prefix(&prefix)? {
            if let Some(rec) = self.decode_or_discard::<ChunkRecord>(&key, &raw)
                && rec.uploaded
            {
                indices.insert(rec.chunk_index);
            }
        }
        Ok(indices)
    }

    /// Returns every chunk entry in the ledger, including unreadable ones.
    pub fn chunk_entries(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        let entries = self
            .space
            .scan_prefix(ROOT)?
            .into_iter()
            .filter_map(|(key, raw)| {
                let (file_id, chunk_index) = parse_chunk_key(&key)?;
                let record = serde_json::from_str::<ChunkRecord>(&raw).ok();
                Some(LedgerEntry {
                    key,
                    file_id,
                    chunk_index,
                    record,
                })
            })
            .collect();
        Ok(entries)
    }

    /// Removes a single entry by its raw key.
    pub fn remove_entry(&self, key: &str) -> Result<bool, StoreError> {
        self.space.delete(key)
    }

    /// Stores the consolidated record of a finished upload.
    pub fn put_metadata(&self, metadata: &UploadMetadata) -> Result<(), StoreError> {
        let value = serde_json::to_string(metadata)?;
        self.space.put(&metadata_key(&metadata.file_id), value)
    }

    /// Returns the consolidated record of a finished upload.
    pub fn get_metadata(&self, file_id: &str) -> Result<Option<UploadMetadata>, StoreError> {
        let key = metadata_key(file_id);
        let Some(raw) = self.space.get(&key)? else {
            return Ok(None);
        };
        Ok(self.decode_or_discard::<UploadMetadata>(&key, &raw))
    }

    /// Stores the current mode of a session, replacing any earlier one.
    pub fn put_session(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let value = serde_json::to_string(record)?;
        self.space.put(&session_key(&record.file_id), value)
    }

    /// Returns the stored mode record of a session.
    pub fn get_session(&self, file_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let key = session_key(file_id);
        let Some(raw) = self.space.get(&key)? else {
            return Ok(None);
        };
        Ok(self.decode_or_discard::<SessionRecord>(&key, &raw))
    }

    /// Returns raw entries of one file (chunks, session and metadata).
    pub fn scan_file(&self, file_id: &str) -> Result<Vec<(String, String)>, StoreError> {
        self.space.scan_prefix(&file_prefix(file_id))
    }

    /// Removes every entry of one file. Returns the number removed.
    pub fn purge_file(&self, file_id: &str) -> Result<usize, StoreError> {
        self.space.delete_prefix(&file_prefix(file_id))
    }

    /// Deserializes `raw`, removing the entry if it is unreadable.
    fn decode_or_discard<T: serde::de::DeserializeOwned>(&self, key: &str, raw: &str) -> Option<T> {
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "discarding malformed ledger record");
                if let Err(e) = self.space.delete(key) {
                    warn!(key, error = %e, "failed to remove malformed ledger record");
                }
                None
            }
        }
    }
}
