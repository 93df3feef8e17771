use std::sync::Arc;

use tracing::{debug, warn};

use crate::records::BlobRecord;
use crate::{KeySpace, StoreError};

/// One descriptive record per file, keyed by file id.
#[derive(Clone)]
pub struct BlobRegistry {
    space: Arc<dyn KeySpace>,
}

impl BlobRegistry {
    pub fn new(space: Arc<dyn KeySpace>) -> Self {
        Self { space }
    }

    /// Stores the record of a file.
    pub fn put(&self, record: &BlobRecord) -> Result<(), StoreError> {
        let value = serde_json::to_string(record)?;
        self.space.put(&record.file_id, value)
    }

    /// Returns the record of `file_id`.
    pub fn get(&self, file_id: &str) -> Result<Option<BlobRecord>, StoreError> {
        let Some(raw) = self.space.get(file_id)? else {
            return Ok(None);
        };
        Ok(self.decode_or_discard(file_id, &raw))
    }

    /// Returns every readable record, ordered by file id.
    pub fn get_all(&self) -> Result<Vec<BlobRecord>, StoreError> {
        let records = self
            .space
            .scan_prefix("")?
            .into_iter()
            .filter_map(|(key, raw)| self.decode_or_discard(&key, &raw))
            .collect();
        Ok(records)
    }

    /// Removes the record of `file_id`. Returns `true` if it existed.
    pub fn delete(&self, file_id: &str) -> Result<bool, StoreError> {
        self.space.delete(file_id)
    }

    fn decode_or_discard(&self, key: &str, raw: &str) -> Option<BlobRecord> {
        match serde_json::from_str(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(key, error = %e, "discarding malformed blob record");
                if let Err(e) = self.space.delete(key) {
                    warn!(key, error = %e, "failed to remove malformed blob record");
                }
                None
            }
        }
    }
}
