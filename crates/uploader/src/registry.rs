//! File listing built from the blob registry and the ledger.

use chunkup_protocol::ListingStatus;
use chunkup_store::LocalStore;

use crate::error::UploadError;
use crate::types::FileListing;

/// Lists every registered file.
///
/// A file with at least one recorded chunk is reported `Completed`; a file
/// with none is `InProgress`. Completed files come first, otherwise the
/// blob registry order is kept.
pub fn list_files(store: &LocalStore) -> Result<Vec<FileListing>, UploadError> {
    let mut listings = Vec::new();
    for blob in store.blobs().get_all()? {
        let uploaded = store.ledger().uploaded_chunks(&blob.file_id)?;
        let status = if uploaded.is_empty() {
            ListingStatus::InProgress
        } else {
            ListingStatus::Completed
        };

        listings.push(FileListing {
            file_id: blob.file_id,
            file_name: blob.file_name,
            size: blob.file_size.to_string(),
            mime_type: blob.mime_type,
            uploaded_chunks: uploaded.iter().map(ToString::to_string).collect(),
            status,
        });
    }

    // Stable: ties keep registry order.
    listings.sort_by_key(|l| l.status != ListingStatus::Completed);
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chunkup_store::{BlobRecord, ChunkRecord};

    fn register(store: &LocalStore, file_id: &str, chunks: &[u32]) {
        store
            .blobs()
            .put(&BlobRecord {
                file_id: file_id.into(),
                file_name: format!("{file_id}.bin"),
                file_size: 5,
                mime_type: "application/octet-stream".into(),
                last_modified_at: None,
                stored_at: Utc::now(),
            })
            .unwrap();
        for &i in chunks {
            store
                .ledger()
                .put_chunk(&ChunkRecord::uploaded(file_id, i, 4, Utc::now()))
                .unwrap();
        }
    }

    #[test]
    fn completed_first_then_registry_order() {
        let store = LocalStore::in_memory();
        register(&store, "a", &[]);
        register(&store, "b", &[0]);
        register(&store, "c", &[]);
        register(&store, "d", &[0, 1]);

        let ids: Vec<_> = list_files(&store)
            .unwrap()
            .into_iter()
            .map(|l| (l.file_id, l.status))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("b".to_string(), ListingStatus::Completed),
                ("d".to_string(), ListingStatus::Completed),
                ("a".to_string(), ListingStatus::InProgress),
                ("c".to_string(), ListingStatus::InProgress),
            ]
        );
    }

    #[test]
    fn partial_upload_counts_as_completed() {
        let store = LocalStore::in_memory();
        register(&store, "f1", &[0, 2]);

        let listing = &list_files(&store).unwrap()[0];
        assert_eq!(listing.status, ListingStatus::Completed);
        assert_eq!(listing.uploaded_chunks, vec!["0", "2"]);
        assert_eq!(listing.size, "5");
    }

    #[test]
    fn empty_registry() {
        assert!(list_files(&LocalStore::in_memory()).unwrap().is_empty());
    }
}
