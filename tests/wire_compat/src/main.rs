fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chunkup_protocol::{MetadataStatus, UploadMode, UploadStatus};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Normalizes JSON values so that integer-valued floats compare equal.
    ///
    /// Other clients serialize a whole-number percentage as `100`; Rust
    /// serializes `f64` as `100.0`.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect(),
            ),
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture, re-serializes it and compares the JSON values
    /// (order-independent, float-normalized). Returns the parsed value.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    // --- Service messages ---

    #[test]
    fn fixture_init_upload_request() {
        let req: chunkup_protocol::InitUploadRequest =
            roundtrip_test("init_upload_request.json");
        assert_eq!(req.total_chunks, 3);
    }

    #[test]
    fn fixture_init_upload_response() {
        let resp: chunkup_protocol::InitUploadResponse =
            roundtrip_test("init_upload_response.json");
        assert_eq!(resp.file_id, "srv-7f3a");
    }

    #[test]
    fn fixture_upload_chunk_request() {
        let req: chunkup_protocol::UploadChunkRequest =
            roundtrip_test("upload_chunk_request.json");
        assert_eq!(req.content, b"Hello, world!");
        assert_eq!(req.chunk_index, 2);
    }

    // --- Observer events and metadata ---

    #[test]
    fn fixture_upload_progress() {
        let progress: chunkup_protocol::UploadProgress = roundtrip_test("upload_progress.json");
        assert_eq!(progress.status, UploadStatus::Uploading);
        assert_eq!(progress.uploaded_chunks, vec![0, 1]);
    }

    #[test]
    fn fixture_upload_metadata() {
        let meta: chunkup_protocol::UploadMetadata = roundtrip_test("upload_metadata.json");
        assert_eq!(meta.mode, Some(UploadMode::LocalFallback));
        assert_eq!(meta.status, MetadataStatus::Completed);
        assert_eq!(meta.size, "10485760");
    }

    #[test]
    fn fixture_upload_metadata_minimal() {
        let meta: chunkup_protocol::UploadMetadata =
            roundtrip_test("upload_metadata_minimal.json");
        assert!(meta.user_id.is_empty());
        assert!(meta.mode.is_none());
    }

    // --- Local store records ---

    #[test]
    fn fixture_chunk_record() {
        let rec: chunkup_store::ChunkRecord = roundtrip_test("chunk_record.json");
        assert!(rec.uploaded);
        assert_eq!(rec.timestamp, Some(1_773_480_413_589));
    }

    #[test]
    fn fixture_blob_record() {
        let rec: chunkup_store::BlobRecord = roundtrip_test("blob_record.json");
        assert_eq!(rec.file_size, 10_485_760);
        assert!(rec.last_modified_at.is_some());
    }

    #[test]
    fn fixture_file_listing() {
        let listing: chunkup_uploader::FileListing = roundtrip_test("file_listing.json");
        assert_eq!(listing.status, chunkup_protocol::ListingStatus::Completed);
    }

    #[test]
    fn fixture_service_metadata_in_progress() {
        let meta: chunkup_protocol::UploadMetadata =
            roundtrip_test("service_metadata_in_progress.json");
        assert_eq!(meta.status, MetadataStatus::InProgress);
    }

    #[test]
    fn fixture_download_response() {
        let resp: chunkup_protocol::DownloadResponse = roundtrip_test("download_response.json");
        assert_eq!(resp.content, b"Hello, world!");
        assert_eq!(resp.file_name, "hello.txt");
    }

    #[test]
    fn fixture_session_record() {
        let rec: chunkup_store::SessionRecord = roundtrip_test("session_record.json");
        assert_eq!(rec.mode, UploadMode::LocalFallback);
    }
}
