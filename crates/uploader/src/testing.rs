//! In-process upload service used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chunkup_protocol::{
    DownloadResponse, InitUploadRequest, InitUploadResponse, UploadChunkRequest, UploadMetadata,
};

use crate::error::RemoteError;
use crate::remote::{DeleteOutcome, ServiceFuture, UploadService};

/// Scripted service recording every call.
pub(crate) struct MockService {
    init_id: Option<String>,
    fail_chunk: Option<u32>,
    delete: fn() -> Result<DeleteOutcome, RemoteError>,
    metadata: HashMap<String, UploadMetadata>,
    files: HashMap<String, DownloadResponse>,
    init_calls: Mutex<Vec<InitUploadRequest>>,
    sent: Mutex<Vec<UploadChunkRequest>>,
    deletes: Mutex<Vec<String>>,
}

impl MockService {
    /// Service that accepts everything and issues `file_id`.
    pub(crate) fn remote(file_id: &str) -> Self {
        Self {
            init_id: Some(file_id.to_string()),
            fail_chunk: None,
            delete: || Ok(DeleteOutcome::Deleted),
            metadata: HashMap::new(),
            files: HashMap::new(),
            init_calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
        }
    }

    /// Service whose init always fails.
    pub(crate) fn unreachable() -> Self {
        Self {
            init_id: None,
            delete: || Err(RemoteError::Unavailable),
            ..Self::remote("")
        }
    }

    /// Fails the upload of chunk `index`.
    pub(crate) fn failing_chunk(mut self, index: u32) -> Self {
        self.fail_chunk = Some(index);
        self
    }

    pub(crate) fn with_delete(mut self, delete: fn() -> Result<DeleteOutcome, RemoteError>) -> Self {
        self.delete = delete;
        self
    }

    pub(crate) fn with_metadata(mut self, metadata: UploadMetadata) -> Self {
        self.metadata.insert(metadata.file_id.clone(), metadata);
        self
    }

    pub(crate) fn with_file(mut self, file_id: &str, file_name: &str, content: &[u8]) -> Self {
        self.files.insert(
            file_id.to_string(),
            DownloadResponse {
                content: content.to_vec(),
                file_name: file_name.to_string(),
            },
        );
        self
    }

    pub(crate) fn init_calls(&self) -> Vec<InitUploadRequest> {
        self.init_calls.lock().unwrap().clone()
    }

    /// Indices of chunks the service accepted or rejected, in call order.
    pub(crate) fn sent_indices(&self) -> Vec<u32> {
        self.sent.lock().unwrap().iter().map(|r| r.chunk_index).collect()
    }

    pub(crate) fn sent(&self) -> Vec<UploadChunkRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

impl UploadService for MockService {
    fn init_upload<'a>(
        &'a self,
        request: &'a InitUploadRequest,
    ) -> ServiceFuture<'a, InitUploadResponse> {
        self.init_calls.lock().unwrap().push(request.clone());
        let result = match &self.init_id {
            Some(file_id) => Ok(InitUploadResponse {
                file_id: file_id.clone(),
            }),
            None => Err(RemoteError::Unavailable),
        };
        Box::pin(async move { result })
    }

    fn upload_chunk<'a>(&'a self, request: &'a UploadChunkRequest) -> ServiceFuture<'a, ()> {
        self.sent.lock().unwrap().push(request.clone());
        let result = if self.fail_chunk == Some(request.chunk_index) {
            Err(RemoteError::Status {
                status: 500,
                body: "chunk rejected".into(),
            })
        } else {
            Ok(())
        };
        Box::pin(async move { result })
    }

    fn delete_file<'a>(&'a self, file_id: &'a str) -> ServiceFuture<'a, DeleteOutcome> {
        self.deletes.lock().unwrap().push(file_id.to_string());
        let result = (self.delete)();
        Box::pin(async move { result })
    }

    fn get_metadata<'a>(&'a self, file_id: &'a str) -> ServiceFuture<'a, UploadMetadata> {
        let result = self
            .metadata
            .get(file_id)
            .cloned()
            .ok_or(RemoteError::Status {
                status: 404,
                body: "not found".into(),
            });
        Box::pin(async move { result })
    }

    fn download_file<'a>(&'a self, file_id: &'a str) -> ServiceFuture<'a, DownloadResponse> {
        let result = self.files.get(file_id).cloned().ok_or(RemoteError::Status {
            status: 404,
            body: "not found".into(),
        });
        Box::pin(async move { result })
    }
}
