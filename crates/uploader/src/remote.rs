//! Upload service contract and its HTTP implementation.
//!
//! `UploadService` is the seam between the orchestrator and the network.
//! The orchestrator only ever sees success or a [`RemoteError`]; deciding
//! what a failure means (fallback, ignore) is its job, not the client's.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chunkup_protocol::constants::{REQUEST_TIMEOUT, routes};
use chunkup_protocol::{
    DownloadResponse, InitUploadRequest, InitUploadResponse, UploadChunkRequest, UploadMetadata,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use crate::error::RemoteError;

/// Boxed future returned by [`UploadService`] methods.
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send + 'a>>;

/// Characters escaped when a file id is placed in a URL path.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Result of a remote delete that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The service does not support deletion (HTTP 501).
    NotImplemented,
}

/// Remote upload service.
///
/// Implemented over HTTP by [`HttpUploadService`]; tests use in-process mocks.
pub trait UploadService: Send + Sync {
    /// Asks the service to issue an identifier for a new upload.
    fn init_upload<'a>(
        &'a self,
        request: &'a InitUploadRequest,
    ) -> ServiceFuture<'a, InitUploadResponse>;

    /// Sends one chunk.
    fn upload_chunk<'a>(&'a self, request: &'a UploadChunkRequest) -> ServiceFuture<'a, ()>;

    /// Deletes a stored file.
    fn delete_file<'a>(&'a self, file_id: &'a str) -> ServiceFuture<'a, DeleteOutcome>;

    /// Fetches the service's metadata for an upload.
    fn get_metadata<'a>(&'a self, file_id: &'a str) -> ServiceFuture<'a, UploadMetadata>;

    /// Fetches the content of a stored file.
    fn download_file<'a>(&'a self, file_id: &'a str) -> ServiceFuture<'a, DownloadResponse>;
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Connection settings for [`HttpUploadService`].
#[derive(Debug, Clone)]
pub struct HttpServiceConfig {
    /// Base URL, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub auth_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            auth_token: None,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Upload service reached over HTTP/JSON.
pub struct HttpUploadService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpUploadService {
    /// Creates a client from `config`.
    pub fn new(config: &HttpServiceConfig) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = config.auth_token.as_deref().filter(|t| !t.is_empty()) {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| RemoteError::InvalidToken)?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn encode_id(file_id: &str) -> String {
        utf8_percent_encode(file_id, PATH_SEGMENT).to_string()
    }

    /// Fails with [`RemoteError::Status`] on a non-success response.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn init(&self, request: &InitUploadRequest) -> Result<InitUploadResponse, RemoteError> {
        let resp = self
            .http
            .post(self.url(routes::INIT_UPLOAD))
            .json(request)
            .send()
            .await?;
        let body = Self::check(resp).await?.bytes().await?;
        let parsed: InitUploadResponse = serde_json::from_slice(&body)?;
        if parsed.file_id.trim().is_empty() {
            return Err(RemoteError::Malformed("empty file_id".into()));
        }
        debug!(file_id = %parsed.file_id, "upload service issued file id");
        Ok(parsed)
    }

    async fn send_chunk(&self, request: &UploadChunkRequest) -> Result<(), RemoteError> {
        let resp = self
            .http
            .post(self.url(routes::UPLOAD_CHUNK))
            .json(request)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn delete(&self, file_id: &str) -> Result<DeleteOutcome, RemoteError> {
        let url = self.url(&routes::file(&Self::encode_id(file_id)));
        let resp = self.http.delete(url).send().await?;
        if resp.status() == StatusCode::NOT_IMPLEMENTED {
            return Ok(DeleteOutcome::NotImplemented);
        }
        Self::check(resp).await?;
        Ok(DeleteOutcome::Deleted)
    }

    async fn metadata(&self, file_id: &str) -> Result<UploadMetadata, RemoteError> {
        let url = self.url(&routes::metadata(&Self::encode_id(file_id)));
        let resp = self.http.get(url).send().await?;
        let body = Self::check(resp).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn download(&self, file_id: &str) -> Result<DownloadResponse, RemoteError> {
        let url = self.url(&routes::file(&Self::encode_id(file_id)));
        let resp = self.http.get(url).send().await?;
        let body = Self::check(resp).await?.bytes().await?;
        let file: DownloadResponse = serde_json::from_slice(&body)?;
        debug!(file_id, bytes = file.content.len(), "downloaded file");
        Ok(file)
    }
}

impl UploadService for HttpUploadService {
    fn init_upload<'a>(
        &'a self,
        request: &'a InitUploadRequest,
    ) -> ServiceFuture<'a, InitUploadResponse> {
        Box::pin(self.init(request))
    }

    fn upload_chunk<'a>(&'a self, request: &'a UploadChunkRequest) -> ServiceFuture<'a, ()> {
        Box::pin(self.send_chunk(request))
    }

    fn delete_file<'a>(&'a self, file_id: &'a str) -> ServiceFuture<'a, DeleteOutcome> {
        Box::pin(self.delete(file_id))
    }

    fn get_metadata<'a>(&'a self, file_id: &'a str) -> ServiceFuture<'a, UploadMetadata> {
        Box::pin(self.metadata(file_id))
    }

    fn download_file<'a>(&'a self, file_id: &'a str) -> ServiceFuture<'a, DownloadResponse> {
        Box::pin(self.download(file_id))
    }
}

// ---------------------------------------------------------------------------
// Offline
// ---------------------------------------------------------------------------

/// Service that is never reachable; every upload runs in local fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineService;

impl UploadService for OfflineService {
    fn init_upload<'a>(
        &'a self,
        _request: &'a InitUploadRequest,
    ) -> ServiceFuture<'a, InitUploadResponse> {
        Box::pin(async { Err(RemoteError::Unavailable) })
    }

    fn upload_chunk<'a>(&'a self, _request: &'a UploadChunkRequest) -> ServiceFuture<'a, ()> {
        Box::pin(async { Err(RemoteError::Unavailable) })
    }

    fn delete_file<'a>(&'a self, _file_id: &'a str) -> ServiceFuture<'a, DeleteOutcome> {
        Box::pin(async { Err(RemoteError::Unavailable) })
    }

    fn get_metadata<'a>(&'a self, _file_id: &'a str) -> ServiceFuture<'a, UploadMetadata> {
        Box::pin(async { Err(RemoteError::Unavailable) })
    }

    fn download_file<'a>(&'a self, _file_id: &'a str) -> ServiceFuture<'a, DownloadResponse> {
        Box::pin(async { Err(RemoteError::Unavailable) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Reads one HTTP request (headers plus `Content-Length` body).
    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut tmp = [0u8; 8192];
        loop {
            let n = stream.read(&mut tmp).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&tmp[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Starts a mock HTTP server answering one request with `status` and
    /// `body`. The handle resolves to the raw request text.
    async fn mock_server(status: u16, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;

            let resp = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes()).await;
            let _ = stream.shutdown().await;
            request
        });

        (url, handle)
    }

    fn service(url: String, token: Option<&str>) -> HttpUploadService {
        HttpUploadService::new(&HttpServiceConfig {
            base_url: url,
            auth_token: token.map(String::from),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn init_request() -> InitUploadRequest {
        InitUploadRequest {
            file_name: "movie.mp4".into(),
            total_chunks: 3,
            user_id: "default-user".into(),
        }
    }

    #[tokio::test]
    async fn init_upload_returns_file_id() {
        let (url, handle) = mock_server(200, r#"{"file_id":"srv-123"}"#).await;
        let svc = service(url, Some("tok"));

        let resp = svc.init_upload(&init_request()).await.unwrap();
        assert_eq!(resp.file_id, "srv-123");

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /v1/init-upload "));
        assert!(request.to_lowercase().contains("authorization: bearer tok"));
        assert!(request.contains("\"total_chunks\":3"));
    }

    #[tokio::test]
    async fn init_upload_rejects_empty_file_id() {
        let (url, handle) = mock_server(200, r#"{"file_id":""}"#).await;
        let result = service(url, None).init_upload(&init_request()).await;
        assert!(matches!(result, Err(RemoteError::Malformed(_))));
        handle.abort();
    }

    #[tokio::test]
    async fn init_upload_malformed_payload() {
        let (url, handle) = mock_server(200, "<html>").await;
        let result = service(url, None).init_upload(&init_request()).await;
        assert!(matches!(result, Err(RemoteError::Json(_))));
        handle.abort();
    }

    #[tokio::test]
    async fn init_upload_status_error() {
        let (url, handle) = mock_server(503, r#"{"error":"down"}"#).await;
        let result = service(url, None).init_upload(&init_request()).await;
        match result {
            Err(RemoteError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert!(body.contains("down"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
        handle.abort();
    }

    #[tokio::test]
    async fn upload_chunk_posts_base64_content() {
        let (url, handle) = mock_server(200, "{}").await;
        let req = UploadChunkRequest {
            file_id: "srv-1".into(),
            chunk_index: 4,
            content: b"Hello".to_vec(),
            checksum: "abc".into(),
        };
        service(url, None).upload_chunk(&req).await.unwrap();

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /v1/upload-chunk "));
        assert!(request.contains("\"chunk_index\":4"));
        assert!(request.contains("\"content\":\"SGVsbG8=\""));
    }

    #[tokio::test]
    async fn delete_maps_not_implemented() {
        let (url, handle) = mock_server(501, "").await;
        let outcome = service(url, None).delete_file("srv 1/x").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::NotImplemented);

        let request = handle.await.unwrap();
        assert!(request.starts_with("DELETE /v1/files/srv%201%2Fx "));
    }

    #[tokio::test]
    async fn delete_success_and_failure() {
        let (url, handle) = mock_server(204, "").await;
        let outcome = service(url, None).delete_file("srv-1").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        handle.await.unwrap();

        let (url, handle) = mock_server(500, "boom").await;
        let result = service(url, None).delete_file("srv-1").await;
        assert!(matches!(result, Err(RemoteError::Status { status: 500, .. })));
        handle.abort();
    }

    #[tokio::test]
    async fn get_metadata_parses_record() {
        let json = r#"{"fileId":"srv-1","fileName":"a.bin","size":"5","uploadedChunks":["0"],"status":"completed"}"#;
        let (url, handle) = mock_server(200, json).await;
        let meta = service(url, None).get_metadata("srv-1").await.unwrap();
        assert_eq!(meta.file_name, "a.bin");

        let request = handle.await.unwrap();
        assert!(request.starts_with("GET /v1/uploads/srv-1/metadata "));
    }

    #[tokio::test]
    async fn download_decodes_base64_content() {
        let (url, handle) = mock_server(200, r#"{"content":"SGVsbG8=","fileName":"hello.txt"}"#).await;
        let file = service(url, Some("tok")).download_file("srv 1").await.unwrap();
        assert_eq!(file.content, b"Hello");
        assert_eq!(file.file_name, "hello.txt");

        let request = handle.await.unwrap();
        assert!(request.starts_with("GET /v1/files/srv%201 "));
        assert!(request.to_lowercase().contains("authorization: bearer tok"));
    }

    #[tokio::test]
    async fn download_rejects_invalid_content() {
        let (url, handle) = mock_server(200, r#"{"content":"***","fileName":"x"}"#).await;
        let result = service(url, None).download_file("srv-1").await;
        assert!(matches!(result, Err(RemoteError::Json(_))));
        handle.abort();
    }

    #[tokio::test]
    async fn connection_refused_is_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = service(format!("http://127.0.0.1:{port}"), None)
            .init_upload(&init_request())
            .await;
        assert!(matches!(result, Err(RemoteError::Http(_))));
    }

    #[test]
    fn invalid_token_rejected() {
        let result = HttpUploadService::new(&HttpServiceConfig {
            auth_token: Some("bad\ntoken".into()),
            ..HttpServiceConfig::default()
        });
        assert!(matches!(result, Err(RemoteError::InvalidToken)));
    }

    #[tokio::test]
    async fn offline_service_always_fails() {
        let svc = OfflineService;
        assert!(svc.init_upload(&init_request()).await.is_err());
        assert!(svc.delete_file("x").await.is_err());
        assert!(svc.get_metadata("x").await.is_err());
        assert!(svc.download_file("x").await.is_err());
    }
}
