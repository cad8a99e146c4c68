//! Google Drive API connector implementation
//!
//! Implements [`DriveBackend`] on top of the Drive v3 REST API.

use async_trait::async_trait;
use bridge_traits::http::{HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bytes::Bytes;
use core_auth::ServiceHandle;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::backend::{
    ByteRange, ChunkStatus, ContentChunk, DriveBackend, Node, NodeId, NodeQuery, UploadSession,
    UploadTarget,
};
use crate::error::{DriveError, Result};
use crate::query::build_query;
use crate::types::{ApiErrorResponse, DriveFile, FileMetadataRequest, FilesListResponse};

/// Drive API path, relative to the handle's API base
const FILES_PATH: &str = "drive/v3/files";

/// Resumable upload path, relative to the handle's API base
const UPLOAD_PATH: &str = "upload/drive/v3/files";

/// Fields requested for a single file resource
const NODE_FIELDS: &str = "id,name,mimeType,parents";

/// Fields requested for files.list
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,parents)";

/// Page size when a lookup has no limit (Drive allows up to 1000)
const DEFAULT_PAGE_SIZE: u32 = 100;

/// Status Drive uses for "resume incomplete"
const RESUME_INCOMPLETE: u16 = 308;

/// Google Drive API connector
///
/// Every request carries the handle's bearer token and is issued once with
/// the configured [`RetryPolicy`] (single attempt unless configured
/// otherwise). Non-success statuses and transport errors become
/// [`DriveError::TransferFailure`].
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::{GoogleDriveConnector, NodeId, NodeQuery};
///
/// let handle = authenticator.get_handle("drive").await?;
/// let connector = GoogleDriveConnector::new(handle);
/// let nodes = connector.lookup(&NodeQuery::new("reports", NodeId::root())).await?;
/// ```
#[derive(Debug, Clone)]
pub struct GoogleDriveConnector {
    handle: ServiceHandle,
    retry_policy: RetryPolicy,
    request_timeout: Option<Duration>,
}

impl GoogleDriveConnector {
    pub fn new(handle: ServiceHandle) -> Self {
        Self {
            handle,
            retry_policy: RetryPolicy::no_retry(),
            request_timeout: None,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Per-request timeout, overriding the transport default
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn request(&self, method: HttpMethod, target: &str) -> HttpRequest {
        let request = self.handle.request(method, target);
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    /// Issue `request`; only transport failures are errors here.
    async fn send(&self, operation: &str, request: HttpRequest) -> Result<HttpResponse> {
        self.handle
            .http_client()
            .execute_with_retry(request, self.retry_policy.clone())
            .await
            .map_err(|e| {
                warn!(operation, error = %e, "Drive request failed in transport");
                DriveError::transfer(operation, None, e.to_string())
            })
    }

    fn failure(operation: &str, response: &HttpResponse) -> DriveError {
        let message = serde_json::from_slice::<ApiErrorResponse>(&response.body)
            .map(|e| e.error.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| String::from_utf8_lossy(&response.body).trim().to_string());

        warn!(operation, status = response.status, %message, "Drive API error");
        DriveError::transfer(operation, Some(response.status), message)
    }

    fn parse_node(operation: &str, response: &HttpResponse) -> Result<Node> {
        let file: DriveFile = serde_json::from_slice(&response.body).map_err(|e| {
            DriveError::ParseError(format!("Failed to parse {} response: {}", operation, e))
        })?;
        Ok(file.into_node())
    }

    fn file_path(file_id: &NodeId) -> String {
        format!("{}/{}", FILES_PATH, urlencoding::encode(file_id.as_str()))
    }

    /// Offset after the last persisted byte, from a 308 `Range` header
    /// (`bytes=0-N`). No header means nothing was persisted.
    fn persisted_offset(response: &HttpResponse) -> Result<u64> {
        let Some(range) = response.header("Range") else {
            return Ok(0);
        };

        range
            .trim()
            .strip_prefix("bytes=")
            .and_then(|r| r.split_once('-'))
            .and_then(|(_, end)| end.parse::<u64>().ok())
            .map(|end| end + 1)
            .ok_or_else(|| DriveError::ParseError(format!("Unexpected Range header: {}", range)))
    }

    /// Total size from a `Content-Range: bytes a-b/total` header
    fn content_range_total(response: &HttpResponse) -> Option<u64> {
        response
            .header("Content-Range")
            .and_then(|value| value.rsplit_once('/'))
            .and_then(|(_, total)| total.trim().parse().ok())
    }

    fn content_range(offset: u64, len: u64, total: u64) -> String {
        if len == 0 {
            format!("bytes */{}", total)
        } else {
            format!("bytes {}-{}/{}", offset, offset + len - 1, total)
        }
    }
}

#[async_trait]
impl DriveBackend for GoogleDriveConnector {
    #[instrument(skip(self, query), fields(name = %query.name, parent = %query.parent_id))]
    async fn lookup(&self, query: &NodeQuery) -> Result<Vec<Node>> {
        let q = build_query(query);
        let page_size = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

        let mut nodes = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut target = format!(
                "{}?q={}&fields={}&pageSize={}",
                FILES_PATH,
                urlencoding::encode(&q),
                urlencoding::encode(LIST_FIELDS),
                page_size
            );
            if let Some(token) = &page_token {
                target.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
            }

            let request = self
                .request(HttpMethod::Get, &target)
                .header("Accept", "application/json");
            let response = self.send("lookup", request).await?;
            if !response.is_success() {
                return Err(Self::failure("lookup", &response));
            }

            let list: FilesListResponse = serde_json::from_slice(&response.body).map_err(|e| {
                DriveError::ParseError(format!("Failed to parse files list response: {}", e))
            })?;
            nodes.extend(list.files.into_iter().map(DriveFile::into_node));

            // A limited lookup is a single round trip
            match (query.limit, list.next_page_token) {
                (None, Some(token)) => page_token = Some(token),
                _ => break,
            }
        }

        if let Some(limit) = query.limit {
            nodes.truncate(limit as usize);
        }

        debug!(matches = nodes.len(), "Lookup finished");
        Ok(nodes)
    }

    #[instrument(skip(self, parent_id), fields(parent = %parent_id))]
    async fn create_folder(&self, name: &str, parent_id: &NodeId) -> Result<Node> {
        let target = format!("{}?fields={}", FILES_PATH, urlencoding::encode(NODE_FIELDS));
        let request = self
            .request(HttpMethod::Post, &target)
            .json(&FileMetadataRequest::folder(name, parent_id))
            .map_err(|e| DriveError::ParseError(e.to_string()))?;

        let response = self.send("create folder", request).await?;
        if !response.is_success() {
            return Err(Self::failure("create folder", &response));
        }

        let node = Self::parse_node("create folder", &response)?;
        debug!(folder_id = %node.id, "Folder created");
        Ok(node)
    }

    #[instrument(skip(self))]
    async fn begin_upload(&self, target: UploadTarget, total_size: u64) -> Result<UploadSession> {
        let fields = urlencoding::encode(NODE_FIELDS);
        let request = match &target {
            UploadTarget::Create { name, parent_id } => self
                .request(
                    HttpMethod::Post,
                    &format!("{}?uploadType=resumable&fields={}", UPLOAD_PATH, fields),
                )
                .json(&FileMetadataRequest::file(name, parent_id))
                .map_err(|e| DriveError::ParseError(e.to_string()))?,
            UploadTarget::Update { file_id } => self.request(
                HttpMethod::Patch,
                &format!(
                    "{}/{}?uploadType=resumable&fields={}",
                    UPLOAD_PATH,
                    urlencoding::encode(file_id.as_str()),
                    fields
                ),
            ),
        }
        .header("X-Upload-Content-Length", total_size.to_string());

        let response = self.send("begin upload", request).await?;
        if !response.is_success() {
            return Err(Self::failure("begin upload", &response));
        }

        let uri = response.header("Location").ok_or_else(|| {
            DriveError::transfer(
                "begin upload",
                Some(response.status),
                "response carried no resumable session URI",
            )
        })?;

        debug!(total_size, "Resumable upload session opened");
        Ok(UploadSession {
            uri: uri.to_string(),
            total_size,
        })
    }

    #[instrument(skip(self, session, data), fields(len = data.len()))]
    async fn upload_chunk(
        &self,
        session: &UploadSession,
        offset: u64,
        data: Bytes,
    ) -> Result<ChunkStatus> {
        let range = Self::content_range(offset, data.len() as u64, session.total_size);
        let request = self
            .request(HttpMethod::Put, &session.uri)
            .header("Content-Range", range)
            .body(data);

        let response = self.send("upload chunk", request).await?;
        match response.status {
            RESUME_INCOMPLETE => {
                let persisted = Self::persisted_offset(&response)?;
                debug!(persisted, "Chunk accepted");
                Ok(ChunkStatus::Incomplete { persisted })
            }
            200 | 201 => Ok(ChunkStatus::Complete(Self::parse_node(
                "upload chunk",
                &response,
            )?)),
            _ => Err(Self::failure("upload chunk", &response)),
        }
    }

    #[instrument(
        skip(self, file_id, range),
        fields(file_id = %file_id, range = %range.header_value())
    )]
    async fn read_content(&self, file_id: &NodeId, range: ByteRange) -> Result<ContentChunk> {
        let target = format!("{}?alt=media", Self::file_path(file_id));
        let request = self
            .request(HttpMethod::Get, &target)
            .header("Range", range.header_value());

        let response = self.send("download", request).await?;
        match response.status {
            206 => Ok(ContentChunk {
                total_size: Self::content_range_total(&response),
                data: response.body,
            }),
            // Whole object returned
            200 => Ok(ContentChunk {
                total_size: Some(response.body.len() as u64),
                data: response.body,
            }),
            // Range starts at or past the end (empty object)
            416 => Ok(ContentChunk {
                total_size: Self::content_range_total(&response).or(Some(range.start)),
                data: Bytes::new(),
            }),
            404 => Err(DriveError::NotFound {
                path: file_id.to_string(),
            }),
            _ => Err(Self::failure("download", &response)),
        }
    }
}
