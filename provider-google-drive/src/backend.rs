//! Abstract view of the remote object graph
//!
//! The graph is flat: every node has an opaque ID and points at its parent
//! by ID. Names are not unique among siblings, so every lookup returns a
//! list. Path semantics are layered on top by [`PathResolver`](crate::PathResolver).

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

use crate::error::Result;

/// MIME type Drive uses to mark folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Opaque, backend-assigned node ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Alias of the user's My Drive root
    pub fn root() -> Self {
        Self("root".to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == "root"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Folder,
    File,
}

impl NodeKind {
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            NodeKind::Folder
        } else {
            NodeKind::File
        }
    }
}

/// A folder or file in the remote graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    /// First parent reported by the backend
    pub parent_id: Option<NodeId>,
}

impl Node {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

/// Children of `parent_id` named exactly `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeQuery {
    pub name: String,
    pub parent_id: NodeId,
    /// `None` matches any kind
    pub kind: Option<NodeKind>,
    /// Upper bound on returned nodes
    pub limit: Option<u32>,
}

impl NodeQuery {
    pub fn new(name: impl Into<String>, parent_id: NodeId) -> Self {
        Self {
            name: name.into(),
            parent_id,
            kind: None,
            limit: None,
        }
    }

    pub fn folders_only(mut self) -> Self {
        self.kind = Some(NodeKind::Folder);
        self
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }
}

/// What a resumable upload session writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    /// New file node under `parent_id`
    Create { name: String, parent_id: NodeId },
    /// Replace the content of an existing file
    Update { file_id: NodeId },
}

/// An open resumable upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    /// Session URI chunks are sent to
    pub uri: String,
    pub total_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkStatus {
    /// Backend holds `persisted` bytes and expects more
    Incomplete { persisted: u64 },
    /// Last chunk accepted; the node the content landed in
    Complete(Node),
}

/// Inclusive byte range `start..=end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Range of `len` bytes starting at `start`; `len` must be non-zero.
    pub fn with_len(start: u64, len: u64) -> Self {
        Self {
            start,
            end: start + len.saturating_sub(1),
        }
    }

    /// Number of bytes covered
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Range` header value
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Bytes returned by a ranged read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    pub data: Bytes,
    /// Full object size, when the backend reported it
    pub total_size: Option<u64>,
}

/// Operations on the remote graph.
///
/// Implementations never assume that paths are unique and never cache
/// between calls.
#[async_trait]
pub trait DriveBackend: Send + Sync {
    /// Non-trashed children of `query.parent_id` named `query.name`, in
    /// backend order.
    async fn lookup(&self, query: &NodeQuery) -> Result<Vec<Node>>;

    async fn create_folder(&self, name: &str, parent_id: &NodeId) -> Result<Node>;

    async fn begin_upload(&self, target: UploadTarget, total_size: u64) -> Result<UploadSession>;

    /// Send `data` starting at `offset`.
    async fn upload_chunk(
        &self,
        session: &UploadSession,
        offset: u64,
        data: Bytes,
    ) -> Result<ChunkStatus>;

    async fn read_content(&self, file_id: &NodeId, range: ByteRange) -> Result<ContentChunk>;
}
