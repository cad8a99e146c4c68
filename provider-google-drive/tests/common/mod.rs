//! In-memory `DriveBackend` for integration tests.
//!
//! Mirrors the Drive behaviours the core relies on: duplicate sibling names
//! are allowed, trashed nodes are invisible to lookups, results come back in
//! creation order, and uploads go through sessions that report progress.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_desktop::TokioFileSystem;
use bytes::Bytes;
use core_runtime::config::TransferConfig;
use provider_google_drive::{
    ByteRange, ChunkStatus, ContentChunk, DriveBackend, DriveClient, DriveError, Node, NodeId,
    NodeKind, NodeQuery, Result, UploadSession, UploadTarget,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct FakeNode {
    id: NodeId,
    name: String,
    kind: NodeKind,
    parent: NodeId,
    trashed: bool,
}

impl FakeNode {
    fn to_node(&self) -> Node {
        Node {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            parent_id: Some(self.parent.clone()),
        }
    }
}

struct Session {
    target: UploadTarget,
    total: u64,
    received: Vec<u8>,
}

#[derive(Default)]
struct State {
    nodes: Vec<FakeNode>,
    contents: HashMap<NodeId, Vec<u8>>,
    sessions: HashMap<String, Session>,
    next_id: u64,
    lookups: usize,
    folders_created: usize,
    chunks_sent: usize,
    fail_folder_named: Option<String>,
    fail_chunk_number: Option<usize>,
    fail_read_from: Option<u64>,
}

impl State {
    fn allocate_id(&mut self, prefix: &str) -> NodeId {
        self.next_id += 1;
        NodeId::new(format!("{}-{}", prefix, self.next_id))
    }

    fn insert(&mut self, name: &str, kind: NodeKind, parent: &NodeId) -> FakeNode {
        let prefix = match kind {
            NodeKind::Folder => "folder",
            NodeKind::File => "file",
        };
        let node = FakeNode {
            id: self.allocate_id(prefix),
            name: name.to_string(),
            kind,
            parent: parent.clone(),
            trashed: false,
        };
        self.nodes.push(node.clone());
        node
    }
}

/// In-memory Drive that counts round trips.
#[derive(Default)]
pub struct FakeDrive {
    state: Mutex<State>,
}

impl FakeDrive {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_folder(&self, name: &str, parent: &NodeId) -> NodeId {
        self.state
            .lock()
            .unwrap()
            .insert(name, NodeKind::Folder, parent)
            .id
    }

    pub fn add_file(&self, name: &str, parent: &NodeId, content: &[u8]) -> NodeId {
        let mut state = self.state.lock().unwrap();
        let id = state.insert(name, NodeKind::File, parent).id;
        state.contents.insert(id.clone(), content.to_vec());
        id
    }

    pub fn trash(&self, id: &NodeId) {
        let mut state = self.state.lock().unwrap();
        if let Some(node) = state.nodes.iter_mut().find(|n| &n.id == id) {
            node.trashed = true;
        }
    }

    /// Make the next creation of a folder with this name fail.
    pub fn fail_folder_creation(&self, name: &str) {
        self.state.lock().unwrap().fail_folder_named = Some(name.to_string());
    }

    /// Make the `n`th chunk sent (1-based, counted across sessions) fail
    /// with a 503.
    pub fn fail_upload_chunk(&self, n: usize) {
        self.state.lock().unwrap().fail_chunk_number = Some(n);
    }

    /// Make every ranged read starting at or past `offset` fail with a 500.
    pub fn fail_reads_from(&self, offset: u64) {
        self.state.lock().unwrap().fail_read_from = Some(offset);
    }

    pub fn lookups(&self) -> usize {
        self.state.lock().unwrap().lookups
    }

    pub fn folders_created(&self) -> usize {
        self.state.lock().unwrap().folders_created
    }

    pub fn chunks_sent(&self) -> usize {
        self.state.lock().unwrap().chunks_sent
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().unwrap().nodes.len()
    }

    pub fn content(&self, id: &NodeId) -> Option<Vec<u8>> {
        self.state.lock().unwrap().contents.get(id).cloned()
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<NodeId> {
        let state = self.state.lock().unwrap();
        state
            .nodes
            .iter()
            .find(|n| &n.id == id)
            .map(|n| n.parent.clone())
    }

    /// Live children of `parent` named `name`
    pub fn children_named(&self, parent: &NodeId, name: &str) -> Vec<NodeId> {
        let state = self.state.lock().unwrap();
        state
            .nodes
            .iter()
            .filter(|n| !n.trashed && &n.parent == parent && n.name == name)
            .map(|n| n.id.clone())
            .collect()
    }

    pub fn reset_counters(&self) {
        let mut state = self.state.lock().unwrap();
        state.lookups = 0;
        state.folders_created = 0;
        state.chunks_sent = 0;
    }
}

#[async_trait]
impl DriveBackend for FakeDrive {
    async fn lookup(&self, query: &NodeQuery) -> Result<Vec<Node>> {
        let mut state = self.state.lock().unwrap();
        state.lookups += 1;

        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(state
            .nodes
            .iter()
            .filter(|n| {
                !n.trashed
                    && n.parent == query.parent_id
                    && n.name == query.name
                    && query.kind.map_or(true, |kind| kind == n.kind)
            })
            .take(limit)
            .map(FakeNode::to_node)
            .collect())
    }

    async fn create_folder(&self, name: &str, parent_id: &NodeId) -> Result<Node> {
        let mut state = self.state.lock().unwrap();
        if state.fail_folder_named.as_deref() == Some(name) {
            state.fail_folder_named = None;
            return Err(DriveError::TransferFailure {
                operation: "create folder".to_string(),
                status_code: Some(500),
                message: "backend error".to_string(),
            });
        }

        state.folders_created += 1;
        Ok(state.insert(name, NodeKind::Folder, parent_id).to_node())
    }

    async fn begin_upload(&self, target: UploadTarget, total_size: u64) -> Result<UploadSession> {
        let mut state = self.state.lock().unwrap();
        if let UploadTarget::Update { file_id } = &target {
            if !state.contents.contains_key(file_id) {
                return Err(DriveError::TransferFailure {
                    operation: "begin upload".to_string(),
                    status_code: Some(404),
                    message: format!("File not found: {}", file_id),
                });
            }
        }

        state.next_id += 1;
        let uri = format!("fake://upload/{}", state.next_id);
        state.sessions.insert(
            uri.clone(),
            Session {
                target,
                total: total_size,
                received: Vec::new(),
            },
        );

        Ok(UploadSession {
            uri,
            total_size,
        })
    }

    async fn upload_chunk(
        &self,
        session: &UploadSession,
        offset: u64,
        data: Bytes,
    ) -> Result<ChunkStatus> {
        let mut state = self.state.lock().unwrap();
        state.chunks_sent += 1;
        if state.fail_chunk_number == Some(state.chunks_sent) {
            return Err(DriveError::TransferFailure {
                operation: "upload chunk".to_string(),
                status_code: Some(503),
                message: "backend unavailable".to_string(),
            });
        }

        let upload = state.sessions.get_mut(&session.uri).ok_or_else(|| {
            DriveError::TransferFailure {
                operation: "upload chunk".to_string(),
                status_code: Some(404),
                message: "unknown session".to_string(),
            }
        })?;

        if offset != upload.received.len() as u64 {
            return Err(DriveError::TransferFailure {
                operation: "upload chunk".to_string(),
                status_code: Some(400),
                message: format!("expected offset {}", upload.received.len()),
            });
        }

        upload.received.extend_from_slice(&data);
        if (upload.received.len() as u64) < upload.total {
            return Ok(ChunkStatus::Incomplete {
                persisted: upload.received.len() as u64,
            });
        }

        let upload = state
            .sessions
            .remove(&session.uri)
            .expect("session checked above");
        let node = match upload.target {
            UploadTarget::Create { name, parent_id } => {
                state.insert(&name, NodeKind::File, &parent_id).to_node()
            }
            UploadTarget::Update { file_id } => state
                .nodes
                .iter()
                .find(|n| n.id == file_id)
                .map(FakeNode::to_node)
                .expect("updated node exists"),
        };
        state.contents.insert(node.id.clone(), upload.received);
        Ok(ChunkStatus::Complete(node))
    }

    async fn read_content(&self, file_id: &NodeId, range: ByteRange) -> Result<ContentChunk> {
        let state = self.state.lock().unwrap();
        if matches!(state.fail_read_from, Some(offset) if range.start >= offset) {
            return Err(DriveError::TransferFailure {
                operation: "download".to_string(),
                status_code: Some(500),
                message: "backend error".to_string(),
            });
        }
        let content = state
            .contents
            .get(file_id)
            .ok_or_else(|| DriveError::NotFound {
                path: file_id.to_string(),
            })?;

        let len = content.len() as u64;
        let start = range.start.min(len) as usize;
        let end = (range.end + 1).min(len) as usize;
        Ok(ContentChunk {
            data: Bytes::copy_from_slice(&content[start..end]),
            total_size: Some(len),
        })
    }
}

/// Transfer settings with small chunks so multi-chunk paths are exercised.
pub fn small_chunks() -> TransferConfig {
    TransferConfig::default()
        .with_upload_chunk_size(256 * 1024)
        .with_download_chunk_size(100_000)
}

pub fn client(drive: &Arc<FakeDrive>) -> DriveClient {
    DriveClient::new(
        drive.clone(),
        Arc::new(TokioFileSystem::new()),
        small_chunks(),
    )
    .expect("valid transfer config")
}

/// Deterministic, non-repeating test content
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
