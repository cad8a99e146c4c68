//! Path resolution over the flat node graph
//!
//! A path is resolved one segment at a time: each segment is a scoped lookup
//! for a child of the previous segment's node. Resolution never creates
//! anything and short-circuits on the first missing segment.
//!
//! Sibling names are not unique. Which of several same-named candidates a
//! segment resolves to is decided by a [`MatchStrategy`]:
//!
//! - [`FirstMatch`] takes the first node the backend returned
//! - [`StrictUnique`] refuses to pick and reports [`DriveError::AmbiguousPath`]

use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::backend::{DriveBackend, Node, NodeId, NodeKind, NodeQuery};
use crate::error::{DriveError, Result};
use crate::path::RemotePath;

/// Picks one node out of the same-named children of a parent.
pub trait MatchStrategy: Send + Sync + fmt::Debug {
    /// Choose among `candidates` (backend order). `Ok(None)` only when
    /// `candidates` is empty.
    fn select(&self, parent_id: &NodeId, name: &str, candidates: Vec<Node>) -> Result<Option<Node>>;

    /// How many candidates the strategy needs to see
    fn lookup_limit(&self) -> Option<u32>;
}

/// Take whatever the backend listed first.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMatch;

impl MatchStrategy for FirstMatch {
    fn select(
        &self,
        _parent_id: &NodeId,
        _name: &str,
        candidates: Vec<Node>,
    ) -> Result<Option<Node>> {
        Ok(candidates.into_iter().next())
    }

    fn lookup_limit(&self) -> Option<u32> {
        Some(1)
    }
}

/// Fail instead of guessing when a name is duplicated.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictUnique;

impl MatchStrategy for StrictUnique {
    fn select(
        &self,
        parent_id: &NodeId,
        name: &str,
        candidates: Vec<Node>,
    ) -> Result<Option<Node>> {
        if candidates.len() > 1 {
            return Err(DriveError::AmbiguousPath {
                parent_id: parent_id.to_string(),
                name: name.to_string(),
                matches: candidates.len(),
            });
        }
        Ok(candidates.into_iter().next())
    }

    fn lookup_limit(&self) -> Option<u32> {
        // Two results are enough to detect a duplicate
        Some(2)
    }
}

/// Outcome of looking for a file inside a folder path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileProbe {
    /// The folder path itself does not resolve
    ParentMissing,
    /// Folder exists, no child with the name
    Missing { parent_id: NodeId },
    Found { file_id: NodeId, parent_id: NodeId },
}

impl FileProbe {
    pub fn file_id(&self) -> Option<&NodeId> {
        match self {
            FileProbe::Found { file_id, .. } => Some(file_id),
            _ => None,
        }
    }
}

/// Maps [`RemotePath`]s onto node IDs.
#[derive(Clone)]
pub struct PathResolver {
    backend: Arc<dyn DriveBackend>,
    strategy: Arc<dyn MatchStrategy>,
}

impl PathResolver {
    /// Resolver using [`FirstMatch`]
    pub fn new(backend: Arc<dyn DriveBackend>) -> Self {
        Self::with_strategy(backend, Arc::new(FirstMatch))
    }

    pub fn with_strategy(backend: Arc<dyn DriveBackend>, strategy: Arc<dyn MatchStrategy>) -> Self {
        Self { backend, strategy }
    }

    pub fn backend(&self) -> &Arc<dyn DriveBackend> {
        &self.backend
    }

    pub fn strategy(&self) -> &Arc<dyn MatchStrategy> {
        &self.strategy
    }

    /// One scoped lookup, narrowed to a single node by the strategy.
    pub(crate) async fn lookup_child(
        &self,
        parent_id: &NodeId,
        name: &str,
        kind: Option<NodeKind>,
    ) -> Result<Option<Node>> {
        let mut query =
            NodeQuery::new(name, parent_id.clone()).with_limit(self.strategy.lookup_limit());
        query.kind = kind;

        let candidates = self.backend.lookup(&query).await?;
        self.strategy.select(parent_id, name, candidates)
    }

    /// ID of the folder at `path`, or `None` if any segment is missing.
    ///
    /// The root resolves without a round trip.
    #[instrument(skip(self, path), fields(path = %path))]
    pub async fn resolve(&self, path: &RemotePath) -> Result<Option<NodeId>> {
        let mut current = NodeId::root();

        for segment in path.segments() {
            match self
                .lookup_child(&current, segment, Some(NodeKind::Folder))
                .await?
            {
                Some(node) => current = node.id,
                None => {
                    debug!(%segment, parent = %current, "Segment not found");
                    return Ok(None);
                }
            }
        }

        Ok(Some(current))
    }

    /// ID of the node named `name` inside the folder at `parent`.
    pub async fn resolve_file(&self, parent: &RemotePath, name: &str) -> Result<Option<NodeId>> {
        Ok(self.probe_file(parent, name).await?.file_id().cloned())
    }

    /// Like [`resolve_file`](Self::resolve_file) with the name taken from
    /// the last segment of `path`.
    pub async fn resolve_file_path(&self, path: &RemotePath) -> Result<Option<NodeId>> {
        let (parent, name) = path.split_file_name()?;
        self.resolve_file(&parent, name).await
    }

    /// Resolve `parent`, then look for `name` in it (any kind).
    ///
    /// No file lookup is made when the folder is missing.
    #[instrument(skip(self, parent), fields(parent = %parent))]
    pub async fn probe_file(&self, parent: &RemotePath, name: &str) -> Result<FileProbe> {
        let Some(parent_id) = self.resolve(parent).await? else {
            return Ok(FileProbe::ParentMissing);
        };

        let probe = match self.lookup_child(&parent_id, name, None).await? {
            Some(node) => FileProbe::Found {
                file_id: node.id,
                parent_id,
            },
            None => FileProbe::Missing { parent_id },
        };
        debug!(?probe, "File probe finished");
        Ok(probe)
    }
}

impl fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathResolver")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
