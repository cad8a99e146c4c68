//! Folder chain materialization
//!
//! [`FolderSynchronizer::ensure`] makes every segment of a path exist,
//! reusing existing folders and creating the missing ones in order. There is
//! no rollback: when a step fails, the folders made so far stay, and the
//! error carries a [`FolderCheckpoint`] that [`FolderSynchronizer::resume`]
//! continues from.

use tracing::{info, instrument};

use crate::backend::{NodeId, NodeKind};
use crate::error::{DriveError, Result};
use crate::path::RemotePath;
use crate::resolver::PathResolver;

/// Progress of a folder chain: the segments of `path` that already exist,
/// with their IDs, in path order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderCheckpoint {
    pub path: RemotePath,
    pub resolved: Vec<(String, NodeId)>,
}

impl FolderCheckpoint {
    /// Checkpoint with nothing resolved yet
    pub fn new(path: RemotePath) -> Self {
        Self {
            path,
            resolved: Vec::new(),
        }
    }

    /// Deepest materialized folder (the root when nothing is resolved)
    pub fn last_id(&self) -> NodeId {
        self.resolved
            .last()
            .map(|(_, id)| id.clone())
            .unwrap_or_else(NodeId::root)
    }

    /// Segments still to be resolved or created
    pub fn remaining(&self) -> &[String] {
        let done = self.resolved.len().min(self.path.len());
        &self.path.segments()[done..]
    }

    pub fn is_complete(&self) -> bool {
        self.resolved.len() >= self.path.len()
    }

    fn validate(&self) -> Result<()> {
        let consistent = self.resolved.len() <= self.path.len()
            && self
                .resolved
                .iter()
                .zip(self.path.segments())
                .all(|((name, _), segment)| name == segment);

        if consistent {
            Ok(())
        } else {
            Err(DriveError::InvalidPath(format!(
                "checkpoint does not match path '{}'",
                self.path
            )))
        }
    }
}

/// Ensures folder paths exist.
#[derive(Debug, Clone)]
pub struct FolderSynchronizer {
    resolver: PathResolver,
}

impl FolderSynchronizer {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// ID of the folder at `path`, creating missing segments.
    ///
    /// Idempotent: a second call finds every segment and creates nothing.
    /// The root is returned without a round trip.
    pub async fn ensure(&self, path: &RemotePath) -> Result<NodeId> {
        self.resume(&FolderCheckpoint::new(path.clone())).await
    }

    /// Continue a chain from `checkpoint.last_id()` with the remaining
    /// segments.
    #[instrument(
        skip(self, checkpoint),
        fields(path = %checkpoint.path, done = checkpoint.resolved.len())
    )]
    pub async fn resume(&self, checkpoint: &FolderCheckpoint) -> Result<NodeId> {
        checkpoint.validate()?;

        let mut progress = checkpoint.clone();
        let mut current = progress.last_id();

        for segment in checkpoint.remaining() {
            match self.step(&current, segment).await {
                Ok(id) => {
                    progress.resolved.push((segment.clone(), id.clone()));
                    current = id;
                }
                Err(source) => {
                    return Err(DriveError::FolderChainIncomplete {
                        checkpoint: progress,
                        source: Box::new(source),
                    })
                }
            }
        }

        Ok(current)
    }

    /// Find `segment` under `parent`, or create it.
    async fn step(&self, parent: &NodeId, segment: &str) -> Result<NodeId> {
        if let Some(node) = self
            .resolver
            .lookup_child(parent, segment, Some(NodeKind::Folder))
            .await?
        {
            return Ok(node.id);
        }

        let node = self
            .resolver
            .backend()
            .create_folder(segment, parent)
            .await?;
        info!(%segment, folder_id = %node.id, %parent, "Created folder");
        Ok(node.id)
    }
}
