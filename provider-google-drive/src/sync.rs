//! Create-or-update of a local file into a remote folder

use std::path::Path;
use tracing::{info, instrument};

use crate::backend::NodeId;
use crate::error::{DriveError, Result};
use crate::folders::FolderSynchronizer;
use crate::path::RemotePath;
use crate::resolver::{FileProbe, PathResolver};
use crate::transfer::TransferEngine;

/// Puts a local file at `<remote folder>/<local file name>`.
///
/// An existing node with that name gets its content replaced and keeps its
/// ID. Otherwise the folder path is created as needed and a new file node
/// is made under it.
#[derive(Clone)]
pub struct FileSynchronizer {
    resolver: PathResolver,
    folders: FolderSynchronizer,
    transfer: TransferEngine,
}

impl FileSynchronizer {
    pub fn new(
        resolver: PathResolver,
        folders: FolderSynchronizer,
        transfer: TransferEngine,
    ) -> Self {
        Self {
            resolver,
            folders,
            transfer,
        }
    }

    #[instrument(
        skip(self, local_file, remote_folder),
        fields(local = %local_file.display(), remote = %remote_folder)
    )]
    pub async fn sync(&self, local_file: &Path, remote_folder: &RemotePath) -> Result<NodeId> {
        let name = local_file
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                DriveError::InvalidPath(format!(
                    "'{}' has no usable file name",
                    local_file.display()
                ))
            })?;

        match self.resolver.probe_file(remote_folder, name).await? {
            FileProbe::Found { file_id, .. } => {
                // Content is replaced where the node is; it is never moved
                info!(%file_id, "Updating existing file");
                self.transfer.update(local_file, &file_id).await
            }
            FileProbe::Missing { parent_id } => self.transfer.upload(local_file, &parent_id).await,
            FileProbe::ParentMissing => {
                let parent_id = self.folders.ensure(remote_folder).await?;
                self.transfer.upload(local_file, &parent_id).await
            }
        }
    }
}
