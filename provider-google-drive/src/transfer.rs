//! Chunked content transfer
//!
//! Uploads go through one resumable session per file, sent in
//! `upload_chunk_size` pieces; downloads are a series of ranged reads of
//! `download_chunk_size` bytes. Neither direction retries or resumes after a
//! failure, and a partially written download is left in place.

use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use core_runtime::config::TransferConfig;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, instrument};

use crate::backend::{ByteRange, ChunkStatus, DriveBackend, NodeId, UploadTarget};
use crate::error::{DriveError, Result};

/// Moves bytes between local files and remote file nodes.
#[derive(Clone)]
pub struct TransferEngine {
    backend: Arc<dyn DriveBackend>,
    file_system: Arc<dyn FileSystemAccess>,
    config: TransferConfig,
}

impl TransferEngine {
    /// Fails with [`DriveError::Config`] when `config` does not validate
    /// (e.g. an upload chunk size Drive would reject).
    pub fn new(
        backend: Arc<dyn DriveBackend>,
        file_system: Arc<dyn FileSystemAccess>,
        config: TransferConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            file_system,
            config,
        })
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Create a file named after `local` under `parent_id`.
    pub async fn upload(&self, local: &Path, parent_id: &NodeId) -> Result<NodeId> {
        let name = local_file_name(local)?;
        self.send(
            local,
            UploadTarget::Create {
                name,
                parent_id: parent_id.clone(),
            },
        )
        .await
    }

    /// Replace the content of `file_id` with `local`.
    pub async fn update(&self, local: &Path, file_id: &NodeId) -> Result<NodeId> {
        self.send(
            local,
            UploadTarget::Update {
                file_id: file_id.clone(),
            },
        )
        .await
    }

    #[instrument(skip(self, local), fields(local = %local.display()))]
    async fn send(&self, local: &Path, target: UploadTarget) -> Result<NodeId> {
        let metadata = self
            .file_system
            .metadata(local)
            .await
            .map_err(|e| DriveError::local_io(local, e))?;
        if metadata.is_directory {
            return Err(DriveError::local_io(local, "is a directory"));
        }

        let total = metadata.size;
        let chunk_size = self.config.upload_chunk_size.max(1) as u64;

        let session = self.backend.begin_upload(target, total).await?;
        let mut reader = self
            .file_system
            .open_read_stream(local)
            .await
            .map_err(|e| DriveError::local_io(local, e))?;

        let mut offset = 0u64;
        loop {
            let want = chunk_size.min(total - offset);
            let data = read_chunk(&mut reader, want, local).await?;
            let sent = data.len() as u64;

            let status = self.backend.upload_chunk(&session, offset, data).await?;
            offset += sent;
            let last = offset >= total;

            match status {
                ChunkStatus::Complete(node) if last => {
                    info!(file_id = %node.id, bytes = total, "Upload complete");
                    return Ok(node.id);
                }
                ChunkStatus::Complete(_) => {
                    return Err(DriveError::transfer(
                        "upload",
                        None,
                        format!("session completed after {} of {} bytes", offset, total),
                    ))
                }
                ChunkStatus::Incomplete { .. } if last => {
                    return Err(DriveError::transfer(
                        "upload",
                        None,
                        format!("session not completed after all {} bytes were sent", total),
                    ))
                }
                ChunkStatus::Incomplete { persisted } if persisted != offset => {
                    return Err(DriveError::transfer(
                        "upload",
                        None,
                        format!("backend persisted {} bytes, {} were sent", persisted, offset),
                    ))
                }
                ChunkStatus::Incomplete { persisted } => {
                    debug!(persisted, total, "Chunk persisted");
                }
            }
        }
    }

    /// Write the content of `file_id` to `local`, replacing it.
    #[instrument(skip(self, file_id, local), fields(file_id = %file_id, local = %local.display()))]
    pub async fn download(&self, file_id: &NodeId, local: &Path) -> Result<()> {
        let chunk_size = self.config.download_chunk_size.max(1) as u64;
        let mut writer = self
            .file_system
            .open_write_stream(local)
            .await
            .map_err(|e| DriveError::local_io(local, e))?;

        let mut offset = 0u64;
        loop {
            let chunk = self
                .backend
                .read_content(file_id, ByteRange::with_len(offset, chunk_size))
                .await?;
            let received = chunk.data.len() as u64;

            if received > 0 {
                // Received bytes reach disk before the next read
                writer
                    .write_all(&chunk.data)
                    .await
                    .map_err(|e| DriveError::local_io(local, e))?;
                writer
                    .flush()
                    .await
                    .map_err(|e| DriveError::local_io(local, e))?;
                offset += received;
            }

            let done = match chunk.total_size {
                Some(total) if received == 0 && offset < total => {
                    return Err(DriveError::transfer(
                        "download",
                        None,
                        format!("content ended after {} of {} bytes", offset, total),
                    ))
                }
                Some(total) => offset >= total,
                None => received < chunk_size,
            };
            if done {
                break;
            }
            debug!(offset, "Chunk written");
        }

        writer
            .shutdown()
            .await
            .map_err(|e| DriveError::local_io(local, e))?;

        info!(bytes = offset, "Download complete");
        Ok(())
    }
}

fn local_file_name(local: &Path) -> Result<String> {
    local
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            DriveError::InvalidPath(format!("'{}' has no usable file name", local.display()))
        })
}

/// Read exactly `len` bytes; a short read means the file shrank mid-upload.
async fn read_chunk<R>(reader: &mut R, len: u64, local: &Path) -> Result<Bytes>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = Vec::with_capacity(len as usize);
    reader
        .take(len)
        .read_to_end(&mut buf)
        .await
        .map_err(|e| DriveError::local_io(local, e))?;

    if (buf.len() as u64) < len {
        return Err(DriveError::local_io(
            local,
            format!("file changed size during upload ({} of {} bytes read)", buf.len(), len),
        ));
    }
    Ok(Bytes::from(buf))
}
