//! Path-level Drive operations

use bridge_traits::storage::FileSystemAccess;
use core_auth::ServiceHandle;
use core_runtime::config::{CoreConfig, TransferConfig};
use std::path::Path;
use std::sync::Arc;

use crate::backend::{DriveBackend, NodeId};
use crate::connector::GoogleDriveConnector;
use crate::error::{DriveError, Result};
use crate::folders::{FolderCheckpoint, FolderSynchronizer};
use crate::path::RemotePath;
use crate::resolver::{FirstMatch, MatchStrategy, PathResolver, StrictUnique};
use crate::sync::FileSynchronizer;
use crate::transfer::TransferEngine;

/// Drive seen as a path namespace.
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::{DriveClient, RemotePath};
///
/// let handle = authenticator.get_handle("drive").await?;
/// let drive = DriveClient::from_config(handle, &config)?;
///
/// let folder = RemotePath::parse("backups/2024")?;
/// let file_id = drive.upload_file(Path::new("notes.txt"), &folder).await?;
/// ```
#[derive(Clone)]
pub struct DriveClient {
    backend: Arc<dyn DriveBackend>,
    resolver: PathResolver,
    folders: FolderSynchronizer,
    files: FileSynchronizer,
    transfer: TransferEngine,
}

impl DriveClient {
    /// Client resolving duplicates with [`FirstMatch`].
    ///
    /// `transfer` is validated here; an unaligned upload chunk size is a
    /// [`DriveError::Config`].
    pub fn new(
        backend: Arc<dyn DriveBackend>,
        file_system: Arc<dyn FileSystemAccess>,
        transfer: TransferConfig,
    ) -> Result<Self> {
        let engine = TransferEngine::new(Arc::clone(&backend), file_system, transfer)?;
        Ok(Self::assemble(backend, engine, Arc::new(FirstMatch)))
    }

    /// Client talking to Google Drive through `handle`, with the bridges,
    /// transfer settings and retry policy of `config`.
    pub fn from_config(handle: ServiceHandle, config: &CoreConfig) -> Result<Self> {
        let connector = GoogleDriveConnector::new(handle)
            .with_retry_policy(config.retry_policy.clone())
            .with_request_timeout(config.transfer.request_timeout);
        let backend: Arc<dyn DriveBackend> = Arc::new(connector);

        let strategy: Arc<dyn MatchStrategy> = if config.strict_resolution {
            Arc::new(StrictUnique)
        } else {
            Arc::new(FirstMatch)
        };

        let engine = TransferEngine::new(
            Arc::clone(&backend),
            Arc::clone(&config.file_system),
            config.transfer.clone(),
        )?;
        Ok(Self::assemble(backend, engine, strategy))
    }

    /// Same client with another duplicate-name strategy
    pub fn with_strategy(self, strategy: Arc<dyn MatchStrategy>) -> Self {
        Self::assemble(self.backend, self.transfer, strategy)
    }

    fn assemble(
        backend: Arc<dyn DriveBackend>,
        transfer: TransferEngine,
        strategy: Arc<dyn MatchStrategy>,
    ) -> Self {
        let resolver = PathResolver::with_strategy(Arc::clone(&backend), strategy);
        let folders = FolderSynchronizer::new(resolver.clone());
        let files = FileSynchronizer::new(resolver.clone(), folders.clone(), transfer.clone());

        Self {
            backend,
            resolver,
            folders,
            files,
            transfer,
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn folders(&self) -> &FolderSynchronizer {
        &self.folders
    }

    pub fn files(&self) -> &FileSynchronizer {
        &self.files
    }

    pub fn transfer(&self) -> &TransferEngine {
        &self.transfer
    }

    /// ID of the folder at `path`, if it exists
    pub async fn folder_exists(&self, path: &RemotePath) -> Result<Option<NodeId>> {
        self.resolver.resolve(path).await
    }

    /// ID of the file at `path`, if it exists
    pub async fn file_exists(&self, path: &RemotePath) -> Result<Option<NodeId>> {
        self.resolver.resolve_file_path(path).await
    }

    /// Make sure every folder of `path` exists and return the last one's ID.
    pub async fn create_folder(&self, path: &RemotePath) -> Result<NodeId> {
        self.folders.ensure(path).await
    }

    /// Continue a folder chain that failed part way.
    pub async fn resume_folder(&self, checkpoint: &FolderCheckpoint) -> Result<NodeId> {
        self.folders.resume(checkpoint).await
    }

    /// Create or update `<remote_folder>/<file name of local>`.
    pub async fn upload_file(&self, local: &Path, remote_folder: &RemotePath) -> Result<NodeId> {
        self.files.sync(local, remote_folder).await
    }

    /// Download the file at `remote_file` to `local`.
    pub async fn download_file(&self, local: &Path, remote_file: &RemotePath) -> Result<()> {
        let file_id = self
            .resolver
            .resolve_file_path(remote_file)
            .await?
            .ok_or_else(|| DriveError::NotFound {
                path: remote_file.to_string(),
            })?;

        self.transfer.download(&file_id, local).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::{DirectorySecretStore, TokioFileSystem};
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use bytes::Bytes;
    use core_auth::ServiceKind;
    use mockall::mock;
    use std::collections::HashMap;
    use std::time::Duration;

    mock! {
        Http {}

        #[async_trait::async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn duplicate_listing() -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from_static(
                br#"{"files": [{"id": "one", "name": "dup"}, {"id": "two", "name": "dup"}]}"#,
            ),
        }
    }

    fn drive_client(strict: bool, expect_limit: &'static str) -> DriveClient {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(move |req| {
            assert!(req.url.contains(expect_limit));
            assert_eq!(req.timeout, Some(Duration::from_secs(7)));
            Ok(duplicate_listing())
        });
        let http: Arc<dyn HttpClient> = Arc::new(http);

        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::builder()
            .http_client(Arc::clone(&http))
            .file_system(Arc::new(TokioFileSystem::new()))
            .secure_store(Arc::new(DirectorySecretStore::new(dir.path())))
            .transfer(TransferConfig::default().with_request_timeout(Duration::from_secs(7)))
            .strict_resolution(strict)
            .build()
            .unwrap();

        let handle = ServiceHandle::new(ServiceKind::Drive, "token", http);
        DriveClient::from_config(handle, &config).unwrap()
    }

    #[tokio::test]
    async fn test_from_config_defaults_to_first_match() {
        let client = drive_client(false, "pageSize=1");
        let id = client
            .folder_exists(&RemotePath::parse("dup").unwrap())
            .await
            .unwrap();
        assert_eq!(id, Some(NodeId::new("one")));
    }

    #[tokio::test]
    async fn test_from_config_strict_resolution() {
        let client = drive_client(true, "pageSize=2");
        let err = client
            .folder_exists(&RemotePath::parse("dup").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::AmbiguousPath { matches: 2, .. }));
    }

    #[test]
    fn test_unaligned_upload_chunk_is_rejected() {
        let mut http = MockHttp::new();
        http.expect_execute().times(0);
        let handle = ServiceHandle::new(ServiceKind::Drive, "token", Arc::new(http));
        let backend: Arc<dyn DriveBackend> = Arc::new(GoogleDriveConnector::new(handle));

        let result = DriveClient::new(
            backend,
            Arc::new(TokioFileSystem::new()),
            TransferConfig::default().with_upload_chunk_size(1000),
        );
        assert!(matches!(result, Err(DriveError::Config(_))));
    }
}
