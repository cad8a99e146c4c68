//! # Core Configuration Module
//!
//! Provides configuration management for the drive core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the bridges and transfer settings every component
//! needs. Validation is fail-fast: a missing bridge or an invalid chunk size
//! is reported by [`CoreConfigBuilder::build`], never later in the middle of a
//! transfer.
//!
//! ## Bridges
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//! - `FileSystemAccess` - Local file I/O (desktop default: tokio fs)
//! - `SecureStore` - Client secrets, tokens and user profile (desktop default:
//!   a credentials directory at the well-known auth location)
//!
//! When the `desktop-shims` feature is enabled, the desktop defaults are
//! injected automatically for any bridge that was not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, TransferConfig};
//!
//! let config = CoreConfig::builder()
//!     .auth_dir("/home/me/.config/drivepath/auth")
//!     .transfer(TransferConfig::default().with_upload_chunk_size(8 * 1024 * 1024))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Without `desktop-shims`, every bridge must be injected:
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! // Fails with Error::CapabilityMissing { capability: "HttpClient", .. }
//! let config = CoreConfig::builder().build();
//! ```

use crate::error::{Error, Result};
use bridge_traits::{FileSystemAccess, HttpClient, RetryPolicy, SecureStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Resumable upload chunks must be a multiple of this many bytes.
pub const UPLOAD_CHUNK_ALIGNMENT: usize = 256 * 1024;

/// Default size of one upload or download chunk (10 MiB).
///
/// Each chunk is one request, so it has to fit within the transport timeout
/// (30 s for the desktop client) on a slow link.
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Transfer tuning for uploads and downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Bytes sent per resumable-upload request
    pub upload_chunk_size: usize,
    /// Bytes requested per ranged download request
    pub download_chunk_size: usize,
    /// Per-request timeout; `None` keeps the transport default
    pub request_timeout: Option<Duration>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            upload_chunk_size: DEFAULT_CHUNK_SIZE,
            download_chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout: None,
        }
    }
}

impl TransferConfig {
    pub fn with_upload_chunk_size(mut self, size: usize) -> Self {
        self.upload_chunk_size = size;
        self
    }

    pub fn with_download_chunk_size(mut self, size: usize) -> Self {
        self.download_chunk_size = size;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Validates chunk sizes.
    ///
    /// The upload chunk size must be a positive multiple of
    /// [`UPLOAD_CHUNK_ALIGNMENT`]; Drive rejects unaligned intermediate chunks.
    pub fn validate(&self) -> Result<()> {
        if self.upload_chunk_size == 0 || self.upload_chunk_size % UPLOAD_CHUNK_ALIGNMENT != 0 {
            return Err(Error::Config(format!(
                "Upload chunk size must be a positive multiple of {} bytes (got {})",
                UPLOAD_CHUNK_ALIGNMENT, self.upload_chunk_size
            )));
        }

        if self.download_chunk_size == 0 {
            return Err(Error::Config(
                "Download chunk size must be greater than 0 bytes".to_string(),
            ));
        }

        if matches!(self.request_timeout, Some(timeout) if timeout.is_zero()) {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Core configuration for the drive core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Directory holding `credentials.json`, `token.json` and `user.json`
    /// when the directory secret store is in use
    pub auth_dir: Option<PathBuf>,

    /// HTTP client for API requests
    pub http_client: Arc<dyn HttpClient>,

    /// Local file system access
    pub file_system: Arc<dyn FileSystemAccess>,

    /// Credential storage
    pub secure_store: Arc<dyn SecureStore>,

    /// Chunk sizes and timeouts
    pub transfer: TransferConfig,

    /// Policy every remote request is issued with. Single attempt by default.
    pub retry_policy: RetryPolicy,

    /// Fail on duplicate sibling names instead of picking the first match
    pub strict_resolution: bool,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("auth_dir", &self.auth_dir)
            .field("http_client", &"HttpClient { ... }")
            .field("file_system", &"FileSystemAccess { ... }")
            .field("secure_store", &self.secure_store.location())
            .field("transfer", &self.transfer)
            .field("retry_policy", &self.retry_policy)
            .field("strict_resolution", &self.strict_resolution)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.auth_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::Config(
                    "Auth directory cannot be empty".to_string(),
                ));
            }
        }

        if self.retry_policy.max_attempts == 0 {
            return Err(Error::Config(
                "Retry policy must allow at least one attempt".to_string(),
            ));
        }

        self.transfer.validate()
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn missing_capability(capability: &str, purpose: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required for {}. \
             Desktop: enable the 'desktop-shims' feature to use the default implementation. \
             Other hosts: inject one through CoreConfig::builder().",
            capability, purpose
        ),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(transfer: &TransferConfig) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = match transfer.request_timeout {
        Some(timeout) => ReqwestHttpClient::with_timeout(timeout)?,
        None => ReqwestHttpClient::new()?,
    };
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_transfer: &TransferConfig) -> Result<Arc<dyn HttpClient>> {
    Err(missing_capability("HttpClient", "Drive and Gmail API requests"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Ok(Arc::new(bridge_desktop::TokioFileSystem::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(missing_capability("FileSystemAccess", "reading uploads and writing downloads"))
}

#[cfg(feature = "desktop-shims")]
fn default_auth_dir() -> Option<PathBuf> {
    Some(bridge_desktop::DirectorySecretStore::default_location())
}

#[cfg(not(feature = "desktop-shims"))]
fn default_auth_dir() -> Option<PathBuf> {
    None
}

#[cfg(feature = "desktop-shims")]
fn provide_default_secure_store(auth_dir: Option<&PathBuf>) -> Result<Arc<dyn SecureStore>> {
    use bridge_desktop::DirectorySecretStore;

    let dir = auth_dir
        .cloned()
        .unwrap_or_else(DirectorySecretStore::default_location);
    Ok(Arc::new(DirectorySecretStore::new(dir)))
}

#[cfg(feature = "desktop-shims")]
fn provide_keyring_store() -> Result<Arc<dyn SecureStore>> {
    Ok(Arc::new(bridge_desktop::KeyringSecureStore::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_keyring_store() -> Result<Arc<dyn SecureStore>> {
    Err(missing_capability("SecureStore", "OS keychain credential persistence"))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_secure_store(_auth_dir: Option<&PathBuf>) -> Result<Arc<dyn SecureStore>> {
    Err(missing_capability("SecureStore", "credential persistence"))
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    auth_dir: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    transfer: Option<TransferConfig>,
    retry_policy: Option<RetryPolicy>,
    strict_resolution: bool,
    os_keyring: bool,
}

impl CoreConfigBuilder {
    /// Sets the credentials directory.
    ///
    /// Only used when no `SecureStore` is injected and the default directory
    /// store is created.
    pub fn auth_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.auth_dir = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the file system access implementation.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Sets the secure store implementation.
    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    /// Sets chunk sizes and timeouts.
    pub fn transfer(mut self, transfer: TransferConfig) -> Self {
        self.transfer = Some(transfer);
        self
    }

    /// Opts into retries. Default: [`RetryPolicy::no_retry`].
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Error on duplicate sibling names instead of taking the first match.
    ///
    /// Default: false
    pub fn strict_resolution(mut self, strict: bool) -> Self {
        self.strict_resolution = strict;
        self
    }

    /// Keep credentials in the OS keychain instead of the auth directory
    /// when no `SecureStore` is injected.
    ///
    /// Default: false
    pub fn os_keyring(mut self, enabled: bool) -> Self {
        self.os_keyring = enabled;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - `Error::CapabilityMissing` when a bridge was not provided and no
    ///   desktop default is available
    /// - `Error::Config` when a setting is out of range
    pub fn build(self) -> Result<CoreConfig> {
        let transfer = self.transfer.unwrap_or_default();
        transfer.validate()?;

        let auth_dir = self.auth_dir.or_else(|| {
            if self.secure_store.is_none() && !self.os_keyring {
                default_auth_dir()
            } else {
                None
            }
        });

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(&transfer)?,
        };

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let secure_store = match self.secure_store {
            Some(store) => store,
            None if self.os_keyring => provide_keyring_store()?,
            None => provide_default_secure_store(auth_dir.as_ref())?,
        };

        let config = CoreConfig {
            auth_dir,
            http_client,
            file_system,
            secure_store,
            transfer,
            retry_policy: self.retry_policy.unwrap_or_else(RetryPolicy::no_retry),
            strict_resolution: self.strict_resolution,
        };

        config.validate()?;
        Ok(config)
    }
}
