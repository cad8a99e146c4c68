//! Error types for the Google Drive provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

use crate::folders::FolderCheckpoint;

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum DriveError {
    /// A path that had to exist could not be resolved
    #[error("Remote path not found: {path}")]
    NotFound { path: String },

    /// A remote call failed (non-success status or transport error)
    #[error("{}", transfer_failure_message(.operation, .status_code, .message))]
    TransferFailure {
        operation: String,
        status_code: Option<u16>,
        message: String,
    },

    /// More than one sibling matched under a strict match strategy
    #[error("Ambiguous path: {matches} nodes named '{name}' under {parent_id}")]
    AmbiguousPath {
        parent_id: String,
        name: String,
        matches: usize,
    },

    /// Folder chain creation stopped part way; `checkpoint` lists what exists
    #[error(
        "Folder chain for '{}' incomplete after {} of {} segments: {}",
        .checkpoint.path,
        .checkpoint.resolved.len(),
        .checkpoint.path.len(),
        .source
    )]
    FolderChainIncomplete {
        checkpoint: FolderCheckpoint,
        source: Box<DriveError>,
    },

    /// Path could not be parsed or has no usable component
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Local file could not be read or written
    #[error("Local I/O error on {path}: {message}")]
    LocalIo { path: String, message: String },

    /// Failed to parse an API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Transfer settings rejected before any request was made
    #[error(transparent)]
    Config(#[from] core_runtime::Error),
}

fn transfer_failure_message(
    operation: &str,
    status_code: &Option<u16>,
    message: &str,
) -> String {
    match status_code {
        Some(status) => format!(
            "Google Drive {} failed (status {}): {}",
            operation, status, message
        ),
        None => format!("Google Drive {} failed: {}", operation, message),
    }
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, DriveError>;

impl DriveError {
    pub(crate) fn transfer(
        operation: impl Into<String>,
        status_code: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        DriveError::TransferFailure {
            operation: operation.into(),
            status_code,
            message: message.into(),
        }
    }

    pub(crate) fn local_io(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        DriveError::LocalIo {
            path: path.display().to_string(),
            message: error.to_string(),
        }
    }

    /// Whether the root cause is a failed remote call.
    ///
    /// Looks through `FolderChainIncomplete` to the error that stopped the
    /// chain.
    pub fn is_transfer_failure(&self) -> bool {
        match self {
            DriveError::TransferFailure { .. } => true,
            DriveError::FolderChainIncomplete { source, .. } => source.is_transfer_failure(),
            _ => false,
        }
    }

    /// HTTP status of the failed call, if the root cause carried one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DriveError::TransferFailure { status_code, .. } => *status_code,
            DriveError::FolderChainIncomplete { source, .. } => source.status_code(),
            _ => None,
        }
    }
}

impl From<DriveError> for BridgeError {
    fn from(error: DriveError) -> Self {
        match error {
            DriveError::LocalIo { path, message } => BridgeError::Io(std::io::Error::other(
                format!("Local I/O error on {}: {}", path, message),
            )),
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}
