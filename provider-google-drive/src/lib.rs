//! # Google Drive Provider
//!
//! Treats Google Drive's flat, ID-addressed object graph as a hierarchical
//! path namespace.
//!
//! ## Overview
//!
//! Drive stores folders and files as nodes with opaque IDs and parent
//! references, and allows several siblings with the same name. This crate
//! layers path semantics over that graph:
//!
//! - [`PathResolver`] - walk a [`RemotePath`] segment by segment to a node ID
//! - [`FolderSynchronizer`] - make a folder path exist, creating what is missing
//! - [`FileSynchronizer`] - create-or-update a local file in a remote folder
//! - [`TransferEngine`] - resumable chunked upload, ranged chunked download
//! - [`DriveClient`] - the above bundled behind path-level operations
//!
//! All of them talk to a [`DriveBackend`]; [`GoogleDriveConnector`] is the
//! Drive v3 REST implementation.
//!
//! ## Duplicate names
//!
//! When several siblings share a name, [`FirstMatch`] (default) uses the
//! first node Drive lists and [`StrictUnique`] fails with
//! [`DriveError::AmbiguousPath`].
//!
//! ## Consistency
//!
//! Nothing is cached between calls and multi-step operations are not
//! atomic. A folder chain that fails part way reports a [`FolderCheckpoint`]
//! that [`DriveClient::resume_folder`] picks up from.

pub mod backend;
pub mod client;
pub mod connector;
pub mod error;
pub mod folders;
pub mod path;
pub mod query;
pub mod resolver;
pub mod sync;
pub mod transfer;
pub mod types;

pub use backend::{
    ByteRange, ChunkStatus, ContentChunk, DriveBackend, Node, NodeId, NodeKind, NodeQuery,
    UploadSession, UploadTarget, FOLDER_MIME_TYPE,
};
pub use client::DriveClient;
pub use connector::GoogleDriveConnector;
pub use error::{DriveError, Result};
pub use folders::{FolderCheckpoint, FolderSynchronizer};
pub use path::RemotePath;
pub use resolver::{FileProbe, FirstMatch, MatchStrategy, PathResolver, StrictUnique};
pub use sync::FileSynchronizer;
pub use transfer::TransferEngine;
