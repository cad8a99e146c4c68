//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `FileSystemAccess` using `tokio::fs`
//! - `SecureStore` backed by a credentials directory (the well-known auth
//!   location) or, with the `secure-store` feature, the OS keychain
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DirectorySecretStore, ReqwestHttpClient, TokioFileSystem};
//!
//! let http_client = ReqwestHttpClient::new()?;
//! let fs = TokioFileSystem::new();
//! let secrets = DirectorySecretStore::new(DirectorySecretStore::default_location());
//! ```

mod directory_store;
mod filesystem;
mod http;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use directory_store::DirectorySecretStore;
pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;

#[cfg(feature = "secure-store")]
pub use secure_store::KeyringSecureStore;
