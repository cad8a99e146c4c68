//! # Host Bridge Traits
//!
//! Capabilities the drive core consumes but never implements: network
//! transport, local file access, secret persistence, time and log
//! forwarding. Desktop implementations live in `bridge-desktop`; tests
//! substitute `mockall` mocks or in-memory fakes.
//!
//! | Trait | Used by |
//! |-------|---------|
//! | [`HttpClient`](http::HttpClient) | Drive connector, Gmail notifier, OAuth token exchange |
//! | [`FileSystemAccess`](storage::FileSystemAccess) | chunked upload reads, streamed download writes |
//! | [`SecureStore`](storage::SecureStore) | client secrets, tokens, user profile |
//! | [`Clock`](time::Clock) | access-token expiry |
//! | [`LoggerSink`](time::LoggerSink) | mirroring `tracing` events to the host |
//!
//! Every trait is `Send + Sync` so one implementation can be shared behind
//! an `Arc`. Errors are [`BridgeError`](error::BridgeError) and never carry
//! secrets.

pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::{FileMetadata, FileSystemAccess, SecureStore};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, StderrSink, SystemClock};
