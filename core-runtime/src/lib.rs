//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the drive, auth and
//! notification crates:
//! - Logging and tracing setup
//! - Configuration (`CoreConfig`, `TransferConfig`)
//!
//! ## Overview
//!
//! Hosts build one [`CoreConfig`](config::CoreConfig) at startup, call
//! [`init_logging`](logging::init_logging) once, then hand the config to the
//! components that need bridges or transfer settings.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, TransferConfig};
pub use error::{Error, Result};
