//! drivepath workspace facade.
//!
//! Wires the runtime configuration, the authenticator and the providers
//! together so a host only has to depend on this crate. Features map onto
//! the workspace crates:
//!
//! - `desktop-shims` (default): desktop HTTP, filesystem and secret-store
//!   bridges are injected when none are given.
//! - `notify` (default): Gmail notifications via [`connect_notifier`].

use anyhow::{Context, Result};
use tracing::info;

pub use core_auth::Authenticator;
pub use core_runtime::config::{CoreConfig, TransferConfig};
pub use provider_google_drive::{DriveClient, DriveError, RemotePath};

#[cfg(feature = "notify")]
pub use provider_gmail::{GmailNotifier, Notification};

/// Authenticator backed by the token store of `config`.
pub fn authenticator(config: &CoreConfig) -> Authenticator {
    Authenticator::from_config(config)
}

/// Drive client for the user authorized in `authenticator`.
pub async fn connect_drive(
    config: &CoreConfig,
    authenticator: &Authenticator,
) -> Result<DriveClient> {
    let handle = authenticator
        .get_handle("drive")
        .await
        .context("Google Drive is not authorized")?;

    let drive =
        DriveClient::from_config(handle, config).context("Invalid transfer settings")?;
    info!(strict = config.strict_resolution, "Connected to Google Drive");
    Ok(drive)
}

/// Gmail notifier sending from, and by default to, the authorized user.
#[cfg(feature = "notify")]
pub async fn connect_notifier(
    config: &CoreConfig,
    authenticator: &Authenticator,
) -> Result<GmailNotifier> {
    let notifier = GmailNotifier::from_authenticator(authenticator)
        .await
        .context("Gmail is not authorized")?;

    info!("Connected to Gmail");
    Ok(notifier.with_retry_policy(config.retry_policy.clone()))
}
