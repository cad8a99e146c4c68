//! Gmail `messages.send` client

use bridge_traits::http::{HttpMethod, RetryPolicy};
use core_auth::{Authenticator, ServiceHandle};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::error::{NotifyError, Result};
use crate::message::{ComposedMessage, Notification};

const SEND_PATH: &str = "gmail/v1/users/me/messages/send";

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

/// Sends plain-text notifications from the authenticated account.
///
/// # Example
///
/// ```ignore
/// use provider_gmail::{GmailNotifier, Notification};
///
/// let notifier = GmailNotifier::from_authenticator(&authenticator).await?;
/// notifier.send(Notification::new("Backup finished")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct GmailNotifier {
    handle: ServiceHandle,
    default_recipient: String,
    retry_policy: RetryPolicy,
}

impl GmailNotifier {
    /// `default_recipient` is used when a notification names nobody.
    pub fn new(handle: ServiceHandle, default_recipient: impl Into<String>) -> Self {
        Self {
            handle,
            default_recipient: default_recipient.into(),
            retry_policy: RetryPolicy::no_retry(),
        }
    }

    /// Notifier for the authenticated user, defaulting to their own address.
    pub async fn from_authenticator(authenticator: &Authenticator) -> Result<Self> {
        let handle = authenticator.get_handle("mail").await?;
        let username = authenticator.username().await?;
        Ok(Self::new(handle, username))
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn default_recipient(&self) -> &str {
        &self.default_recipient
    }

    /// Compose and send one message; returns the Gmail message ID.
    #[instrument(skip(self, notification))]
    pub async fn send(&self, notification: Notification) -> Result<String> {
        let message = ComposedMessage::compose(&notification, &self.default_recipient)?;

        let request = self
            .handle
            .request(HttpMethod::Post, SEND_PATH)
            .json(&serde_json::json!({ "raw": message.raw() }))
            .map_err(|e| NotifyError::ParseError(e.to_string()))?;

        let response = self
            .handle
            .http_client()
            .execute_with_retry(request, self.retry_policy.clone())
            .await
            .map_err(|e| NotifyError::SendFailed {
                status_code: None,
                message: e.to_string(),
            })?;

        if !response.is_success() {
            let message = String::from_utf8_lossy(&response.body).trim().to_string();
            warn!(status = response.status, "Gmail rejected message");
            return Err(NotifyError::SendFailed {
                status_code: Some(response.status),
                message,
            });
        }

        let sent: SentMessage = response
            .json()
            .map_err(|e| NotifyError::ParseError(e.to_string()))?;

        info!(message_id = %sent.id, to = %message.to, "Notification sent");
        Ok(sent.id)
    }
}
