//! RFC 5322 plain-text message composition

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;

use crate::error::{NotifyError, Result};

/// Subject used when none is given
pub const DEFAULT_SUBJECT: &str = "Message from drivepath";

/// One outbound notification.
///
/// `to` defaults to the authenticated user, `subject` to
/// [`DEFAULT_SUBJECT`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub body: String,
}

impl Notification {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to = Some(recipient.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// A message ready to hand to Gmail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    pub to: String,
    pub subject: String,
    /// Full RFC 5322 text with CRLF line endings
    pub rfc5322: String,
}

impl ComposedMessage {
    /// Build the message, filling in defaults.
    ///
    /// Empty `to` or `subject` count as absent.
    pub fn compose(notification: &Notification, default_recipient: &str) -> Result<Self> {
        let to = notification
            .to
            .as_deref()
            .map(str::trim)
            .filter(|to| !to.is_empty())
            .unwrap_or_else(|| default_recipient.trim())
            .to_string();
        validate_recipient(&to)?;

        let subject = notification
            .subject
            .as_deref()
            .filter(|subject| !subject.is_empty())
            .unwrap_or(DEFAULT_SUBJECT)
            .to_string();
        if subject.contains(['\r', '\n']) {
            return Err(NotifyError::InvalidHeader { header: "Subject" });
        }

        let body = normalize_line_endings(&notification.body);
        let rfc5322 = format!(
            "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"utf-8\"\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{}",
            to,
            encode_header_value(&subject),
            body
        );

        Ok(Self {
            to,
            subject,
            rfc5322,
        })
    }

    /// Value for the `raw` field of `messages.send`
    pub fn raw(&self) -> String {
        URL_SAFE.encode(self.rfc5322.as_bytes())
    }
}

fn validate_recipient(to: &str) -> Result<()> {
    if to.is_empty() || to.contains(['\r', '\n']) || !to.contains('@') {
        return Err(NotifyError::InvalidRecipient(to.to_string()));
    }
    Ok(())
}

/// Non-ASCII header values become an RFC 2047 encoded word.
fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?utf-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

fn normalize_line_endings(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\n', "\r\n")
}
