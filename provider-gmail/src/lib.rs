//! # Gmail Notifier
//!
//! Sends plain-text notifications through the Gmail API on behalf of the
//! authenticated user.
//!
//! Each [`GmailNotifier::send`] call composes exactly one RFC 5322 message,
//! base64url-encodes it and posts it to `users/me/messages/send`. The
//! recipient defaults to the user's own address and the subject to
//! [`DEFAULT_SUBJECT`].

pub mod error;
pub mod message;
pub mod notifier;

pub use error::{NotifyError, Result};
pub use message::{ComposedMessage, Notification, DEFAULT_SUBJECT};
pub use notifier::GmailNotifier;
