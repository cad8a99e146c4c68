//! Error types for the Gmail notifier

use core_auth::AuthError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    /// Recipient empty after defaulting, or not an address
    #[error("Invalid recipient: '{0}'")]
    InvalidRecipient(String),

    /// Header value would break the message framing
    #[error("Invalid {header} header: line breaks are not allowed")]
    InvalidHeader { header: &'static str },

    /// Gmail rejected the message or could not be reached
    #[error("Gmail send failed{}: {}", status_suffix(.status_code), .message)]
    SendFailed {
        status_code: Option<u16>,
        message: String,
    },

    #[error("Failed to parse Gmail response: {0}")]
    ParseError(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

fn status_suffix(status_code: &Option<u16>) -> String {
    match status_code {
        Some(status) => format!(" (status {})", status),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, NotifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_failed_display() {
        let err = NotifyError::SendFailed {
            status_code: Some(400),
            message: "Invalid To header".to_string(),
        };
        assert_eq!(err.to_string(), "Gmail send failed (status 400): Invalid To header");

        let err = NotifyError::SendFailed {
            status_code: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Gmail send failed: connection refused");
    }

    #[test]
    fn test_auth_errors_convert() {
        let err: NotifyError = AuthError::UnsupportedService("sheets".to_string()).into();
        assert!(matches!(err, NotifyError::Auth(_)));
    }
}
