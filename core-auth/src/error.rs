use thiserror::Error;

/// Link shown whenever client secrets are missing
pub const CREATE_PROJECT_URL: &str = "https://developers.google.com/workspace/guides/create-project";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Service '{0}' is not supported (expected 'drive' or 'mail')")]
    UnsupportedService(String),

    #[error(
        "Credentials file not found at {location}. See https://developers.google.com/workspace/guides/create-project for instructions on how to create a credentials file."
    )]
    CredentialsMissing { location: String },

    #[error("Authorization required: visit {auth_url} and complete the flow with the returned code")]
    AuthorizationRequired { auth_url: String },

    #[error("User profile not found at {location}")]
    ProfileMissing { location: String },

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("OAuth state mismatch: no pending authorization for state '{0}'")]
    StateMismatch(String),

    #[error("Invalid authorization code: {0}")]
    InvalidAuthCode(String),

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Stored {key} record is corrupted: {reason}")]
    TokenCorrupted { key: String, reason: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
