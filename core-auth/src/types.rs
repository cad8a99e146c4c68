use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AuthError, Result};

/// OAuth scopes requested for every authorization.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/gmail.send",
];

/// Google API a handle can be built for.
///
/// # Examples
///
/// ```
/// use core_auth::ServiceKind;
///
/// assert_eq!(ServiceKind::parse("gmail"), Some(ServiceKind::Mail));
/// assert_eq!(ServiceKind::Drive.api_version(), "v3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceKind {
    /// Google Drive v3
    Drive,
    /// Gmail v1
    Mail,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 2] = [ServiceKind::Drive, ServiceKind::Mail];

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKind::Drive => "Google Drive",
            ServiceKind::Mail => "Gmail",
        }
    }

    /// Name accepted by [`Authenticator::get_handle`](crate::Authenticator::get_handle)
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Drive => "drive",
            ServiceKind::Mail => "mail",
        }
    }

    /// Parse a service name. `"gmail"` is accepted as an alias for mail.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "drive" => Some(ServiceKind::Drive),
            "mail" | "gmail" => Some(ServiceKind::Mail),
            _ => None,
        }
    }

    pub fn api_version(&self) -> &'static str {
        match self {
            ServiceKind::Drive => "v3",
            ServiceKind::Mail => "v1",
        }
    }

    /// Default API host for this service
    pub fn api_base(&self) -> &'static str {
        match self {
            ServiceKind::Drive => "https://www.googleapis.com",
            ServiceKind::Mail => "https://gmail.googleapis.com",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// OAuth 2.0 token set, persisted in Google's authorized-user JSON layout.
///
/// The client fields are kept next to the tokens so a refresh can happen
/// even when the client secrets file has since been removed.
///
/// # Security
///
/// The `Debug` implementation redacts every secret.
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    #[serde(rename = "token")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// `None` means the token does not expire
    #[serde(rename = "expiry", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl OAuthTokens {
    /// Create a token set expiring `expires_in` seconds after `now`.
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: Some(now + Duration::seconds(expires_in)),
            token_uri: None,
            client_id: None,
            client_secret: None,
            scopes: Vec::new(),
        }
    }

    /// Whether the token is expired, or expires within `buffer_seconds` of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at - Duration::seconds(buffer_seconds),
            None => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }
}

impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// OAuth client secrets as downloaded from the Google Cloud console.
///
/// Both the `installed` (desktop app) and `web` layouts are accepted.
#[derive(Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse a `credentials.json` document.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let file: ClientSecretsFile =
            serde_json::from_slice(data).map_err(|e| AuthError::TokenCorrupted {
                key: "credentials".to_string(),
                reason: e.to_string(),
            })?;

        file.installed
            .or(file.web)
            .ok_or_else(|| AuthError::TokenCorrupted {
                key: "credentials".to_string(),
                reason: "expected an 'installed' or 'web' client".to_string(),
            })
    }
}

impl fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Authenticated user's profile (`user.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
}

/// Summary of where credentials live and what they grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthInfo {
    pub location: String,
    pub scopes: Vec<String>,
    pub services: Vec<ServiceKind>,
}

impl fmt::Display for AuthInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Authentication info located at {}", self.location)?;
        for service in &self.services {
            writeln!(
                f,
                "  service {} ({} {})",
                service.as_str(),
                service.display_name(),
                service.api_version()
            )?;
        }
        write!(f, "  scopes: {}", self.scopes.join(" "))
    }
}
