//! OAuth 2.0 Authorization Flow with PKCE Support
//!
//! Implements RFC 6749 (OAuth 2.0) and RFC 7636 (PKCE) against Google's
//! authorization server.
//!
//! # Overview
//!
//! - Building authorization URLs with a PKCE challenge
//! - Exchanging authorization codes for tokens
//! - Refreshing access tokens
//!
//! # Security
//!
//! - State and code verifier come from a cryptographically secure RNG
//! - State is verified before any code is exchanged
//! - Tokens, codes and verifiers are never logged
//!
//! # Example
//!
//! ```ignore
//! use core_auth::oauth::{OAuthConfig, OAuthFlowManager};
//! use core_auth::{ClientSecrets, SCOPES};
//!
//! let secrets = ClientSecrets::from_json(&credentials_json)?;
//! let config = OAuthConfig::from_client_secrets(&secrets, None);
//! let flow = OAuthFlowManager::new(config, http_client);
//! let (auth_url, verifier) = flow.build_auth_url()?;
//! ```

use crate::error::{AuthError, Result};
use crate::types::{ClientSecrets, OAuthTokens, SCOPES};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Redirect used by installed apps that declare none
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost";

/// OAuth 2.0 client configuration.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    /// Optional for public clients
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
}

impl OAuthConfig {
    /// Build a configuration from downloaded client secrets.
    ///
    /// The redirect URI is `redirect_uri` when given, otherwise the first one
    /// declared by the client, otherwise [`DEFAULT_REDIRECT_URI`].
    pub fn from_client_secrets(secrets: &ClientSecrets, redirect_uri: Option<&str>) -> Self {
        let redirect_uri = redirect_uri
            .map(str::to_string)
            .or_else(|| secrets.redirect_uris.first().cloned())
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());

        Self {
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            redirect_uri,
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            auth_url: secrets.auth_uri.clone(),
            token_url: secrets.token_uri.clone(),
        }
    }

    /// Rebuild a refresh-only configuration from the client fields stored
    /// alongside persisted tokens.
    pub fn from_stored_tokens(tokens: &OAuthTokens) -> Option<Self> {
        let client_id = tokens.client_id.clone()?;
        let token_url = tokens.token_uri.clone()?;

        Some(Self {
            client_id,
            client_secret: tokens.client_secret.clone(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: tokens.scopes.clone(),
            auth_url: String::new(),
            token_url,
        })
    }

    /// Record this client's identity on a token set so it can refresh itself.
    pub fn stamp(&self, mut tokens: OAuthTokens) -> OAuthTokens {
        tokens.client_id = Some(self.client_id.clone());
        tokens.client_secret = self.client_secret.clone();
        tokens.token_uri = Some(self.token_url.clone());
        if tokens.scopes.is_empty() {
            tokens.scopes = self.scopes.clone();
        }
        tokens
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// PKCE (Proof Key for Code Exchange) verifier.
///
/// Holds the code verifier and the CSRF state for one authorization attempt.
/// Only the challenge derived from the verifier leaves the process before
/// the code exchange.
#[derive(Clone)]
pub struct PkceVerifier {
    verifier: String,
    state: String,
}

impl PkceVerifier {
    /// 32 random bytes of verifier and 16 of state, base64url without padding.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);
        let state = URL_SAFE_NO_PAD.encode(state_bytes);

        Self { verifier, state }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// S256 challenge: BASE64URL(SHA256(code_verifier))
    pub fn challenge(&self) -> String {
        let hash = Sha256::digest(self.verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hash)
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PkceVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceVerifier")
            .field("verifier", &"[REDACTED]")
            .field("state", &self.state)
            .finish()
    }
}

/// OAuth 2.0 authorization code flow against one client.
pub struct OAuthFlowManager {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
}

impl OAuthFlowManager {
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the URL the user must visit, plus the verifier to keep until
    /// the code comes back.
    #[instrument(skip(self), fields(client_id = %self.config.client_id))]
    pub fn build_auth_url(&self) -> Result<(String, PkceVerifier)> {
        let verifier = PkceVerifier::new();
        let challenge = verifier.challenge();

        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::Other(format!("Invalid auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", verifier.state())
            .append_pair("code_challenge", &challenge)
            .append_pair("code_challenge_method", "S256")
            // Ask for a refresh token
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        debug!("Built authorization URL");

        Ok((url.to_string(), verifier))
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// - `StateMismatch` if `state` is not the verifier's state
    /// - `InvalidAuthCode` if the token endpoint rejects the code
    /// - `NetworkError` on transport failure
    #[instrument(skip(self, code, verifier, now))]
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &str,
        verifier: &PkceVerifier,
        now: DateTime<Utc>,
    ) -> Result<OAuthTokens> {
        if state != verifier.state() {
            warn!("OAuth state mismatch");
            return Err(AuthError::StateMismatch(state.to_string()));
        }

        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", verifier.verifier()),
        ];
        if let Some(client_secret) = &self.config.client_secret {
            params.push(("client_secret", client_secret.as_str()));
        }

        debug!("Exchanging authorization code for tokens");

        let response = self.post_token_request(&params).await?;

        if !response.is_success() {
            let status = response.status;
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            warn!(status, "Token endpoint rejected authorization code");

            return Err(AuthError::InvalidAuthCode(format!(
                "Token endpoint returned {}: {}",
                status, error_body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::Other(format!("Failed to parse token response: {}", e)))?;

        info!(
            expires_in = token_response.expires_in,
            has_refresh_token = token_response.refresh_token.is_some(),
            "Exchanged authorization code for tokens"
        );

        Ok(self.config.stamp(token_response.into_tokens(None, now)))
    }

    /// Obtain a fresh access token. Single attempt; the previous refresh
    /// token is kept when the server does not rotate it.
    #[instrument(skip(self, refresh_token, now))]
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<OAuthTokens> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ];
        if let Some(client_secret) = &self.config.client_secret {
            params.push(("client_secret", client_secret.as_str()));
        }

        debug!("Refreshing access token");

        let response = self
            .post_token_request(&params)
            .await
            .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;

        if !response.is_success() {
            let status = response.status;
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            warn!(status, "Token refresh rejected");

            return Err(AuthError::TokenRefreshFailed(format!(
                "Token endpoint returned {}: {}",
                status, error_body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::TokenRefreshFailed(format!("Invalid token response: {}", e)))?;

        info!(
            expires_in = token_response.expires_in,
            "Refreshed access token"
        );

        Ok(self
            .config
            .stamp(token_response.into_tokens(Some(refresh_token), now)))
    }

    async fn post_token_request(
        &self,
        params: &[(&str, &str)],
    ) -> Result<bridge_traits::http::HttpResponse> {
        let encoded_body = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        let request = HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Bytes::from(encoded_body));

        self.http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))
    }
}

/// JSON body returned by the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    fn into_tokens(self, previous_refresh: Option<&str>, now: DateTime<Utc>) -> OAuthTokens {
        let refresh_token = self
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string));
        let mut tokens = OAuthTokens::new(self.access_token, refresh_token, self.expires_in, now);
        if let Some(scope) = self.scope {
            tokens.scopes = scope.split_whitespace().map(str::to_string).collect();
        }
        tokens
    }
}

fn default_expires_in() -> i64 {
    3600
}
