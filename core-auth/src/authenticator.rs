//! Handle issuance
//!
//! [`Authenticator`] turns the stored credential records into an
//! authenticated [`ServiceHandle`]:
//!
//! 1. A stored, unexpired token is used as is.
//! 2. An expired token with a refresh token is refreshed and persisted.
//! 3. Without a usable token, client secrets are required. If they are
//!    missing the caller gets `CredentialsMissing`; otherwise
//!    `AuthorizationRequired` carrying the URL to visit, and the flow is
//!    finished with [`Authenticator::complete_authorization`].

use crate::error::{AuthError, Result, CREATE_PROJECT_URL};
use crate::handle::ServiceHandle;
use crate::oauth::{OAuthConfig, OAuthFlowManager, PkceVerifier};
use crate::token_store::TokenStore;
use crate::types::{AuthInfo, OAuthTokens, ServiceKind, UserProfile, SCOPES};
use bridge_traits::http::HttpClient;
use bridge_traits::storage::SecureStore;
use bridge_traits::time::{Clock, SystemClock};
use core_runtime::config::CoreConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

/// Tokens expiring within this window are refreshed before use
const EXPIRY_BUFFER_SECS: i64 = 300;

pub struct Authenticator {
    token_store: TokenStore,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    redirect_uri: Option<String>,
    /// Verifiers of authorizations started but not completed, keyed by state
    pending: Mutex<HashMap<String, (OAuthConfig, PkceVerifier)>>,
}

impl Authenticator {
    pub fn new(secure_store: Arc<dyn SecureStore>, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            token_store: TokenStore::new(secure_store),
            http_client,
            clock: Arc::new(SystemClock),
            redirect_uri: None,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(
            Arc::clone(&config.secure_store),
            Arc::clone(&config.http_client),
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Override the redirect URI declared in the client secrets.
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.token_store
    }

    /// Build an authenticated handle for `service_name` (`"drive"`, `"mail"`
    /// or `"gmail"`).
    #[instrument(skip(self))]
    pub async fn get_handle(&self, service_name: &str) -> Result<ServiceHandle> {
        let service = ServiceKind::parse(service_name)
            .ok_or_else(|| AuthError::UnsupportedService(service_name.to_string()))?;

        let access_token = self.access_token().await?;
        debug!(service = service.as_str(), "Issued service handle");

        Ok(ServiceHandle::new(
            service,
            access_token,
            Arc::clone(&self.http_client),
        ))
    }

    /// Current access token, refreshing it when needed.
    pub async fn access_token(&self) -> Result<String> {
        let now = self.clock.now();

        match self.token_store.retrieve_tokens().await {
            Ok(Some(tokens)) if !tokens.is_expired_at(now, EXPIRY_BUFFER_SECS) => {
                return Ok(tokens.access_token);
            }
            Ok(Some(tokens)) if tokens.can_refresh() => {
                let refreshed = self.refresh(tokens).await?;
                return Ok(refreshed.access_token);
            }
            Ok(_) => {}
            // Corrupted tokens were discarded; fall through to re-authorization
            Err(AuthError::TokenCorrupted { .. }) => {}
            Err(e) => return Err(e),
        }

        let auth_url = self.begin_authorization().await?;
        Err(AuthError::AuthorizationRequired { auth_url })
    }

    async fn refresh(&self, tokens: OAuthTokens) -> Result<OAuthTokens> {
        let config = match self.token_store.client_secrets().await? {
            Some(secrets) => {
                OAuthConfig::from_client_secrets(&secrets, self.redirect_uri.as_deref())
            }
            None => OAuthConfig::from_stored_tokens(&tokens).ok_or_else(|| {
                AuthError::CredentialsMissing {
                    location: self.token_store.location(),
                }
            })?,
        };

        let refresh_token = tokens.refresh_token.as_deref().unwrap_or_default();
        let flow = OAuthFlowManager::new(config, Arc::clone(&self.http_client));
        let mut refreshed = flow
            .refresh_access_token(refresh_token, self.clock.now())
            .await?;

        if refreshed.scopes.is_empty() {
            refreshed.scopes = tokens.scopes;
        }

        self.token_store.store_tokens(&refreshed).await?;
        info!("Access token refreshed and persisted");
        Ok(refreshed)
    }

    /// Start an authorization and return the URL the user must visit.
    ///
    /// # Errors
    ///
    /// `CredentialsMissing` when no client secrets are stored.
    pub async fn begin_authorization(&self) -> Result<String> {
        let Some(secrets) = self.token_store.client_secrets().await? else {
            warn!(help = CREATE_PROJECT_URL, "No client secrets available");
            return Err(AuthError::CredentialsMissing {
                location: self.token_store.location(),
            });
        };

        let config = OAuthConfig::from_client_secrets(&secrets, self.redirect_uri.as_deref());
        let flow = OAuthFlowManager::new(config.clone(), Arc::clone(&self.http_client));
        let (auth_url, verifier) = flow.build_auth_url()?;

        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(verifier.state().to_string(), (config, verifier));

        info!("Authorization started");
        Ok(auth_url)
    }

    /// Finish an authorization with the `code` and `state` from the redirect,
    /// then persist the resulting tokens.
    #[instrument(skip(self, code))]
    pub async fn complete_authorization(&self, code: &str, state: &str) -> Result<()> {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(state);

        let Some((config, verifier)) = pending else {
            warn!("No pending authorization for returned state");
            return Err(AuthError::StateMismatch(state.to_string()));
        };

        let flow = OAuthFlowManager::new(config, Arc::clone(&self.http_client));
        let tokens = flow
            .exchange_code(code, state, &verifier, self.clock.now())
            .await?;

        self.token_store.store_tokens(&tokens).await?;
        info!("Authorization completed");
        Ok(())
    }

    /// The authenticated user's address, from the `user` record.
    pub async fn username(&self) -> Result<String> {
        self.token_store
            .user_profile()
            .await?
            .map(|profile| profile.username)
            .ok_or_else(|| AuthError::ProfileMissing {
                location: self.token_store.location(),
            })
    }

    pub async fn set_username(&self, username: impl Into<String>) -> Result<()> {
        self.token_store
            .store_user_profile(&UserProfile {
                username: username.into(),
            })
            .await
    }

    pub fn info(&self) -> AuthInfo {
        AuthInfo {
            location: self.token_store.location(),
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            services: ServiceKind::ALL.to_vec(),
        }
    }
}
