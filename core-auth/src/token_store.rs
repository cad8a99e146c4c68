//! Credential Storage
//!
//! Persists the three credential records behind a [`SecureStore`]:
//!
//! | key | contents |
//! |-----|----------|
//! | `credentials` | OAuth client secrets (`installed` or `web` JSON) |
//! | `token` | access/refresh tokens in authorized-user JSON |
//! | `user` | `{"username": ...}` |
//!
//! With the desktop directory store these are `credentials.json`,
//! `token.json` and `user.json` in the auth directory.
//!
//! Token values are never logged.

use crate::error::{AuthError, Result};
use crate::types::{ClientSecrets, OAuthTokens, UserProfile};
use bridge_traits::storage::SecureStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const CREDENTIALS_KEY: &str = "credentials";
pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Typed access to the credential records
#[derive(Clone)]
pub struct TokenStore {
    secure_store: Arc<dyn SecureStore>,
}

impl TokenStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        Self { secure_store }
    }

    /// Where the records live, for error messages
    pub fn location(&self) -> String {
        self.secure_store.location()
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.secure_store.get_secret(key).await.map_err(|e| {
            warn!(key, error = %e, "Failed to read from secure storage");
            AuthError::SecureStorageUnavailable(e.to_string())
        })
    }

    async fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        self.secure_store.set_secret(key, value).await.map_err(|e| {
            warn!(key, error = %e, "Failed to write to secure storage");
            AuthError::SecureStorageUnavailable(e.to_string())
        })
    }

    /// Load the OAuth client secrets, if present.
    pub async fn client_secrets(&self) -> Result<Option<ClientSecrets>> {
        match self.read(CREDENTIALS_KEY).await? {
            Some(data) => ClientSecrets::from_json(&data).map(Some),
            None => {
                debug!("No client secrets in storage");
                Ok(None)
            }
        }
    }

    /// Store OAuth client secrets (raw console JSON).
    pub async fn store_client_secrets(&self, json: &[u8]) -> Result<()> {
        // Reject anything we could not read back
        ClientSecrets::from_json(json)?;
        self.write(CREDENTIALS_KEY, json).await?;
        info!("Client secrets stored");
        Ok(())
    }

    /// Persist tokens, replacing any previous set.
    pub async fn store_tokens(&self, tokens: &OAuthTokens) -> Result<()> {
        let json = serde_json::to_vec_pretty(tokens)
            .map_err(|e| AuthError::Other(format!("Failed to serialize tokens: {}", e)))?;

        self.write(TOKEN_KEY, &json).await?;

        info!(
            has_refresh_token = tokens.can_refresh(),
            "Tokens stored securely"
        );
        Ok(())
    }

    /// Load persisted tokens.
    ///
    /// A record that no longer parses is deleted and reported as
    /// `TokenCorrupted`, so the next call starts a fresh authorization.
    pub async fn retrieve_tokens(&self) -> Result<Option<OAuthTokens>> {
        let Some(data) = self.read(TOKEN_KEY).await? else {
            debug!("No tokens found in storage");
            return Ok(None);
        };

        match serde_json::from_slice::<OAuthTokens>(&data) {
            Ok(tokens) => {
                debug!(
                    has_refresh_token = tokens.can_refresh(),
                    "Tokens retrieved"
                );
                Ok(Some(tokens))
            }
            Err(e) => {
                warn!(error = %e, "Stored tokens are corrupted, discarding them");

                if let Err(delete_err) = self.secure_store.delete_secret(TOKEN_KEY).await {
                    warn!(error = %delete_err, "Failed to delete corrupted token data");
                }

                Err(AuthError::TokenCorrupted {
                    key: TOKEN_KEY.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Remove persisted tokens. Idempotent.
    pub async fn delete_tokens(&self) -> Result<()> {
        self.secure_store
            .delete_secret(TOKEN_KEY)
            .await
            .map_err(|e| AuthError::SecureStorageUnavailable(e.to_string()))?;
        info!("Tokens deleted");
        Ok(())
    }

    pub async fn user_profile(&self) -> Result<Option<UserProfile>> {
        let Some(data) = self.read(USER_KEY).await? else {
            return Ok(None);
        };

        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| AuthError::TokenCorrupted {
                key: USER_KEY.to_string(),
                reason: e.to_string(),
            })
    }

    pub async fn store_user_profile(&self, profile: &UserProfile) -> Result<()> {
        let json = serde_json::to_vec(profile)
            .map_err(|e| AuthError::Other(format!("Failed to serialize user profile: {}", e)))?;
        self.write(USER_KEY, &json).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory `SecureStore` shared by the crate's unit tests
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        values: Mutex<HashMap<String, Vec<u8>>>,
        pub(crate) fail: bool,
    }

    impl MemoryStore {
        pub(crate) fn with(entries: &[(&str, &str)]) -> Self {
            let store = Self::default();
            {
                let mut values = store.values.lock().unwrap();
                for (key, value) in entries {
                    values.insert(key.to_string(), value.as_bytes().to_vec());
                }
            }
            store
        }

        pub(crate) fn raw(&self, key: &str) -> Option<Vec<u8>> {
            self.values.lock().unwrap().get(key).cloned()
        }
    }

    #[async_trait]
    impl SecureStore for MemoryStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            if self.fail {
                return Err(BridgeError::OperationFailed("store offline".to_string()));
            }
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            if self.fail {
                return Err(BridgeError::OperationFailed("store offline".to_string()));
            }
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }

        fn location(&self) -> String {
            "memory://auth".to_string()
        }
    }

    #[tokio::test]
    async fn test_store_and_retrieve_tokens() {
        let memory = Arc::new(MemoryStore::default());
        let store = TokenStore::new(memory.clone());

        assert!(store.retrieve_tokens().await.unwrap().is_none());

        let tokens = OAuthTokens::new(
            "access".to_string(),
            Some("refresh".to_string()),
            3600,
            Utc::now(),
        );
        store.store_tokens(&tokens).await.unwrap();

        let raw = String::from_utf8(memory.raw(TOKEN_KEY).unwrap()).unwrap();
        assert!(raw.contains("\"token\""));

        let loaded = store.retrieve_tokens().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "access");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh"));

        store.delete_tokens().await.unwrap();
        assert!(store.retrieve_tokens().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupted_tokens_are_discarded() {
        let memory = Arc::new(MemoryStore::with(&[(TOKEN_KEY, "not json")]));
        let store = TokenStore::new(memory.clone());

        let err = store.retrieve_tokens().await.unwrap_err();
        assert!(matches!(err, AuthError::TokenCorrupted { key, .. } if key == TOKEN_KEY));
        assert!(memory.raw(TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_client_secrets_and_user_profile() {
        let store = TokenStore::new(Arc::new(MemoryStore::with(&[
            (CREDENTIALS_KEY, r#"{"installed":{"client_id":"id"}}"#),
            (USER_KEY, r#"{"username":"me@example.com"}"#),
        ])));

        let secrets = store.client_secrets().await.unwrap().unwrap();
        assert_eq!(secrets.client_id, "id");

        let profile = store.user_profile().await.unwrap().unwrap();
        assert_eq!(profile.username, "me@example.com");
    }

    #[tokio::test]
    async fn test_store_client_secrets_validates() {
        let store = TokenStore::new(Arc::new(MemoryStore::default()));
        assert!(store.store_client_secrets(b"{}").await.is_err());
        assert!(store
            .store_client_secrets(br#"{"web":{"client_id":"id"}}"#)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_storage_failure_maps_to_unavailable() {
        let store = TokenStore::new(Arc::new(MemoryStore {
            fail: true,
            ..MemoryStore::default()
        }));

        let err = store.retrieve_tokens().await.unwrap_err();
        assert!(matches!(err, AuthError::SecureStorageUnavailable(_)));
    }
}
