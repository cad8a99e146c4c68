//! Credential storage in a well-known directory
//!
//! Each key is stored as `<dir>/<key>.json`. This is the layout users drop
//! their OAuth client secrets into (`credentials.json`), and where tokens
//! (`token.json`) and the user profile (`user.json`) are persisted.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SecureStore,
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Directory-backed `SecureStore`
#[derive(Debug, Clone)]
pub struct DirectorySecretStore {
    root: PathBuf,
}

impl DirectorySecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<config_dir>/drivepath/auth`, falling back to `./.drivepath/auth`
    pub fn default_location() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("drivepath"))
            .unwrap_or_else(|| PathBuf::from(".drivepath"))
            .join("auth")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(BridgeError::OperationFailed(format!(
                "Invalid secret key: {:?}",
                key
            )));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl SecureStore for DirectorySecretStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).await?;
        fs::write(&path, value).await?;
        restrict_permissions(&path).await?;
        debug!(key = key, "Stored secret in credentials directory");
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(key = key, "Secret not found in credentials directory");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectorySecretStore::new(dir.path().join("auth"));

        assert_eq!(store.get_secret("token").await.unwrap(), None);

        store.set_secret("token", br#"{"a":1}"#).await.unwrap();
        assert!(dir.path().join("auth").join("token.json").exists());
        assert_eq!(
            store.get_secret("token").await.unwrap(),
            Some(br#"{"a":1}"#.to_vec())
        );
        assert!(store.has_secret("token").await.unwrap());

        store.delete_secret("token").await.unwrap();
        store.delete_secret("token").await.unwrap();
        assert!(!store.has_secret("token").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectorySecretStore::new(dir.path());

        assert!(store.set_secret("../escape", b"x").await.is_err());
        assert!(store.get_secret("").await.is_err());
    }

    #[test]
    fn test_default_location_ends_with_auth() {
        let location = DirectorySecretStore::default_location();
        assert!(location.ends_with("auth"));
        assert!(location.parent().unwrap().ends_with("drivepath"));
    }
}
