//! Session data and its persistent storage

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::types::{User, UserId};
use crate::error::Error;

/// Storage key of the bearer token
pub const TOKEN_KEY: &str = "authToken";

/// Storage key of the JSON-serialized user
pub const USER_KEY: &str = "user";

/// Session data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token
    pub token: String,

    /// The signed-in user
    pub user: User,
}

impl Session {
    /// Create a new session
    pub fn new(token: String, user: User) -> Self {
        Self { token, user }
    }

    /// Decode the user id out of a legacy `base64("<id>:<email>")` token
    pub fn legacy_user_id(token: &str) -> Option<UserId> {
        let decoded = STANDARD.decode(token.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (id, _email) = decoded.split_once(':')?;
        id.parse().ok()
    }
}

/// Key-value persistence for the session, mirroring browser local storage
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a key
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Write a key
    async fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove a key
    async fn remove(&self, key: &str) -> Result<(), Error>;

    /// Persist a whole session
    async fn save(&self, session: &Session) -> Result<(), Error> {
        self.set(TOKEN_KEY, &session.token).await?;
        self.set(USER_KEY, &serde_json::to_string(&session.user)?).await
    }

    /// Forget the session
    async fn clear(&self) -> Result<(), Error> {
        self.remove(TOKEN_KEY).await?;
        self.remove(USER_KEY).await
    }
}

/// In-process store, lost on exit
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.entries().remove(key);
        Ok(())
    }
}

/// JSON file store; every operation re-reads the file, nothing guards concurrent writers
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store backed by the JSON file at `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>, Error> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => Ok(entries),
                Err(err) => {
                    log::warn!(
                        "session file {} is unreadable, starting empty: {}",
                        self.path.display(),
                        err
                    );
                    Ok(BTreeMap::new())
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), Error> {
        if entries.is_empty() {
            return match tokio::fs::remove_file(&self.path).await {
                Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(entries)?).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.read_entries().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.read_entries().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.read_entries().await?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            first_name: "Ana".into(),
            last_name: "Pérez".into(),
            email: "ana@example.com".into(),
            phone: None,
            verified: true,
            is_admin: false,
        }
    }

    #[test]
    fn test_legacy_user_id() {
        let token = STANDARD.encode("7:ana@example.com");
        assert_eq!(Session::legacy_user_id(&token), Some(7));
        assert_eq!(Session::legacy_user_id("not-base64!"), None);
        assert_eq!(Session::legacy_user_id(&STANDARD.encode("no-colon")), None);
    }

    #[tokio::test]
    async fn test_file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        let session = Session::new("tok".into(), user());
        store.save(&session).await.unwrap();

        assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok"));
        let raw_user = store.get(USER_KEY).await.unwrap().unwrap();
        let stored: User = serde_json::from_str(&raw_user).unwrap();
        assert_eq!(stored, session.user);

        store.clear().await.unwrap();
        assert!(store.get(TOKEN_KEY).await.unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_file_store_tolerates_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileSessionStore::new(path.clone());
        assert!(store.get(TOKEN_KEY).await.unwrap().is_none());
    }
}
