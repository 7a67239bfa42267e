//! Durable persistence for the session token pair.
//!
//! Tokens are kept as two named string values behind the `Storage`
//! trait. `TokenStore` layers the pair invariant on top: a read only
//! reports a session when both tokens are present, so an interrupted
//! write can never yield a usable access token without its refresh
//! counterpart.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "token";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Token file name inside the data directory
const TOKEN_FILE: &str = "tokens.json";

/// Failures of the durable key-value layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data is not readable: {0}")]
    Format(#[from] serde_json::Error),

    #[error("no platform data directory available")]
    NoDataDir,
}

/// Durable key-value persistence for session credentials.
///
/// Implementations may fail with `StorageError`; callers treat a
/// failed read as "absent".
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// File-backed storage: one JSON document under the app data directory.
///
/// Writes go through a temp file and rename, so a torn write leaves
/// either the old document or the new one, never a partial file.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage rooted at the given data directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(TOKEN_FILE))
    }

    fn read_map(&self) -> Result<HashMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.read_map()?;
        if map.remove(key).is_some() || self.path.exists() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// In-memory storage for tests and embedders that manage persistence
/// themselves.
#[derive(Default, Clone)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// The access/refresh token pair minted by login and session renewal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Typed view over the two token keys.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The stored pair, or `None` unless both tokens are present.
    pub async fn get(&self) -> Result<Option<TokenPair>, StorageError> {
        let access = self.storage.get(ACCESS_TOKEN_KEY).await?;
        let refresh = self.storage.get(REFRESH_TOKEN_KEY).await?;
        match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => Ok(Some(TokenPair {
                access_token,
                refresh_token,
            })),
            (None, None) => Ok(None),
            _ => {
                warn!("found partial token pair, treating as no session");
                Ok(None)
            }
        }
    }

    /// The access token alone, with read failures treated as absent.
    pub async fn access_token(&self) -> Option<String> {
        match self.get().await {
            Ok(pair) => pair.map(|p| p.access_token),
            Err(e) => {
                warn!(error = %e, "token read failed, sending request unauthenticated");
                None
            }
        }
    }

    /// Persist a pair, access token first.
    pub async fn set(&self, pair: &TokenPair) -> Result<(), StorageError> {
        self.storage.set(ACCESS_TOKEN_KEY, &pair.access_token).await?;
        self.storage.set(REFRESH_TOKEN_KEY, &pair.refresh_token).await?;
        debug!("token pair persisted");
        Ok(())
    }

    /// Remove both tokens, refresh token first so no interleaving
    /// leaves an access token with a live refresh counterpart.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(REFRESH_TOKEN_KEY).await?;
        self.storage.remove(ACCESS_TOKEN_KEY).await?;
        debug!("token pair cleared");
        Ok(())
    }
}
