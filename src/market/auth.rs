//! Bearer token providers and the persisted token store.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::StoreError;

/// Store key holding the admin bearer token.
pub const TOKEN_KEY: &str = "token";

/// Supplies the bearer token for authenticated requests.
///
/// Called once per request. Returning `None` sends the request without an
/// `Authorization` header and lets the server reject it.
pub trait TokenProvider: Send + Sync + Debug {
    /// Current bearer token, if any.
    fn bearer_token(&self) -> Option<String>;
}

/// No credentials at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenProvider for NoToken {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Fixed token, typically from `ADMIN_TOKEN`.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Token read from the [`TokenStore`] on every request.
#[derive(Debug, Clone)]
pub struct StoredToken {
    store: TokenStore,
}

impl StoredToken {
    /// Read tokens from `store`.
    pub fn new(store: TokenStore) -> Self {
        Self { store }
    }
}

impl TokenProvider for StoredToken {
    fn bearer_token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!(path = %self.store.path().display(), "Failed to read token store: {}", e);
                None
            }
        }
    }
}

/// Pick the token provider for this configuration.
pub fn provider_from_config(config: &Config) -> Arc<dyn TokenProvider> {
    if let Some(token) = &config.admin_token {
        debug!("Using ADMIN_TOKEN for authentication");
        return Arc::new(StaticToken::new(token.clone()));
    }

    match config.token_store_path() {
        Some(path) => {
            debug!(path = %path.display(), "Using persisted token store");
            Arc::new(StoredToken::new(TokenStore::new(path)))
        }
        None => {
            warn!("No token source available; requests will be unauthenticated");
            Arc::new(NoToken)
        }
    }
}

/// Small persisted key-value store backed by a JSON object file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for this configuration.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        config
            .token_store_path()
            .map(Self::new)
            .ok_or(StoreError::NoPath)
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }

    /// Value for `key`.
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    /// Set `key` to `value`.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.load()?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.save(&entries)?;
        }
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("store.json"));

        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);

        store.set(TOKEN_KEY, "abc").unwrap();
        store.set("theme", "dark").unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));

        assert!(store.remove(TOKEN_KEY).unwrap());
        assert!(!store.remove(TOKEN_KEY).unwrap());
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn stored_token_is_read_at_call_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("store.json"));
        let provider = StoredToken::new(store.clone());

        assert_eq!(provider.bearer_token(), None);
        store.set(TOKEN_KEY, "first").unwrap();
        assert_eq!(provider.bearer_token().as_deref(), Some("first"));
        store.set(TOKEN_KEY, "second").unwrap();
        assert_eq!(provider.bearer_token().as_deref(), Some("second"));
    }

    #[test]
    fn corrupt_store_yields_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let provider = StoredToken::new(TokenStore::new(path));
        assert_eq!(provider.bearer_token(), None);
    }

    #[test]
    fn static_token_wins_over_store() {
        let config = Config {
            admin_token: Some("env-token".to_string()),
            ..Config::default()
        };
        let provider = provider_from_config(&config);
        assert_eq!(provider.bearer_token().as_deref(), Some("env-token"));
        assert!(!format!("{:?}", provider).contains("env-token"));
    }
}
