use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::auth::token::Credential;
use crate::error::{AppError, Result};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const TOKEN_EXPIRY_KEY: &str = "token_expiry";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const CODE_VERIFIER_KEY: &str = "code_verifier";

/// Flat string key-value store backing the persisted auth state.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;

    /// Applies every change or none of them. `Some` sets a key, `None` removes it.
    fn apply(&self, changes: &[(&str, Option<&str>)]) -> Result<()>;
}

fn apply_changes(values: &mut HashMap<String, String>, changes: &[(&str, Option<&str>)]) {
    for (key, value) in changes {
        match value {
            Some(value) => {
                values.insert(key.to_string(), value.to_string());
            }
            None => {
                values.remove(*key);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| AppError::Storage("store lock poisoned".into()))
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.values)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.values)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.values)?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        lock(&self.values)?.clear();
        Ok(())
    }

    fn apply(&self, changes: &[(&str, Option<&str>)]) -> Result<()> {
        apply_changes(&mut *lock(&self.values)?, changes);
        Ok(())
    }
}

/// JSON object on disk; every write rewrites the whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut HashMap<String, String>)) -> Result<()> {
        let _guard = lock(&self.guard)?;
        let mut values = self.read()?;
        f(&mut values);
        self.write(&values)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = lock(&self.guard)?;
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }

    fn clear(&self) -> Result<()> {
        self.update(|values| values.clear())
    }

    fn apply(&self, changes: &[(&str, Option<&str>)]) -> Result<()> {
        self.update(|values| apply_changes(values, changes))
    }
}

/// Typed view of the credential and verifier keys.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the stored credential, or `None` when no access token is persisted.
    /// A missing or unreadable expiry is treated as already expired.
    pub fn load(&self) -> Result<Option<Credential>> {
        let Some(access_token) = self.store.get(ACCESS_TOKEN_KEY)? else {
            return Ok(None);
        };

        let expires_at = self
            .store
            .get(TOKEN_EXPIRY_KEY)?
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or(DateTime::UNIX_EPOCH);

        let refresh_token = self.store.get(REFRESH_TOKEN_KEY)?;

        Ok(Some(Credential {
            access_token,
            refresh_token,
            expires_at,
        }))
    }

    /// Writes the credential in one batch. Without a refresh token the stored
    /// one stays in place.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        let expiry = credential.expires_at.timestamp_millis().to_string();
        let mut changes = vec![
            (ACCESS_TOKEN_KEY, Some(credential.access_token.as_str())),
            (TOKEN_EXPIRY_KEY, Some(expiry.as_str())),
        ];
        if let Some(refresh_token) = &credential.refresh_token {
            changes.push((REFRESH_TOKEN_KEY, Some(refresh_token.as_str())));
        }
        self.store.apply(&changes)?;
        debug!("Tokens saved, access token expires at {}", credential.expires_at);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.store.apply(&[
            (ACCESS_TOKEN_KEY, None),
            (TOKEN_EXPIRY_KEY, None),
            (REFRESH_TOKEN_KEY, None),
        ])?;
        debug!("Tokens cleared");
        Ok(())
    }

    pub fn store_verifier(&self, verifier: &str) -> Result<()> {
        self.store.set(CODE_VERIFIER_KEY, verifier)
    }

    /// Removes and returns the pending verifier.
    pub fn take_verifier(&self) -> Result<Option<String>> {
        let verifier = self.store.get(CODE_VERIFIER_KEY)?;
        if verifier.is_some() {
            self.store.remove(CODE_VERIFIER_KEY)?;
        }
        Ok(verifier)
    }
}
