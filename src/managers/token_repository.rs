//! Storage seam for return tokens.
//!
//! [`TokenRepository`] is what the token store talks to. The production
//! implementation keeps the whole map as one JSON document in session
//! storage; [`InMemoryTokenRepository`] is a plain map for tests.

use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::services::session_storage::SessionStorage;
use crate::types::errors::StorageError;
use crate::types::token::{TokenMap, TokenRecord};

/// Trait defining token persistence operations.
pub trait TokenRepository {
    fn get(&self, token: &str) -> Result<Option<TokenRecord>, StorageError>;
    fn set(&self, token: &str, record: TokenRecord) -> Result<(), StorageError>;
    /// Removes records expired at `now_ms`; returns how many went.
    fn purge(&self, now_ms: i64, ttl_ms: i64) -> Result<usize, StorageError>;
    fn all(&self) -> Result<TokenMap, StorageError>;
}

// === SessionTokenRepository ===

/// Token map stored as `{ token: { url, ts } }` JSON under a single key.
///
/// Writes are whole-map read-modify-write through [`SessionStorage::update`].
pub struct SessionTokenRepository<S: SessionStorage> {
    storage: S,
    key: String,
}

impl<S: SessionStorage> SessionTokenRepository<S> {
    pub fn new(storage: S, key: &str) -> Self {
        Self {
            storage,
            key: key.to_string(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Parses the stored map. Unreadable documents read as empty and
    /// unreadable entries are skipped.
    fn decode(raw: Option<&str>) -> TokenMap {
        let Some(raw) = raw else {
            return TokenMap::new();
        };
        let entries: serde_json::Map<String, Value> = match serde_json::from_str(raw) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Discarding unreadable token map: {}", e);
                return TokenMap::new();
            }
        };
        entries
            .into_iter()
            .filter_map(|(token, value)| {
                serde_json::from_value::<TokenRecord>(value)
                    .ok()
                    .map(|record| (token, record))
            })
            .collect()
    }

    fn read_map(&self) -> Result<TokenMap, StorageError> {
        let raw = self.storage.get_item(&self.key)?;
        Ok(Self::decode(raw.as_deref()))
    }

    /// Applies `edit` to the stored map; writes only when it reports a change.
    fn modify<F>(&self, mut edit: F) -> Result<(), StorageError>
    where
        F: FnMut(&mut TokenMap) -> bool,
    {
        let mut failure = None;
        self.storage.update(&self.key, &mut |raw| {
            let mut map = Self::decode(raw.as_deref());
            if !edit(&mut map) {
                return None;
            }
            match serde_json::to_string(&map) {
                Ok(json) => Some(json),
                Err(e) => {
                    failure = Some(StorageError::Serialization(e.to_string()));
                    None
                }
            }
        })?;
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<S: SessionStorage> TokenRepository for SessionTokenRepository<S> {
    fn get(&self, token: &str) -> Result<Option<TokenRecord>, StorageError> {
        Ok(self.read_map()?.remove(token))
    }

    fn set(&self, token: &str, record: TokenRecord) -> Result<(), StorageError> {
        self.modify(|map| {
            map.insert(token.to_string(), record.clone());
            true
        })
    }

    fn purge(&self, now_ms: i64, ttl_ms: i64) -> Result<usize, StorageError> {
        let mut removed = 0;
        self.modify(|map| {
            let before = map.len();
            map.retain(|_, record| !record.is_expired(now_ms, ttl_ms));
            removed = before - map.len();
            removed > 0
        })?;
        Ok(removed)
    }

    fn all(&self) -> Result<TokenMap, StorageError> {
        self.read_map()
    }
}

// === InMemoryTokenRepository ===

/// Plain in-memory token map.
#[derive(Debug, Default)]
pub struct InMemoryTokenRepository {
    tokens: Mutex<TokenMap>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, TokenMap>, StorageError> {
        self.tokens
            .lock()
            .map_err(|_| StorageError::Unavailable("token map lock poisoned".to_string()))
    }
}

impl TokenRepository for InMemoryTokenRepository {
    fn get(&self, token: &str) -> Result<Option<TokenRecord>, StorageError> {
        Ok(self.lock()?.get(token).cloned())
    }

    fn set(&self, token: &str, record: TokenRecord) -> Result<(), StorageError> {
        self.lock()?.insert(token.to_string(), record);
        Ok(())
    }

    fn purge(&self, now_ms: i64, ttl_ms: i64) -> Result<usize, StorageError> {
        let mut tokens = self.lock()?;
        let before = tokens.len();
        tokens.retain(|_, record| !record.is_expired(now_ms, ttl_ms));
        Ok(before - tokens.len())
    }

    fn all(&self) -> Result<TokenMap, StorageError> {
        Ok(self.lock()?.clone())
    }
}
