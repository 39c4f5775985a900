//! Session-scoped key/value storage.
//!
//! Mirrors the browser's per-session storage: string keys, string values,
//! gone when the session ends. Two backends: an in-memory map that clones
//! share (two tabs over one store), and SQLite rows scoped by session id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};

use crate::database::connection::Database;
use crate::types::errors::StorageError;

/// Operations every session store supports.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;

    /// Read-modify-write of one key. `f` receives the current value and returns
    /// the new one, or `None` to leave the key untouched.
    ///
    /// The default is a plain get followed by a set; backends that can make it
    /// atomic override it.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Option<String>,
    ) -> Result<(), StorageError> {
        let current = self.get_item(key)?;
        match f(current) {
            Some(value) => self.set_item(key, &value),
            None => Ok(()),
        }
    }
}

// === MemorySessionStorage ===

#[derive(Debug, Default)]
struct MemoryInner {
    items: HashMap<String, String>,
    quota_bytes: Option<usize>,
    disabled: bool,
}

impl MemoryInner {
    fn used_bytes_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    fn check_enabled(&self) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable("storage is disabled".to_string()));
        }
        Ok(())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_enabled()?;
        if let Some(limit) = self.quota_bytes {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// In-memory session storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that refuses writes past `bytes` (keys plus values).
    pub fn with_quota(bytes: usize) -> Self {
        let storage = Self::default();
        if let Ok(mut inner) = storage.inner.lock() {
            inner.quota_bytes = Some(bytes);
        }
        storage
    }

    /// Simulates storage being blocked: every call fails with `Unavailable`.
    pub fn set_disabled(&self, disabled: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.disabled = disabled;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryInner>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.lock()?;
        inner.check_enabled()?;
        Ok(inner.items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.put(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        inner.check_enabled()?;
        inner.items.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        inner.check_enabled()?;
        inner.items.clear();
        Ok(())
    }

    /// Holds the lock across the read and the write.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Option<String>,
    ) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        inner.check_enabled()?;
        let current = inner.items.get(key).cloned();
        match f(current) {
            Some(value) => inner.put(key, &value),
            None => Ok(()),
        }
    }
}

// === SqliteSessionStorage ===

/// Session storage persisted in SQLite, scoped to one browser session.
///
/// Survives reloads of the same session; [`SqliteSessionStorage::end_session`]
/// drops every row of the session.
#[derive(Clone)]
pub struct SqliteSessionStorage {
    db: Arc<Database>,
    session_id: String,
}

impl SqliteSessionStorage {
    /// Binds storage to `session_id`, registering the session if it is new.
    pub fn open(db: Arc<Database>, session_id: &str) -> Result<Self, StorageError> {
        db.connection().execute(
            "INSERT OR IGNORE INTO browser_sessions (session_id, started_at) VALUES (?1, ?2)",
            params![session_id, Self::now()],
        )?;
        Ok(Self {
            db,
            session_id: session_id.to_string(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Ends the session: its rows and its registration are deleted.
    pub fn end_session(&self) -> Result<(), StorageError> {
        let conn = self.db.connection();
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM session_storage WHERE session_id = ?1",
            params![self.session_id],
        )?;
        tx.execute(
            "DELETE FROM browser_sessions WHERE session_id = ?1",
            params![self.session_id],
        )?;
        tx.commit()?;
        log::info!("Ended browser session {}", self.session_id);
        Ok(())
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    fn read(conn: &rusqlite::Connection, session_id: &str, key: &str) -> Result<Option<String>, StorageError> {
        let value = conn
            .query_row(
                "SELECT value FROM session_storage WHERE session_id = ?1 AND key = ?2",
                params![session_id, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(conn: &rusqlite::Connection, session_id: &str, key: &str, value: &str) -> Result<(), StorageError> {
        let affected = conn.execute(
            "INSERT INTO session_storage (session_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(session_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![session_id, key, value, Self::now()],
        );
        match affected {
            Ok(_) => Ok(()),
            // The session row is gone: the session was ended elsewhere.
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::Unavailable(format!(
                    "session {} has ended",
                    session_id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStorage for SqliteSessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::read(self.db.connection(), &self.session_id, key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::write(self.db.connection(), &self.session_id, key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.db.connection().execute(
            "DELETE FROM session_storage WHERE session_id = ?1 AND key = ?2",
            params![self.session_id, key],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.db.connection().execute(
            "DELETE FROM session_storage WHERE session_id = ?1",
            params![self.session_id],
        )?;
        Ok(())
    }

    /// Runs inside an IMMEDIATE transaction so concurrent writers serialize.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Option<String>,
    ) -> Result<(), StorageError> {
        let conn = self.db.connection();
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        let current = Self::read(&tx, &self.session_id, key)?;
        if let Some(value) = f(current) {
            Self::write(&tx, &self.session_id, key, &value)?;
        }
        tx.commit()?;
        Ok(())
    }
}
