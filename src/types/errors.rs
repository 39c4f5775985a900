use thiserror::Error;

// === StorageError ===

/// Errors raised by the session-scoped key/value store.
///
/// None of these reach the user: the token store logs and swallows them,
/// which degrades to "no return anchor available".
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    /// Writing the value would exceed the store's byte quota.
    #[error("Session storage quota exceeded: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { needed: usize, limit: usize },
    /// Storage is disabled or blocked.
    #[error("Session storage unavailable: {0}")]
    Unavailable(String),
    /// A stored value could not be serialized or parsed.
    #[error("Session storage serialization error: {0}")]
    Serialization(String),
    /// The backing database failed.
    #[error("Session storage database error: {0}")]
    DatabaseError(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

// === UrlError ===

/// Errors raised while parsing an application URL.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UrlError {
    /// The URL could not be parsed against the application root.
    #[error("Malformed URL '{url}': {reason}")]
    Malformed { url: String, reason: String },
}

// === NavigationError ===

/// Errors surfaced by the router when a navigation does not complete.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavigationError {
    /// A route guard refused the destination.
    #[error("Navigation rejected: {0}")]
    Rejected(String),
    /// The target could not be turned into a URL.
    #[error("Invalid navigation target: {0}")]
    InvalidTarget(String),
    /// The destination URL is malformed.
    #[error(transparent)]
    Url(#[from] UrlError),
}

// === SettingsError ===

/// Errors related to navigation settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === AppError ===

/// Errors raised while wiring the application together.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}
