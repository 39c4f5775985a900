use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A return anchor: the URL a token resolves to and when it was issued.
///
/// Serialized as `{ "url": "...", "ts": <unix ms> }`. Missing fields default so
/// that a damaged entry is still readable; it is removed by the next purge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub ts: i64,
}

impl TokenRecord {
    pub fn new(url: impl Into<String>, ts: i64) -> Self {
        Self { url: url.into(), ts }
    }

    /// Age in milliseconds at `now_ms`.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.ts)
    }

    /// Whether a purge at `now_ms` removes this record.
    pub fn is_expired(&self, now_ms: i64, ttl_ms: i64) -> bool {
        self.ts <= 0 || self.age_ms(now_ms) >= ttl_ms
    }
}

/// The persisted token map, keyed by token.
pub type TokenMap = BTreeMap<String, TokenRecord>;
