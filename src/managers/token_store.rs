//! Token Store.
//!
//! Issues opaque return tokens bound to anchor URLs, resolves them, and
//! sweeps out old ones. Storage failures never reach the caller: a failed
//! write just means the token will not resolve later.

use std::sync::Arc;

use uuid::Uuid;

use crate::managers::token_repository::TokenRepository;
use crate::services::clock::Clock;
use crate::types::token::TokenRecord;

/// Attempts at finding a token not already in the store.
const MAX_TOKEN_ATTEMPTS: usize = 4;

/// Trait defining token store operations.
pub trait TokenStoreTrait {
    fn issue_token(&self, url: &str) -> String;
    fn resolve_token(&self, token: &str) -> Option<String>;
    fn purge_expired(&self, ttl_ms: i64) -> usize;
}

pub struct TokenStore<T: TokenRepository> {
    repository: T,
    clock: Arc<dyn Clock>,
}

impl<T: TokenRepository> TokenStore<T> {
    pub fn new(repository: T, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn repository(&self) -> &T {
        &self.repository
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Random base-36 part followed by the base-36 issue time.
    fn make_token(now_ms: i64) -> String {
        // Bytes 8..16 of a v4 UUID: 62 random bits, the top two are the fixed variant.
        let bytes = Uuid::new_v4().into_bytes();
        let random = u64::from_be_bytes([
            bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
        ]);
        format!("{}{}", to_base36(u128::from(random)), to_base36(now_ms.max(0) as u128))
    }

    fn fresh_token(&self, now_ms: i64) -> String {
        let mut token = Self::make_token(now_ms);
        for _ in 1..MAX_TOKEN_ATTEMPTS {
            match self.repository.get(&token) {
                Ok(Some(_)) => token = Self::make_token(now_ms),
                _ => break,
            }
        }
        token
    }
}

impl<T: TokenRepository> TokenStoreTrait for TokenStore<T> {
    /// Mints a token for `url` and records it with the current time.
    ///
    /// The token is returned even when the write fails; it then simply does
    /// not resolve.
    fn issue_token(&self, url: &str) -> String {
        let now = self.clock.now_ms();
        let token = self.fresh_token(now);
        if let Err(e) = self.repository.set(&token, TokenRecord::new(url, now)) {
            log::warn!("Return token for {} not persisted: {}", url, e);
        } else {
            log::debug!("Issued return token {} -> {}", token, url);
        }
        token
    }

    /// Looks the token up. Unknown, purged and unreadable tokens resolve to `None`.
    ///
    /// Resolution does not consume the token.
    fn resolve_token(&self, token: &str) -> Option<String> {
        match self.repository.get(token) {
            Ok(record) => record.map(|r| r.url).filter(|url| !url.is_empty()),
            Err(e) => {
                log::warn!("Return token {} not readable: {}", token, e);
                None
            }
        }
    }

    /// Removes every record at least `ttl_ms` old. Records past the TTL stay
    /// resolvable until this runs.
    fn purge_expired(&self, ttl_ms: i64) -> usize {
        match self.repository.purge(self.clock.now_ms(), ttl_ms) {
            Ok(removed) => {
                if removed > 0 {
                    log::info!("Purged {} expired return token(s)", removed);
                }
                removed
            }
            Err(e) => {
                log::warn!("Return token purge skipped: {}", e);
                0
            }
        }
    }
}

fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
