use serde::{Deserialize, Serialize};

/// Session-storage key of the token map.
pub const DEFAULT_STORAGE_KEY: &str = "nav:returnTokens:v1";
/// Query parameter carrying the return token.
pub const DEFAULT_QUERY_PARAM: &str = "rtk";
/// 24 hours.
pub const DEFAULT_TOKEN_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Tunables of the return-navigation service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NavigationSettings {
    pub storage_key: String,
    pub query_param: String,
    pub token_ttl_ms: i64,
    /// Destination of `go_back_or` / `back_from_route` when the caller gives none.
    pub default_fallback: String,
    /// Run one purge sweep when the service starts.
    pub purge_on_startup: bool,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            query_param: DEFAULT_QUERY_PARAM.to_string(),
            token_ttl_ms: DEFAULT_TOKEN_TTL_MS,
            default_fallback: "/".to_string(),
            purge_on_startup: true,
        }
    }
}
