use serde::{Deserialize, Serialize};

use super::navigation::QueryParams;

/// The activated route as seen by a page: its URL and parsed query parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSnapshot {
    pub url: String,
    pub path: String,
    pub query_params: QueryParams,
}

impl RouteSnapshot {
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query_params.get(key).map(String::as_str)
    }
}

/// Lifecycle events emitted by the router, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterEvent {
    NavigationStart {
        id: u64,
        url: String,
    },
    /// Completed navigation. Only this event feeds the history tracker.
    NavigationEnd {
        id: u64,
        url: String,
        url_after_redirects: String,
    },
    NavigationCancel {
        id: u64,
        url: String,
        reason: String,
    },
    NavigationError {
        id: u64,
        url: String,
        error: String,
    },
}

impl RouterEvent {
    pub fn id(&self) -> u64 {
        match self {
            RouterEvent::NavigationStart { id, .. }
            | RouterEvent::NavigationEnd { id, .. }
            | RouterEvent::NavigationCancel { id, .. }
            | RouterEvent::NavigationError { id, .. } => *id,
        }
    }
}
