//! In-process router.
//!
//! Keeps a browser-like history (entries with per-entry state, push/replace,
//! back), applies redirects and prefix guards, and emits lifecycle events.
//! Navigations complete synchronously; a navigation stays "in flight" until
//! its events have been drained.

use crate::services::query::{self, AppUrl};
use crate::services::router::Router;
use crate::types::errors::NavigationError;
use crate::types::navigation::{NavigationExtras, NavigationState, QueryParams, QueryParamsHandling};
use crate::types::route::{RouteSnapshot, RouterEvent};

#[derive(Debug, Clone, PartialEq)]
struct HistoryEntry {
    url: String,
    state: Option<NavigationState>,
}

#[derive(Debug, Clone)]
struct Redirect {
    from: String,
    to: String,
}

#[derive(Debug, Clone)]
struct Guard {
    prefix: String,
    reason: String,
}

#[derive(Debug)]
pub struct MemoryRouter {
    entries: Vec<HistoryEntry>,
    index: usize,
    redirects: Vec<Redirect>,
    guards: Vec<Guard>,
    in_flight: Option<NavigationState>,
    events: Vec<RouterEvent>,
    next_id: u64,
}

impl MemoryRouter {
    /// Starts at `initial_url`, emitting the initial navigation's events.
    pub fn new(initial_url: &str) -> Result<Self, NavigationError> {
        Self::restore(initial_url, None)
    }

    /// Starts at `url` with `state` on the first entry, as after a page reload.
    pub fn restore(url: &str, state: Option<NavigationState>) -> Result<Self, NavigationError> {
        let href = AppUrl::parse(url)?.to_href();
        let mut router = Self {
            entries: vec![HistoryEntry {
                url: href.clone(),
                state: state.clone(),
            }],
            index: 0,
            redirects: Vec::new(),
            guards: Vec::new(),
            in_flight: state,
            events: Vec::new(),
            next_id: 1,
        };
        let id = router.next_id();
        router.events.push(RouterEvent::NavigationStart {
            id,
            url: href.clone(),
        });
        router.events.push(RouterEvent::NavigationEnd {
            id,
            url: href.clone(),
            url_after_redirects: href,
        });
        Ok(router)
    }

    /// Navigations to `from` (exact path) land on `to`, keeping the query.
    pub fn add_redirect(&mut self, from: &str, to: &str) {
        self.redirects.push(Redirect {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    /// Navigations to paths starting with `prefix` are cancelled.
    pub fn add_guard(&mut self, prefix: &str, reason: &str) {
        self.guards.push(Guard {
            prefix: prefix.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Number of browser history entries.
    pub fn history_len(&self) -> usize {
        self.entries.len()
    }

    /// URLs of all browser history entries, oldest first.
    pub fn history_urls(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.url.as_str()).collect()
    }

    /// Browser back button: moves to the previous entry and restores its state.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        let entry = self.entries[self.index].clone();
        let id = self.next_id();
        self.events.push(RouterEvent::NavigationStart {
            id,
            url: entry.url.clone(),
        });
        self.in_flight = entry.state;
        self.events.push(RouterEvent::NavigationEnd {
            id,
            url: entry.url.clone(),
            url_after_redirects: entry.url,
        });
        true
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn current(&self) -> &HistoryEntry {
        &self.entries[self.index]
    }

    fn apply_redirects(&self, url: &str) -> Result<String, NavigationError> {
        let mut parsed = AppUrl::parse(url)?;
        if let Some(redirect) = self.redirects.iter().find(|r| r.from == parsed.path()) {
            parsed.set_path(&redirect.to);
        }
        Ok(parsed.to_href())
    }

    fn commit(&mut self, url: String, extras: &NavigationExtras) -> Result<(), NavigationError> {
        let id = self.next_id();
        self.events.push(RouterEvent::NavigationStart {
            id,
            url: url.clone(),
        });

        let after = match self.apply_redirects(&url) {
            Ok(after) => after,
            Err(e) => {
                self.events.push(RouterEvent::NavigationError {
                    id,
                    url,
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let path = AppUrl::parse(&after)?.path().to_string();
        if let Some(guard) = self.guards.iter().find(|g| path.starts_with(&g.prefix)) {
            let reason = guard.reason.clone();
            log::debug!("Navigation {} to {} cancelled by guard: {}", id, after, reason);
            self.events.push(RouterEvent::NavigationCancel {
                id,
                url,
                reason: reason.clone(),
            });
            return Err(NavigationError::Rejected(reason));
        }

        let entry = HistoryEntry {
            url: after.clone(),
            state: extras.state.clone(),
        };
        if extras.is_replace() {
            self.entries[self.index] = entry;
        } else {
            self.entries.truncate(self.index + 1);
            self.entries.push(entry);
            self.index = self.entries.len() - 1;
        }
        self.in_flight = extras.state.clone();
        self.events.push(RouterEvent::NavigationEnd {
            id,
            url,
            url_after_redirects: after,
        });
        Ok(())
    }

    fn outgoing_query(&self, extras: &NavigationExtras) -> Result<QueryParams, NavigationError> {
        let own = extras.query_params.clone().unwrap_or_default();
        let query = match extras.query_params_handling.unwrap_or_default() {
            QueryParamsHandling::Replace => own,
            QueryParamsHandling::Merge => {
                let mut current = AppUrl::parse(&self.current().url)?.query_params();
                current.extend(own);
                current
            }
            QueryParamsHandling::Preserve => AppUrl::parse(&self.current().url)?.query_params(),
        };
        Ok(query)
    }
}

impl Router for MemoryRouter {
    fn url(&self) -> String {
        self.current().url.clone()
    }

    fn snapshot(&self) -> RouteSnapshot {
        let url = self.url();
        match AppUrl::parse(&url) {
            Ok(parsed) => RouteSnapshot {
                path: parsed.path().to_string(),
                query_params: parsed.query_params(),
                url,
            },
            Err(_) => RouteSnapshot {
                path: url.clone(),
                url,
                query_params: QueryParams::new(),
            },
        }
    }

    fn navigate(&mut self, commands: &[String], extras: &NavigationExtras) -> Result<(), NavigationError> {
        if commands.is_empty() {
            return Err(NavigationError::InvalidTarget("empty command list".to_string()));
        }
        let relative_to = extras.relative_to.as_deref().unwrap_or("/");
        let path = query::resolve_commands(commands, relative_to)?;
        let mut url = AppUrl::parse(&path)?;
        url.set_query_params(&self.outgoing_query(extras)?);
        self.commit(url.to_href(), extras)
    }

    fn navigate_by_url(&mut self, url: &str, extras: &NavigationExtras) -> Result<(), NavigationError> {
        let href = AppUrl::parse(url)?.to_href();
        self.commit(href, extras)
    }

    fn current_navigation_state(&self) -> Option<&NavigationState> {
        self.in_flight.as_ref()
    }

    fn history_state(&self) -> Option<&NavigationState> {
        self.current().state.as_ref()
    }

    fn drain_events(&mut self) -> Vec<RouterEvent> {
        self.in_flight = None;
        std::mem::take(&mut self.events)
    }
}
