//! Navigation Service.
//!
//! Decides where "back" goes and lets a page hand its children a way home.
//!
//! A page opening a child mints a return token bound to its own URL and puts
//! it in the child's query string (`?rtk=<token>`). When the child goes back,
//! the destination is picked in strict priority order:
//!
//! 1. the token in the current URL, if it resolves (history replace);
//! 2. a legacy `returnTo` carried in navigation state (history replace);
//! 3. the entry before the current one in the in-memory history (push);
//! 4. the caller's fallback.
//!
//! Tokens live in session storage, so step 1 keeps working after a reload
//! even though the in-memory history is gone.

use std::fmt;

use crate::managers::history_tracker::{HistoryTracker, HistoryTrackerTrait};
use crate::managers::token_repository::TokenRepository;
use crate::managers::token_store::{TokenStore, TokenStoreTrait};
use crate::services::query;
use crate::services::router::Router;
use crate::types::errors::{NavigationError, UrlError};
use crate::types::navigation::{
    NavigationExtras, NavigationRequest, NavigationState, NavigationTarget, QueryParams,
};
use crate::types::route::{RouteSnapshot, RouterEvent};
use crate::types::settings::NavigationSettings;

/// Which strategy produced the destination of a back navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnSource {
    Token,
    LegacyState,
    History,
    Fallback,
}

impl fmt::Display for ReturnSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReturnSource::Token => "token",
            ReturnSource::LegacyState => "legacy state",
            ReturnSource::History => "history",
            ReturnSource::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Options for [`NavigationService::forward_with_same_return`]; they win over extras.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwardOptions {
    pub replace_url: bool,
    pub state: Option<NavigationState>,
}

/// Turns any target into exactly one router call.
///
/// String targets get their extras' query parameters folded into the URL,
/// since by-URL navigation ignores them. Command targets resolve against the
/// application root unless the extras say otherwise; wrapped targets layer
/// root, their own extras, then the caller's, except that their query
/// parameters are unioned with the caller's (caller wins per key).
pub fn normalize_target(
    target: NavigationTarget,
    extras: &NavigationExtras,
) -> Result<NavigationRequest, UrlError> {
    let root = NavigationExtras::default().relative_to("/");
    match target {
        NavigationTarget::Url(url) => {
            let url = match &extras.query_params {
                Some(params) if !params.is_empty() => query::merge_query(&url, params)?,
                _ => url,
            };
            Ok(NavigationRequest::ByUrl {
                url,
                extras: NavigationExtras {
                    query_params: None,
                    query_params_handling: None,
                    ..extras.clone()
                },
            })
        }
        NavigationTarget::Commands(commands) => Ok(NavigationRequest::ByCommands {
            commands,
            extras: root.merged_with(extras),
        }),
        NavigationTarget::Wrapped {
            commands,
            extras: own,
        } => {
            let mut layered = root.merged_with(&own).merged_with(extras);
            layered.query_params = union_query_params(&own, extras);
            Ok(NavigationRequest::ByCommands {
                commands,
                extras: layered,
            })
        }
    }
}

/// Own parameters overlaid key by key with the caller's.
fn union_query_params(own: &NavigationExtras, caller: &NavigationExtras) -> Option<QueryParams> {
    match (&own.query_params, &caller.query_params) {
        (Some(own), Some(caller)) => {
            let mut params = own.clone();
            params.extend(caller.iter().map(|(k, v)| (k.clone(), v.clone())));
            Some(params)
        }
        (own, caller) => caller.as_ref().or(own.as_ref()).cloned(),
    }
}

/// Owns the history tracker and token store for one application session.
pub struct NavigationService<R: Router, T: TokenRepository> {
    router: R,
    tokens: TokenStore<T>,
    history: HistoryTracker,
    settings: NavigationSettings,
}

impl<R: Router, T: TokenRepository> NavigationService<R, T> {
    /// Starts the service: records the router's pending events (the initial
    /// navigation) and, if configured, sweeps expired tokens once.
    pub fn new(router: R, tokens: TokenStore<T>, settings: NavigationSettings) -> Self {
        let mut service = Self {
            router,
            tokens,
            history: HistoryTracker::new(),
            settings,
        };
        service.pump_events();
        if service.settings.purge_on_startup {
            service.tokens.purge_expired(service.settings.token_ttl_ms);
        }
        log::info!("Navigation service started at {}", service.router.url());
        service
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut R {
        &mut self.router
    }

    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    pub fn token_store(&self) -> &TokenStore<T> {
        &self.tokens
    }

    pub fn settings(&self) -> &NavigationSettings {
        &self.settings
    }

    /// Consumes the router's pending events.
    pub fn pump_events(&mut self) {
        for event in self.router.drain_events() {
            self.observe(&event);
        }
    }

    /// Records completed navigations; everything else is only logged.
    pub fn observe(&mut self, event: &RouterEvent) {
        match event {
            RouterEvent::NavigationEnd {
                url_after_redirects,
                ..
            } => self.history.record(url_after_redirects),
            RouterEvent::NavigationCancel { id, url, reason } => {
                log::debug!("Navigation {} to {} cancelled: {}", id, url, reason);
            }
            RouterEvent::NavigationError { id, url, error } => {
                log::debug!("Navigation {} to {} failed: {}", id, url, error);
            }
            RouterEvent::NavigationStart { .. } => {}
        }
    }

    // ------------------------------------------------------------------
    // Going forward with a return anchor
    // ------------------------------------------------------------------

    /// Opens `target` with a fresh token anchored to the current URL.
    pub fn go_with_return(
        &mut self,
        target: impl Into<NavigationTarget>,
        extras: NavigationExtras,
    ) -> Result<(), NavigationError> {
        let token = self.token_for_here();
        self.attach_token(target, &token, extras)
    }

    /// Older entry point: mints a token and also carries the anchor as
    /// `state.returnTo`, for pages that still read it from state.
    pub fn navigate_with_return_to<I, S>(
        &mut self,
        commands: I,
        extras: NavigationExtras,
    ) -> Result<(), NavigationError>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let current_url = self.router.url();
        let token = self.tokens.issue_token(&current_url);

        let mut state = extras.state.clone().unwrap_or_default();
        state.return_to = Some(current_url);
        let extras = extras
            .with_token(&self.settings.query_param, &token)
            .with_state(state);

        self.navigate(NavigationTarget::commands(commands), extras)
    }

    /// Forwards to `target` carrying the token this page was opened with, so
    /// the next page returns to the original anchor rather than here. Without
    /// an inbound token the navigation goes ahead without one.
    pub fn forward_with_same_return(
        &mut self,
        route: &RouteSnapshot,
        target: impl Into<NavigationTarget>,
        extras: NavigationExtras,
        opts: ForwardOptions,
    ) -> Result<(), NavigationError> {
        let mut merged = extras;
        if opts.replace_url {
            merged.replace_url = Some(true);
        }
        if opts.state.is_some() {
            merged.state = opts.state;
        }
        let outgoing = match self.token_from_route(route) {
            Some(token) => merged.with_token(&self.settings.query_param, &token),
            None => merged,
        };
        self.navigate(target.into(), outgoing)
    }

    /// Attaches a known token to a navigation without minting a new one.
    pub fn attach_token(
        &mut self,
        target: impl Into<NavigationTarget>,
        token: &str,
        extras: NavigationExtras,
    ) -> Result<(), NavigationError> {
        let outgoing = extras.with_token(&self.settings.query_param, token);
        self.navigate(target.into(), outgoing)
    }

    /// Mints a token for the current URL without navigating.
    pub fn token_for_here(&mut self) -> String {
        let url = self.router.url();
        self.tokens.issue_token(&url)
    }

    // ------------------------------------------------------------------
    // Going back
    // ------------------------------------------------------------------

    /// Goes back using the four-step priority chain.
    pub fn go_back_or(
        &mut self,
        fallback: impl Into<NavigationTarget>,
        extras: NavigationExtras,
    ) -> Result<ReturnSource, NavigationError> {
        if let Some(url) = self.token_from_current_url().and_then(|t| self.tokens.resolve_token(&t)) {
            return self.return_by_url(ReturnSource::Token, &url, NavigationExtras::replace());
        }

        if let Some(url) = self.return_to_url() {
            return self.return_by_url(ReturnSource::LegacyState, &url, NavigationExtras::replace());
        }

        if let Some(url) = self.history.pop_last(true) {
            return self.return_by_url(ReturnSource::History, &url, NavigationExtras::default());
        }

        log::debug!("No return anchor found, using fallback");
        self.navigate(fallback.into(), extras)?;
        Ok(ReturnSource::Fallback)
    }

    /// [`Self::go_back_or`] with the configured default fallback.
    pub fn go_back(&mut self) -> Result<ReturnSource, NavigationError> {
        let fallback = NavigationTarget::url(self.settings.default_fallback.clone());
        self.go_back_or(fallback, NavigationExtras::default())
    }

    /// Back handler for pages opened with a token: returns to the token's
    /// anchor, or to `fallback`, replacing the current entry either way.
    pub fn back_from_route(
        &mut self,
        route: &RouteSnapshot,
        fallback: impl Into<NavigationTarget>,
    ) -> Result<ReturnSource, NavigationError> {
        if let Some(url) = self.token_from_route(route).and_then(|t| self.tokens.resolve_token(&t)) {
            return self.return_by_url(ReturnSource::Token, &url, NavigationExtras::replace());
        }
        self.navigate(fallback.into(), NavigationExtras::replace())?;
        Ok(ReturnSource::Fallback)
    }

    // ------------------------------------------------------------------
    // Reading anchors
    // ------------------------------------------------------------------

    pub fn token_from_route(&self, route: &RouteSnapshot) -> Option<String> {
        route
            .query_param(&self.settings.query_param)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }

    /// Token in the current URL. An unparseable URL counts as no token.
    pub fn token_from_current_url(&self) -> Option<String> {
        let url = self.router.url();
        match query::query_param(&url, &self.settings.query_param) {
            Ok(token) => token,
            Err(e) => {
                log::debug!("Ignoring return token in unparseable URL: {}", e);
                None
            }
        }
    }

    /// Legacy anchor: the in-flight navigation's state first, then the
    /// current history entry's.
    pub fn return_to_url(&self) -> Option<String> {
        self.router
            .current_navigation_state()
            .and_then(NavigationState::return_to)
            .or_else(|| self.router.history_state().and_then(NavigationState::return_to))
            .map(str::to_string)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn return_by_url(
        &mut self,
        source: ReturnSource,
        url: &str,
        extras: NavigationExtras,
    ) -> Result<ReturnSource, NavigationError> {
        log::debug!("Returning to {} via {}", url, source);
        self.navigate(NavigationTarget::url(url), extras)?;
        Ok(source)
    }

    fn navigate(
        &mut self,
        target: NavigationTarget,
        extras: NavigationExtras,
    ) -> Result<(), NavigationError> {
        let request = normalize_target(target, &extras)?;
        let result = match &request {
            NavigationRequest::ByUrl { url, extras } => self.router.navigate_by_url(url, extras),
            NavigationRequest::ByCommands { commands, extras } => {
                self.router.navigate(commands, extras)
            }
        };
        self.pump_events();
        result
    }
}
