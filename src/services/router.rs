//! The router seen from the navigation service.
//!
//! Anything that can report the current URL, perform navigations and emit
//! lifecycle events can back [`crate::services::navigation_service::NavigationService`].

use crate::types::errors::NavigationError;
use crate::types::navigation::{NavigationExtras, NavigationState};
use crate::types::route::{RouteSnapshot, RouterEvent};

pub trait Router {
    /// Current URL as `path?query#fragment`.
    fn url(&self) -> String;

    /// The activated route: current URL plus parsed query parameters.
    fn snapshot(&self) -> RouteSnapshot;

    /// Navigates by path segments, honoring `query_params`,
    /// `query_params_handling`, `relative_to`, `replace_url` and `state`.
    fn navigate(&mut self, commands: &[String], extras: &NavigationExtras) -> Result<(), NavigationError>;

    /// Navigates to an absolute URL. Only `replace_url` and `state` apply;
    /// query parameters must already be part of `url`.
    fn navigate_by_url(&mut self, url: &str, extras: &NavigationExtras) -> Result<(), NavigationError>;

    /// State attached by the navigation currently in flight, if any.
    fn current_navigation_state(&self) -> Option<&NavigationState>;

    /// State stored on the current history entry.
    fn history_state(&self) -> Option<&NavigationState>;

    /// Events emitted since the last call, oldest first.
    fn drain_events(&mut self) -> Vec<RouterEvent>;
}
