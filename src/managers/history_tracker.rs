//! History Tracker.
//!
//! Best-effort, in-memory stack of completed navigations, used as a last
//! resort when no return token or legacy anchor is available. Lost on reload.

/// Trait defining history tracking operations.
pub trait HistoryTrackerTrait {
    fn record(&mut self, url: &str);
    fn pop_last(&mut self, skip_current: bool) -> Option<String>;
    fn entries(&self) -> &[String];
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
    fn clear(&mut self);
}

/// Append-only (during normal operation) sequence of post-redirect URLs.
#[derive(Debug, Default, Clone)]
pub struct HistoryTracker {
    entries: Vec<String>,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryTrackerTrait for HistoryTracker {
    /// Appends a completed navigation. Repeated visits produce repeated entries.
    fn record(&mut self, url: &str) {
        self.entries.push(url.to_string());
    }

    /// Pops from the tail. With `skip_current`, the tail entry (the page asking
    /// to go back) is discarded first and the one before it is returned.
    ///
    /// Entries are consumed even when the result is `None`.
    fn pop_last(&mut self, skip_current: bool) -> Option<String> {
        if skip_current {
            self.entries.pop();
        }
        self.entries.pop()
    }

    fn entries(&self) -> &[String] {
        &self.entries
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
