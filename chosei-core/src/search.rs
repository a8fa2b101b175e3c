//! Simulated availability search.
//!
//! Searching does not contact anything. It holds the "searching" state for a
//! fixed delay and then reveals the availability grid.

use std::time::Duration;

use tracing::debug;

pub const SEARCH_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchState {
    #[default]
    Idle,
    Searching,
    ShowingResults,
}

#[derive(Debug, Default)]
pub struct AvailabilitySearch {
    state: SearchState,
}

impl AvailabilitySearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Whether the search button should accept a press.
    pub fn can_start(&self) -> bool {
        self.state != SearchState::Searching
    }

    /// Enter the searching state. Returns false if a search is already running.
    pub fn start(&mut self) -> bool {
        if !self.can_start() {
            return false;
        }
        self.state = SearchState::Searching;
        true
    }

    pub fn complete(&mut self) {
        if self.state == SearchState::Searching {
            self.state = SearchState::ShowingResults;
        }
    }

    /// Start, wait out the delay, and complete.
    pub async fn run(&mut self) -> SearchState {
        if self.start() {
            debug!(delay = ?SEARCH_DELAY, "Searching availability");
            tokio::time::sleep(SEARCH_DELAY).await;
            self.complete();
        }
        self.state
    }
}
