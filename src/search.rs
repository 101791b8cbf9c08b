//! Search lifecycle: query text, fetch phase and the current selection.
//!
//! The controller never performs I/O. Changing the query hands back a
//! [`QueryEffect`] telling the caller whether to start a request, and the caller
//! reports the outcome through [`SearchController::complete`] together with the
//! ticket sequence number it was given. A completion whose sequence number is no
//! longer current belongs to a superseded query and is dropped untouched.

use tracing::{debug, info};

use crate::constants::constants;
use crate::omdb::{SearchError, SearchResult};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchPhase {
  /// Query too short; nothing to show.
  #[default]
  Idle,
  Loading,
  Loaded(Vec<SearchResult>),
  Failed(String),
}

/// A request the caller must issue on the controller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
  pub seq: u64,
  pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEffect {
  /// The query did not actually change.
  Unchanged,
  /// Below the length gate: results and error were cleared, no request needed.
  Cleared,
  /// Start this request. Any older request is now stale.
  Fetch(SearchTicket),
}

#[derive(Debug, Default)]
pub struct SearchController {
  query: String,
  phase: SearchPhase,
  selection: Option<String>,
  /// Sequence number of the most recent query change.
  seq: u64,
  /// Size of the last successful result list. Survives loading and failures.
  found: usize,
}

impl SearchController {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  pub fn phase(&self) -> &SearchPhase {
    &self.phase
  }

  pub fn is_loading(&self) -> bool {
    self.phase == SearchPhase::Loading
  }

  pub fn error(&self) -> Option<&str> {
    match &self.phase {
      SearchPhase::Failed(msg) => Some(msg),
      _ => None,
    }
  }

  /// The "Found N results" counter: the last successful list, cleared by a short query.
  pub fn found(&self) -> usize {
    self.found
  }

  /// Results to display. Empty unless the last fetch succeeded.
  pub fn results(&self) -> &[SearchResult] {
    match &self.phase {
      SearchPhase::Loaded(results) => results,
      _ => &[],
    }
  }

  pub fn selection(&self) -> Option<&str> {
    self.selection.as_deref()
  }

  /// Handle a query change. Every change invalidates whatever request is in flight.
  pub fn set_query(&mut self, text: impl Into<String>) -> QueryEffect {
    let text = text.into();
    if text == self.query {
      return QueryEffect::Unchanged;
    }
    self.query = text;
    self.seq += 1;

    if self.query.chars().count() < constants().min_query_len {
      self.phase = SearchPhase::Idle;
      self.found = 0;
      return QueryEffect::Cleared;
    }

    // Only one major focus at a time: a new search closes the detail view.
    self.selection = None;
    self.phase = SearchPhase::Loading;
    info!(seq = self.seq, query = %self.query, "search: starting fetch");
    QueryEffect::Fetch(SearchTicket { seq: self.seq, query: self.query.clone() })
  }

  /// Apply the outcome of request `seq`. Returns `false` when the outcome was discarded.
  pub fn complete(&mut self, seq: u64, outcome: Result<Vec<SearchResult>, SearchError>) -> bool {
    if seq != self.seq {
      debug!(seq, current = self.seq, "search: discarding stale completion");
      return false;
    }
    match outcome {
      Ok(results) => {
        info!(seq, count = results.len(), "search: loaded");
        self.found = results.len();
        self.phase = SearchPhase::Loaded(results);
      }
      Err(SearchError::Cancelled) => {
        debug!(seq, "search: cancelled");
        return false;
      }
      Err(e) => {
        info!(seq, err = %e, "search: failed");
        self.phase = SearchPhase::Failed(e.to_string());
      }
    }
    true
  }

  /// Click-to-toggle: selecting the selected id clears the selection.
  pub fn select_result(&mut self, id: &str) {
    if self.selection.as_deref() == Some(id) {
      self.selection = None;
    } else {
      self.selection = Some(id.to_string());
    }
  }

  pub fn close_detail(&mut self) {
    self.selection = None;
  }
}
