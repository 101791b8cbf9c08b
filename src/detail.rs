//! Detail lifecycle for the currently selected movie.
//!
//! Opening a new id always starts a fresh fetch. Earlier fetches are not
//! cancelled: whichever completion arrives last wins, even if it belongs to an
//! id the user has since moved away from.

use tracing::debug;

use crate::omdb::MovieDetail;
use crate::watched::WatchedEntry;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailPhase {
  #[default]
  Closed,
  Loading,
  Loaded(MovieDetail),
  Failed(String),
}

#[derive(Debug, Default)]
pub struct DetailController {
  id: Option<String>,
  phase: DetailPhase,
}

impl DetailController {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn id(&self) -> Option<&str> {
    self.id.as_deref()
  }

  pub fn phase(&self) -> &DetailPhase {
    &self.phase
  }

  pub fn is_open(&self) -> bool {
    self.id.is_some()
  }

  pub fn detail(&self) -> Option<&MovieDetail> {
    match &self.phase {
      DetailPhase::Loaded(detail) => Some(detail),
      _ => None,
    }
  }

  /// Follow a selection change. Returns the id to fetch when a fetch should start.
  pub fn sync(&mut self, selection: Option<&str>) -> Option<String> {
    if self.id.as_deref() == selection {
      return None;
    }
    match selection {
      None => {
        self.close();
        None
      }
      Some(id) => {
        self.id = Some(id.to_string());
        self.phase = DetailPhase::Loading;
        Some(id.to_string())
      }
    }
  }

  pub fn close(&mut self) {
    self.id = None;
    self.phase = DetailPhase::Closed;
  }

  /// A detail fetch finished. Applied whenever the view is open, whichever id it was for.
  pub fn complete(&mut self, detail: MovieDetail) -> bool {
    if !self.is_open() {
      return false;
    }
    if self.id.as_deref() != Some(detail.id.as_str()) {
      debug!(open = ?self.id, arrived = %detail.id, "detail: completion for a different id overwrites the view");
    }
    self.phase = DetailPhase::Loaded(detail);
    true
  }

  pub fn fail(&mut self, message: String) -> bool {
    if !self.is_open() {
      return false;
    }
    self.phase = DetailPhase::Failed(message);
    true
  }

  pub fn is_watched(&self, watched: &[WatchedEntry]) -> bool {
    self.watched_rating(watched).is_some()
  }

  /// The user's rating when the open movie is already on the list.
  pub fn watched_rating(&self, watched: &[WatchedEntry]) -> Option<u8> {
    let id = self.id.as_deref()?;
    watched.iter().find(|entry| entry.id == id).map(|entry| entry.user_rating)
  }

  /// Fold the loaded detail and `user_rating` into a list entry.
  ///
  /// `None` when nothing is loaded, the movie is already on the list, the
  /// rating is zero, or the record lacks a numeric runtime or imdb rating.
  pub fn watched_entry(&self, user_rating: u8, watched: &[WatchedEntry]) -> Option<WatchedEntry> {
    let detail = self.detail()?;
    if user_rating == 0 || self.is_watched(watched) || watched.iter().any(|e| e.id == detail.id) {
      return None;
    }
    let Some(runtime) = parse_runtime(&detail.runtime) else {
      debug!(id = %detail.id, runtime = %detail.runtime, "detail: refusing entry without a runtime");
      return None;
    };
    let Ok(imdb_rating) = detail.imdb_rating.trim().parse::<f64>() else {
      debug!(id = %detail.id, rating = %detail.imdb_rating, "detail: refusing entry without an imdb rating");
      return None;
    };
    Some(WatchedEntry {
      id: detail.id.clone(),
      title: detail.title.clone(),
      poster: detail.poster.clone(),
      runtime,
      imdb_rating,
      user_rating,
    })
  }
}

/// Leading integer of `"<int> min"`.
pub fn parse_runtime(runtime: &str) -> Option<u32> {
  runtime.split_whitespace().next()?.parse().ok()
}
