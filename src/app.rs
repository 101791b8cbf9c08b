use anyhow::{Result, anyhow};
use image::DynamicImage;
use ratatui::{layout::Rect, widgets::ListState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{self, Config};
use crate::constants::constants;
use crate::detail::DetailController;
use crate::display::DisplayMode;
use crate::keys::{BoundKey, KeyAction, KeyBinding, KeyBindings};
use crate::omdb::{MovieDetail, MovieSource, SearchError, SearchResult, has_poster};
use crate::rating::RatingInput;
use crate::search::{QueryEffect, SearchController, SearchTicket};
use crate::theme::THEMES;
use crate::title::{TitleGuard, WindowTitle};
use crate::watched::{PersistentList, WatchedEntry};

// --- Types ---

pub type SearchOutcome = Result<Vec<SearchResult>, SearchError>;

/// Which pane receives plain keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Input,
  Results,
  /// The right pane: detail view when a movie is selected, watched list otherwise.
  Side,
}

impl Focus {
  pub fn next(self) -> Self {
    match self {
      Focus::Input => Focus::Results,
      Focus::Results => Focus::Side,
      Focus::Side => Focus::Input,
    }
  }
}

pub(crate) struct PendingSearch {
  seq: u64,
  rx: oneshot::Receiver<SearchOutcome>,
  handle: JoinHandle<()>,
}

/// In-flight async task receivers and handles.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  search: Option<PendingSearch>,
  /// Every detail fetch started since the view opened, in start order.
  details: Vec<oneshot::Receiver<Result<MovieDetail>>>,
  poster: Option<(String, oneshot::Receiver<Result<DynamicImage>>)>,
}

/// Posters for the detail view, keyed by movie id.
#[derive(Default)]
pub struct PosterCache {
  pub original: Option<(String, DynamicImage)>,
  pub fitted: Option<(String, Rect, DynamicImage)>,
}

/// Lives exactly as long as the detail view is open.
struct DetailScope {
  _escape: KeyBinding,
  title: Option<TitleGuard>,
}

pub struct App {
  pub search: SearchController,
  pub detail: DetailController,
  pub watched: PersistentList<WatchedEntry>,
  pub rating: RatingInput,
  pub focus: Focus,
  /// Char index into the query.
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub results_state: ListState,
  pub watched_state: ListState,
  pub results_open: bool,
  pub side_open: bool,
  pub theme_index: usize,
  pub display_mode: DisplayMode,
  pub last_error: Option<String>,
  pub should_quit: bool,
  pub posters: PosterCache,
  error_time: Option<Instant>,
  source: Arc<dyn MovieSource>,
  tasks: AsyncTasks,
  bindings: KeyBindings,
  _focus_search: KeyBinding,
  detail_scope: Option<DetailScope>,
  window_title: WindowTitle,
  config: Config,
  /// Where theme changes are saved. `None` keeps them in memory.
  prefs_path: Option<PathBuf>,
}

impl App {
  pub fn new(
    source: Arc<dyn MovieSource>,
    watched: PersistentList<WatchedEntry>,
    window_title: WindowTitle,
    display_mode: DisplayMode,
    config: Config,
  ) -> Self {
    let theme_index =
      if let Some(ref name) = config.theme_name { THEMES.iter().position(|t| t.name == name.as_str()).unwrap_or(0) } else { 0 };
    let bindings = KeyBindings::new();
    let focus_search = bindings.bind(BoundKey::Enter, KeyAction::FocusSearch);
    let mut watched_state = ListState::default();
    if !watched.is_empty() {
      watched_state.select(Some(0));
    }

    let mut app = Self {
      search: SearchController::new(),
      detail: DetailController::new(),
      watched,
      rating: RatingInput::new(constants().max_rating),
      focus: Focus::Input,
      cursor_position: 0,
      input_scroll: 0,
      results_state: ListState::default(),
      watched_state,
      results_open: true,
      side_open: true,
      theme_index,
      display_mode,
      last_error: None,
      should_quit: false,
      posters: PosterCache::default(),
      error_time: None,
      source,
      tasks: AsyncTasks::default(),
      bindings,
      _focus_search: focus_search,
      detail_scope: None,
      window_title,
      config,
      prefs_path: config::prefs_path(),
    };
    app.rating = app.fresh_rating(0);
    app
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    // Safety: theme_index is bounded by the modular arithmetic in next_theme()
    // and by position() on initialization.
    &THEMES[self.theme_index]
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.clear_error();
    }
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    if let Some(path) = &self.prefs_path
      && let Err(e) = self.config.save_to(path)
    {
      warn!(err = %e, "config: failed to save preferences");
    }
  }

  fn fresh_rating(&self, default: u8) -> RatingInput {
    let rating = RatingInput::new(constants().max_rating).with_default(default);
    match &self.config.rating_labels {
      Some(labels) => rating.with_messages(labels.clone()),
      None => rating,
    }
  }

  pub fn show_idle_title(&self) {
    self.window_title.show_idle();
  }

  /// Escape is only bound while a detail view is open.
  pub fn escape_bound(&self) -> bool {
    self.bindings.is_bound(BoundKey::Escape)
  }

  pub fn bound_action(&self, key: &ratatui::crossterm::event::KeyEvent) -> Option<KeyAction> {
    self.bindings.lookup(key)
  }

  pub fn run_action(&mut self, action: KeyAction) {
    match action {
      KeyAction::FocusSearch => self.focus_search(),
      KeyAction::CloseDetail => self.close_detail(),
    }
  }

  /// Jump to the search box with an empty query. Does nothing when already there.
  pub fn focus_search(&mut self) {
    if self.focus == Focus::Input {
      return;
    }
    self.focus = Focus::Input;
    self.replace_query(String::new(), 0);
  }

  // --- Search ---

  /// Every edit goes through here so each keystroke is a query change.
  pub fn replace_query(&mut self, query: String, cursor: usize) {
    self.cursor_position = cursor.min(query.chars().count());
    match self.search.set_query(query) {
      QueryEffect::Unchanged => {}
      QueryEffect::Cleared => {
        self.cancel_search();
        self.results_state.select(None);
      }
      QueryEffect::Fetch(ticket) => {
        self.cancel_search();
        self.results_state.select(None);
        self.spawn_search(ticket);
        // Starting a fetch may have closed the detail view.
        self.sync_detail();
      }
    }
  }

  fn cancel_search(&mut self) {
    if let Some(pending) = self.tasks.search.take() {
      debug!(seq = pending.seq, "search: aborting in-flight request");
      pending.handle.abort();
    }
  }

  fn spawn_search(&mut self, ticket: SearchTicket) {
    let request = self.source.search(ticket.query);
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
      let _ = tx.send(request.await);
    });
    self.tasks.search = Some(PendingSearch { seq: ticket.seq, rx, handle });
  }

  fn finish_search(&mut self, seq: u64, outcome: SearchOutcome) {
    if self.search.complete(seq, outcome) {
      let selected = if self.search.results().is_empty() { None } else { Some(0) };
      self.results_state.select(selected);
    }
  }

  pub fn selected_result_id(&self) -> Option<String> {
    let idx = self.results_state.selected()?;
    self.search.results().get(idx).map(|r| r.id.clone())
  }

  // --- Selection & detail ---

  pub fn select_result(&mut self, id: &str) {
    self.search.select_result(id);
    self.sync_detail();
  }

  pub fn close_detail(&mut self) {
    self.search.close_detail();
    self.sync_detail();
  }

  /// Bring the detail controller in line with the current selection.
  fn sync_detail(&mut self) {
    let selection = self.search.selection().map(str::to_string);
    match self.detail.sync(selection.as_deref()) {
      Some(id) => self.open_detail(id),
      None if !self.detail.is_open() => self.release_detail(),
      None => {}
    }
  }

  fn open_detail(&mut self, id: String) {
    info!(id = %id, "detail: fetching");
    if self.detail_scope.is_none() {
      let escape = self.bindings.bind(BoundKey::Escape, KeyAction::CloseDetail);
      self.detail_scope = Some(DetailScope { _escape: escape, title: None });
    }
    let previous = self.detail.watched_rating(self.watched.items()).unwrap_or(0);
    self.rating = self.fresh_rating(previous);
    self.focus = Focus::Side;

    let request = self.source.detail(id);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(request.await);
    });
    self.tasks.details.push(rx);
  }

  fn release_detail(&mut self) {
    if self.detail_scope.take().is_some() {
      debug!("detail: closed");
    }
    self.tasks.details.clear();
    self.tasks.poster = None;
    self.rating.reset();
  }

  fn on_detail_loaded(&mut self, detail: MovieDetail) {
    if !self.detail.complete(detail) {
      return;
    }
    let Some(loaded) = self.detail.detail() else { return };
    let (id, title, poster) = (loaded.id.clone(), loaded.title.clone(), loaded.poster.clone());

    if let Some(scope) = self.detail_scope.as_mut() {
      // Drop the old guard first so it cannot overwrite the new title when it reverts.
      scope.title = None;
      if !title.is_empty() {
        scope.title = Some(self.window_title.scoped(&format!("{}{}", constants().detail_title_prefix, title)));
      }
    }

    let cached = self.posters.original.as_ref().is_some_and(|(cached_id, _)| *cached_id == id);
    if self.display_mode.shows_posters() && has_poster(&poster) && !cached {
      let request = self.source.poster(poster);
      let (tx, rx) = oneshot::channel();
      tokio::spawn(async move {
        let _ = tx.send(request.await);
      });
      self.tasks.poster = Some((id, rx));
    }
  }

  // --- Watched list ---

  /// Fold the loaded detail and the chosen rating into the watched list, then close the view.
  pub fn add_to_watched(&mut self) {
    let Some(entry) = self.detail.watched_entry(self.rating.rating(), self.watched.items()) else {
      debug!(id = ?self.detail.id(), rating = self.rating.rating(), "watched: add refused");
      return;
    };
    info!(id = %entry.id, rating = entry.user_rating, "watched: adding");
    if let Err(e) = self.watched.push(entry) {
      warn!(err = %e, "watched: failed to persist");
      self.set_error(format!("Failed to save watched list: {}", e));
    }
    if self.watched_state.selected().is_none() {
      self.watched_state.select(Some(0));
    }
    self.close_detail();
  }

  pub fn selected_watched_id(&self) -> Option<String> {
    let idx = self.watched_state.selected()?;
    self.watched.items().get(idx).map(|e| e.id.clone())
  }

  pub fn remove_watched(&mut self, id: &str) {
    if !self.watched.contains(id) {
      return;
    }
    info!(id, "watched: removing");
    if let Err(e) = self.watched.remove(id) {
      warn!(err = %e, "watched: failed to persist");
      self.set_error(format!("Failed to save watched list: {}", e));
    }
    let len = self.watched.len();
    match self.watched_state.selected() {
      _ if len == 0 => self.watched_state.select(None),
      Some(i) if i >= len => self.watched_state.select(Some(len - 1)),
      _ => {}
    }
  }

  // --- Polling ---

  pub fn check_pending(&mut self) {
    if let Some(mut pending) = self.tasks.search.take() {
      match pending.rx.try_recv() {
        Ok(outcome) => self.finish_search(pending.seq, outcome),
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.search = Some(pending);
        }
        Err(oneshot::error::TryRecvError::Closed) => self.finish_search(pending.seq, Err(SearchError::TaskFailed)),
      }
    }

    let mut arrived = Vec::new();
    self.tasks.details.retain_mut(|rx| match rx.try_recv() {
      Ok(result) => {
        arrived.push(result);
        false
      }
      Err(oneshot::error::TryRecvError::Empty) => true,
      Err(oneshot::error::TryRecvError::Closed) => {
        arrived.push(Err(anyhow!("Detail task failed.")));
        false
      }
    });
    for result in arrived {
      match result {
        Ok(detail) => self.on_detail_loaded(detail),
        Err(e) => {
          warn!(err = %e, "detail: fetch failed");
          self.detail.fail(format!("{:#}", e));
        }
      }
    }

    if let Some((id, mut rx)) = self.tasks.poster.take() {
      match rx.try_recv() {
        Ok(Ok(image)) => {
          self.posters.original = Some((id, image));
          self.posters.fitted = None;
        }
        Ok(Err(e)) => {
          // No poster; the detail view renders without one.
          debug!(id = %id, err = %e, "poster: unavailable");
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.poster = Some((id, rx));
        }
        Err(oneshot::error::TryRecvError::Closed) => {}
      }
    }
  }

  /// Abort outstanding work and restore the window title.
  pub fn shutdown(&mut self) {
    self.cancel_search();
    self.detail_scope = None;
    self.tasks.details.clear();
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::detail::DetailPhase;
  use crate::search::SearchPhase;
  use crate::title::tests::RecordingTitle;
  use crate::watched::{MemoryStore, SlotStore, StoreError};
  use futures::FutureExt;
  use futures::future::BoxFuture;
  use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
  use std::cell::RefCell;
  use std::collections::HashMap;
  use std::rc::Rc;
  use std::sync::Mutex;

  /// Scripted movie source. Gated requests wait until the test releases them.
  #[derive(Default)]
  pub(crate) struct FakeSource {
    pub searches: Mutex<HashMap<String, SearchOutcome>>,
    pub search_gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    pub search_calls: Mutex<Vec<String>>,
    pub details: Mutex<HashMap<String, MovieDetail>>,
    pub detail_gates: Mutex<HashMap<String, oneshot::Receiver<MovieDetail>>>,
    /// Served for every poster URL when set.
    pub poster_image: Mutex<Option<DynamicImage>>,
    pub poster_calls: Mutex<Vec<String>>,
  }

  impl FakeSource {
    fn respond(&self, query: &str, outcome: SearchOutcome) {
      self.searches.lock().unwrap().insert(query.to_string(), outcome);
    }

    fn gate_search(&self, query: &str) -> oneshot::Sender<()> {
      let (tx, rx) = oneshot::channel();
      self.search_gates.lock().unwrap().insert(query.to_string(), rx);
      tx
    }

    fn gate_detail(&self, id: &str) -> oneshot::Sender<MovieDetail> {
      let (tx, rx) = oneshot::channel();
      self.detail_gates.lock().unwrap().insert(id.to_string(), rx);
      tx
    }

    fn calls(&self) -> Vec<String> {
      self.search_calls.lock().unwrap().clone()
    }
  }

  impl MovieSource for FakeSource {
    fn search(&self, query: String) -> BoxFuture<'static, SearchOutcome> {
      self.search_calls.lock().unwrap().push(query.clone());
      let gate = self.search_gates.lock().unwrap().remove(&query);
      let outcome = self.searches.lock().unwrap().get(&query).cloned().unwrap_or(Ok(Vec::new()));
      async move {
        if let Some(gate) = gate {
          let _ = gate.await;
        }
        outcome
      }
      .boxed()
    }

    fn detail(&self, id: String) -> BoxFuture<'static, Result<MovieDetail>> {
      if let Some(gate) = self.detail_gates.lock().unwrap().remove(&id) {
        return async move { gate.await.map_err(|_| anyhow!("gate dropped")) }.boxed();
      }
      let detail = self.details.lock().unwrap().get(&id).cloned();
      async move { detail.ok_or_else(|| anyhow!("Incorrect IMDb ID.")) }.boxed()
    }

    fn poster(&self, url: String) -> BoxFuture<'static, Result<DynamicImage>> {
      self.poster_calls.lock().unwrap().push(url);
      let image = self.poster_image.lock().unwrap().clone();
      async move { image.ok_or_else(|| anyhow!("no poster")) }.boxed()
    }
  }

  pub(crate) fn matrix_result() -> SearchResult {
    SearchResult {
      id: "tt0133093".into(),
      title: "The Matrix".into(),
      year: "1999".into(),
      poster_url: "u".into(),
    }
  }

  pub(crate) fn matrix_detail() -> MovieDetail {
    MovieDetail {
      id: "tt0133093".into(),
      title: "The Matrix".into(),
      poster: "N/A".into(),
      year: "1999".into(),
      runtime: "136 min".into(),
      imdb_rating: "8.7".into(),
      plot: "A hacker learns the truth.".into(),
      released: "31 Mar 1999".into(),
      actors: "Keanu Reeves".into(),
      director: "Lana Wachowski".into(),
      genre: "Action, Sci-Fi".into(),
    }
  }

  fn reloaded_detail() -> MovieDetail {
    MovieDetail { id: "tt0234215".into(), title: "The Matrix Reloaded".into(), ..matrix_detail() }
  }

  /// A watched-list store whose writes always fail.
  struct FailingStore;

  impl SlotStore for FailingStore {
    fn get(&self, _slot: &str) -> Result<Option<String>, StoreError> {
      Ok(None)
    }
    fn set(&self, _slot: &str, _value: &str) -> Result<(), StoreError> {
      Err(StoreError::Io(std::io::Error::other("disk full")))
    }
  }

  pub(crate) fn matrix_with_poster() -> MovieDetail {
    MovieDetail { poster: "https://example.com/matrix.jpg".into(), ..matrix_detail() }
  }

  pub(crate) fn white_poster() -> DynamicImage {
    DynamicImage::ImageRgb8(image::RgbImage::from_pixel(30, 45, image::Rgb([255, 255, 255])))
  }

  pub(crate) fn test_app_with(
    source: Arc<FakeSource>,
    store: Box<dyn SlotStore>,
    display_mode: DisplayMode,
  ) -> (App, Rc<RefCell<RecordingTitle>>) {
    let sink = Rc::new(RefCell::new(RecordingTitle::default()));
    let title = WindowTitle::new(sink.clone(), "popcorn");
    let watched = PersistentList::load(store, "watched", Vec::new());
    let mut app = App::new(source, watched, title, display_mode, Config::default());
    app.prefs_path = None;
    (app, sink)
  }

  pub(crate) fn test_app(source: Arc<FakeSource>) -> (App, Rc<RefCell<RecordingTitle>>) {
    test_app_with(source, Box::new(MemoryStore::new()), DisplayMode::Off)
  }

  pub(crate) async fn settle(app: &mut App) {
    for _ in 0..20 {
      tokio::task::yield_now().await;
      app.check_pending();
    }
  }

  fn last_title(sink: &Rc<RefCell<RecordingTitle>>) -> Option<String> {
    sink.borrow().0.last().cloned()
  }

  fn esc() -> KeyEvent {
    KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)
  }

  #[tokio::test]
  async fn short_query_never_hits_the_network() {
    let source = Arc::new(FakeSource::default());
    let (mut app, _) = test_app(source.clone());
    app.replace_query("m".into(), 1);
    app.replace_query("ma".into(), 2);
    settle(&mut app).await;
    assert!(source.calls().is_empty());
    assert_eq!(app.search.phase(), &SearchPhase::Idle);
  }

  #[tokio::test]
  async fn matrix_search_loads_results() {
    let source = Arc::new(FakeSource::default());
    source.respond("matrix", Ok(vec![matrix_result()]));
    let (mut app, _) = test_app(source.clone());

    app.replace_query("ma".into(), 2);
    app.replace_query("matrix".into(), 6);
    assert!(app.search.is_loading());
    settle(&mut app).await;

    assert_eq!(source.calls(), vec!["matrix".to_string()]);
    assert_eq!(app.search.results().len(), 1);
    assert_eq!(app.search.results()[0].id, "tt0133093");
    assert_eq!(app.results_state.selected(), Some(0));
  }

  #[tokio::test]
  async fn not_found_is_shown_verbatim() {
    let source = Arc::new(FakeSource::default());
    source.respond("matrix", Err(SearchError::Api("Movie not found!".into())));
    let (mut app, _) = test_app(source);
    app.replace_query("matrix".into(), 6);
    settle(&mut app).await;
    assert_eq!(app.search.phase(), &SearchPhase::Failed("Movie not found!".into()));
  }

  #[tokio::test]
  async fn superseded_search_never_lands() {
    let source = Arc::new(FakeSource::default());
    source.respond("mat", Ok(vec![matrix_result()]));
    source.respond("matr", Err(SearchError::Api("Movie not found!".into())));
    let release_first = source.gate_search("mat");
    let (mut app, _) = test_app(source.clone());

    app.replace_query("mat".into(), 3);
    app.replace_query("matr".into(), 4);
    settle(&mut app).await;
    let _ = release_first.send(());
    settle(&mut app).await;

    assert_eq!(source.calls(), vec!["mat".to_string(), "matr".to_string()]);
    assert_eq!(app.search.error(), Some("Movie not found!"));
    assert!(app.search.results().is_empty());
  }

  #[tokio::test]
  async fn clearing_below_gate_drops_in_flight_search() {
    let source = Arc::new(FakeSource::default());
    source.respond("matrix", Ok(vec![matrix_result()]));
    let release = source.gate_search("matrix");
    let (mut app, _) = test_app(source);

    app.replace_query("matrix".into(), 6);
    app.replace_query("ma".into(), 2);
    let _ = release.send(());
    settle(&mut app).await;
    assert_eq!(app.search.phase(), &SearchPhase::Idle);
  }

  #[tokio::test]
  async fn detail_scope_binds_escape_and_sets_title() {
    let source = Arc::new(FakeSource::default());
    source.details.lock().unwrap().insert("tt0133093".into(), matrix_detail());
    let (mut app, sink) = test_app(source);

    assert_eq!(app.bound_action(&esc()), None);
    app.select_result("tt0133093");
    assert_eq!(app.detail.phase(), &DetailPhase::Loading);
    assert_eq!(app.bound_action(&esc()), Some(KeyAction::CloseDetail));
    settle(&mut app).await;
    assert_eq!(last_title(&sink).as_deref(), Some("Movie | The Matrix"));

    let action = app.bound_action(&esc()).unwrap();
    app.run_action(action);
    assert!(!app.detail.is_open());
    assert_eq!(app.bound_action(&esc()), None);
    assert_eq!(last_title(&sink).as_deref(), Some("popcorn"));
  }

  #[tokio::test]
  async fn detail_failure_is_shown_inline() {
    let source = Arc::new(FakeSource::default());
    let (mut app, _) = test_app(source);
    app.select_result("tt9999999");
    settle(&mut app).await;
    assert_eq!(app.detail.phase(), &DetailPhase::Failed("Incorrect IMDb ID.".into()));
  }

  #[tokio::test]
  async fn new_search_closes_the_detail() {
    let source = Arc::new(FakeSource::default());
    source.details.lock().unwrap().insert("tt0133093".into(), matrix_detail());
    let (mut app, sink) = test_app(source);
    app.select_result("tt0133093");
    settle(&mut app).await;

    app.replace_query("matrix".into(), 6);
    assert!(!app.detail.is_open());
    assert_eq!(app.bound_action(&esc()), None);
    assert_eq!(last_title(&sink).as_deref(), Some("popcorn"));
  }

  #[tokio::test]
  async fn add_to_watched_persists_once_and_closes() {
    let source = Arc::new(FakeSource::default());
    source.details.lock().unwrap().insert("tt0133093".into(), matrix_detail());
    let (mut app, _) = test_app(source);

    app.select_result("tt0133093");
    settle(&mut app).await;
    app.add_to_watched();
    assert!(app.watched.is_empty(), "an unrated movie cannot be added");

    app.rating.select(9);
    app.add_to_watched();
    assert_eq!(app.watched.len(), 1);
    assert_eq!(app.watched.items()[0].user_rating, 9);
    assert_eq!(app.watched.items()[0].runtime, 136);
    assert!(!app.detail.is_open());

    app.select_result("tt0133093");
    settle(&mut app).await;
    assert_eq!(app.rating.rating(), 9, "rating input starts at the stored rating");
    app.rating.select(3);
    app.add_to_watched();
    assert_eq!(app.watched.len(), 1);
    assert_eq!(app.watched.items()[0].user_rating, 9);
  }

  #[tokio::test]
  async fn late_detail_for_previous_selection_wins() {
    let source = Arc::new(FakeSource::default());
    let first = source.gate_detail("tt0133093");
    let second = source.gate_detail("tt0234215");
    let (mut app, _) = test_app(source);

    app.select_result("tt0133093");
    app.select_result("tt0234215");
    let _ = second.send(reloaded_detail());
    settle(&mut app).await;
    assert_eq!(app.detail.detail().map(|d| d.title.clone()), Some("The Matrix Reloaded".into()));

    let _ = first.send(matrix_detail());
    settle(&mut app).await;
    assert_eq!(app.detail.id(), Some("tt0234215"));
    assert_eq!(app.detail.detail().map(|d| d.title.clone()), Some("The Matrix".into()));
  }

  #[tokio::test]
  async fn focus_search_clears_query_unless_focused() {
    let source = Arc::new(FakeSource::default());
    let (mut app, _) = test_app(source);
    app.replace_query("matrix".into(), 6);
    app.focus_search();
    assert_eq!(app.search.query(), "matrix");

    app.focus = Focus::Results;
    app.focus_search();
    assert_eq!(app.focus, Focus::Input);
    assert_eq!(app.search.query(), "");
    assert_eq!(app.cursor_position, 0);
  }

  #[tokio::test]
  async fn remove_keeps_watched_selection_in_range() {
    let source = Arc::new(FakeSource::default());
    source.details.lock().unwrap().insert("tt0133093".into(), matrix_detail());
    let (mut app, _) = test_app(source);
    app.select_result("tt0133093");
    settle(&mut app).await;
    app.rating.select(8);
    app.add_to_watched();
    assert_eq!(app.selected_watched_id().as_deref(), Some("tt0133093"));

    app.remove_watched("tt0133093");
    assert!(app.watched.is_empty());
    assert_eq!(app.watched_state.selected(), None);
  }

  #[tokio::test]
  async fn poster_is_fetched_once_per_movie() {
    let source = Arc::new(FakeSource::default());
    source.details.lock().unwrap().insert("tt0133093".into(), matrix_with_poster());
    *source.poster_image.lock().unwrap() = Some(white_poster());
    let (mut app, _) = test_app_with(source.clone(), Box::new(MemoryStore::new()), DisplayMode::Ascii);

    app.select_result("tt0133093");
    settle(&mut app).await;
    assert_eq!(source.poster_calls.lock().unwrap().as_slice(), ["https://example.com/matrix.jpg".to_string()]);
    assert_eq!(app.posters.original.as_ref().map(|(id, _)| id.as_str()), Some("tt0133093"));
    assert!(app.posters.fitted.is_none(), "a new poster invalidates the fitted copy");

    app.close_detail();
    app.select_result("tt0133093");
    settle(&mut app).await;
    assert!(app.detail.detail().is_some());
    assert_eq!(source.poster_calls.lock().unwrap().len(), 1, "cached poster is reused");
  }

  #[tokio::test]
  async fn posters_are_skipped_when_display_is_off() {
    let source = Arc::new(FakeSource::default());
    source.details.lock().unwrap().insert("tt0133093".into(), matrix_with_poster());
    *source.poster_image.lock().unwrap() = Some(white_poster());
    let (mut app, _) = test_app(source.clone());

    app.select_result("tt0133093");
    settle(&mut app).await;
    assert!(source.poster_calls.lock().unwrap().is_empty());
    assert!(app.posters.original.is_none());
  }

  #[tokio::test]
  async fn failed_watched_write_shows_status_message() {
    let source = Arc::new(FakeSource::default());
    source.details.lock().unwrap().insert("tt0133093".into(), matrix_detail());
    let (mut app, _) = test_app_with(source, Box::new(FailingStore), DisplayMode::Off);

    app.select_result("tt0133093");
    settle(&mut app).await;
    app.rating.select(8);
    app.add_to_watched();
    let error = app.last_error.clone().unwrap_or_default();
    assert!(error.starts_with("Failed to save watched list"), "got {:?}", error);
    assert!(error.contains("disk full"));
    assert!(!app.detail.is_open());

    app.clear_error();
    app.remove_watched("tt0133093");
    assert!(app.last_error.is_some());
  }

  #[test]
  fn theme_cycle_wraps_and_saves_preferences() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.toml");
    let (mut app, _) = test_app(Arc::new(FakeSource::default()));
    app.prefs_path = Some(path.clone());

    for expected in THEMES.iter().skip(1) {
      app.next_theme();
      assert_eq!(app.theme().name, expected.name);
      assert_eq!(Config::load_from(&path).theme_name.as_deref(), Some(expected.name));
    }
    app.next_theme();
    assert_eq!(app.theme_index, 0);
    assert_eq!(Config::load_from(&path).theme_name.as_deref(), Some(THEMES[0].name));
  }
}
