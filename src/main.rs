mod app;
mod config;
mod constants;
mod detail;
mod display;
mod graphics;
mod input;
mod keys;
mod logging;
mod omdb;
mod rating;
mod search;
mod theme;
mod title;
mod ui;
mod watched;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use app::App;
use config::Config;
use constants::constants;
use display::CliDisplayMode;
use omdb::OmdbClient;
use title::{TerminalTitle, WindowTitle};
use watched::{FileStore, MemoryStore, PersistentList, SlotStore, WatchedEntry};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// OMDb API key (falls back to `api_key` in prefs.toml)
  #[arg(long, env = "OMDB_API_KEY", hide_env_values = true)]
  api_key: Option<String>,

  /// OMDb endpoint, for mirrors and testing
  #[arg(long, env = "OMDB_BASE_URL")]
  base_url: Option<String>,

  /// Poster display mode: 'auto', 'direct', 'ascii', or 'off' (default: auto-detect)
  #[arg(short, long, default_value = "auto")]
  display_mode: CliDisplayMode,

  /// Keep the watched list in memory only
  #[arg(long)]
  ephemeral: bool,

  /// Log filter, e.g. 'debug' or 'popcorn=trace' (RUST_LOG takes precedence)
  #[arg(long)]
  log_level: Option<String>,

  /// Print a shell completion script and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<clap_complete::Shell>,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "popcorn", &mut std::io::stdout());
    return Ok(());
  }

  let config = Config::load();
  let data_dir = config::data_dir();
  let configured_level = args.log_level.clone().or_else(|| config.log_level.clone());
  let _log_guard = logging::init(&data_dir.join("logs"), configured_level.as_deref());

  let api_key = args
    .api_key
    .clone()
    .or_else(|| config.api_key.clone())
    .filter(|k| !k.trim().is_empty())
    .context("No OMDb API key. Pass --api-key, set OMDB_API_KEY, or add api_key to prefs.toml")?;
  let base_url = args.base_url.clone().or_else(|| config.base_url.clone()).unwrap_or_else(|| constants().omdb_base_url.clone());
  let client = OmdbClient::new(&base_url, api_key)?;

  let store: Box<dyn SlotStore> =
    if args.ephemeral { Box::new(MemoryStore::new()) } else { Box::new(FileStore::new(data_dir.clone())) };
  let watched: PersistentList<WatchedEntry> = PersistentList::load(store, &constants().watched_slot, Vec::new());
  info!(entries = watched.len(), ephemeral = args.ephemeral, "popcorn: starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let window_title = WindowTitle::new(Rc::new(RefCell::new(TerminalTitle)), constants().idle_title.clone());
  let display_mode = display::resolve_display_mode(args.display_mode);
  let mut app = App::new(Arc::new(client), watched, window_title, display_mode, config);

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app);
  app.shutdown();
  ratatui::restore();
  if let Err(ref e) = result {
    error!(err = %e, "popcorn: exiting with error");
  }
  result
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  app.show_idle_title();
  let poll_interval = Duration::from_millis(constants().poll_interval_ms);

  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(poll_interval)? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  Ok(())
}
