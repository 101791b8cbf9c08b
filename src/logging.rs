//! File-backed tracing.
//!
//! The terminal belongs to the UI, so log lines go to a daily-rolling file under
//! the data directory instead of stdout.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `RUST_LOG` wins over the configured level, which wins over `info`.
pub fn filter_directives(env: Option<&str>, configured: Option<&str>) -> String {
  env
    .filter(|s| !s.trim().is_empty())
    .or(configured.filter(|s| !s.trim().is_empty()))
    .unwrap_or("info")
    .to_string()
}

/// Install the global subscriber. Keep the guard alive until exit so buffered lines get flushed.
pub fn init(log_dir: &Path, configured_level: Option<&str>) -> Option<WorkerGuard> {
  if std::fs::create_dir_all(log_dir).is_err() {
    return None;
  }
  let appender = tracing_appender::rolling::daily(log_dir, "popcorn.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let env = std::env::var("RUST_LOG").ok();
  let directives = filter_directives(env.as_deref(), configured_level);
  let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));

  let subscriber =
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(writer).with_ansi(false).with_target(false));
  subscriber.try_init().ok()?;
  Some(guard)
}
