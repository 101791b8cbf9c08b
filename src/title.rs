use ratatui::crossterm::{execute, terminal::SetTitle};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

/// Something that can display a "current title".
pub trait TitleSink {
  fn set_title(&mut self, title: &str);
}

/// Writes the terminal window title.
pub struct TerminalTitle;

impl TitleSink for TerminalTitle {
  fn set_title(&mut self, title: &str) {
    if let Err(e) = execute!(std::io::stdout(), SetTitle(title)) {
      warn!(err = %e, "title: failed to set terminal title");
    }
  }
}

/// The window title, with an idle value restored whenever a scoped title is dropped.
#[derive(Clone)]
pub struct WindowTitle {
  sink: Rc<RefCell<dyn TitleSink>>,
  idle: String,
}

impl WindowTitle {
  pub fn new(sink: Rc<RefCell<dyn TitleSink>>, idle: impl Into<String>) -> Self {
    Self { sink, idle: idle.into() }
  }

  pub fn show_idle(&self) {
    self.sink.borrow_mut().set_title(&self.idle);
  }

  #[must_use = "the title reverts as soon as the guard is dropped"]
  pub fn scoped(&self, title: &str) -> TitleGuard {
    self.sink.borrow_mut().set_title(title);
    TitleGuard { title: self.clone() }
  }
}

pub struct TitleGuard {
  title: WindowTitle,
}

impl Drop for TitleGuard {
  fn drop(&mut self) {
    self.title.show_idle();
  }
}
