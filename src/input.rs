use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Focus};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

fn step(selected: Option<usize>, count: usize, down: bool) -> Option<usize> {
  if count == 0 {
    return None;
  }
  Some(match (selected, down) {
    (None, _) => 0,
    (Some(i), true) => (i + 1) % count,
    (Some(0), false) => count - 1,
    (Some(i), false) => i - 1,
  })
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => app.should_quit = true,
      KeyCode::Char('t') => app.next_theme(),
      KeyCode::Char('r') => app.results_open = !app.results_open,
      KeyCode::Char('w') => app.side_open = !app.side_open,
      _ => {}
    }
    return;
  }

  if let Some(action) = app.bound_action(&key) {
    app.run_action(action);
    return;
  }

  if key.code == KeyCode::Tab {
    app.focus = app.focus.next();
    return;
  }

  match app.focus {
    Focus::Input => handle_input_key(app, key),
    Focus::Results => handle_results_key(app, key),
    Focus::Side if app.detail.is_open() => handle_detail_key(app, key),
    Focus::Side => handle_watched_key(app, key),
  }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
  app.clear_error();
  let query = app.search.query().to_string();
  let len = query.chars().count();
  match key.code {
    KeyCode::Char(c) => {
      let mut next = query;
      next.insert(char_to_byte_index(&next, app.cursor_position), c);
      app.replace_query(next, app.cursor_position + 1);
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        let mut next = query;
        next.remove(char_to_byte_index(&next, app.cursor_position - 1));
        app.replace_query(next, app.cursor_position - 1);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < len {
        let mut next = query;
        next.remove(char_to_byte_index(&next, app.cursor_position));
        app.replace_query(next, app.cursor_position);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < len {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = len;
    }
    KeyCode::Esc => {
      if !query.is_empty() {
        app.replace_query(String::new(), 0);
        app.input_scroll = 0;
      } else if !app.search.results().is_empty() {
        app.focus = Focus::Results;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if !app.search.results().is_empty() {
        app.focus = Focus::Results;
      }
    }
    _ => {}
  }
}

fn handle_results_key(app: &mut App, key: KeyEvent) {
  let count = app.search.results().len();
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => {
      app.results_state.select(step(app.results_state.selected(), count, true));
    }
    KeyCode::Up | KeyCode::Char('k') => {
      app.results_state.select(step(app.results_state.selected(), count, false));
    }
    KeyCode::Char(' ') | KeyCode::Char('l') | KeyCode::Right => {
      if let Some(id) = app.selected_result_id() {
        app.select_result(&id);
      }
    }
    KeyCode::Esc => {
      app.focus = Focus::Input;
    }
    _ => {}
  }
}

fn handle_detail_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Left | KeyCode::Char('h') => app.rating.preview_prev(),
    KeyCode::Right | KeyCode::Char('l') => app.rating.preview_next(),
    KeyCode::Char(' ') => app.rating.commit(),
    KeyCode::Char('0') => app.rating.select(10),
    KeyCode::Char(c @ '1'..='9') => {
      if let Some(d) = c.to_digit(10) {
        app.rating.select(d as u8);
      }
    }
    KeyCode::Char('a') => app.add_to_watched(),
    KeyCode::Backspace => app.close_detail(),
    _ => {}
  }
}

fn handle_watched_key(app: &mut App, key: KeyEvent) {
  let count = app.watched.len();
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => {
      app.watched_state.select(step(app.watched_state.selected(), count, true));
    }
    KeyCode::Up | KeyCode::Char('k') => {
      app.watched_state.select(step(app.watched_state.selected(), count, false));
    }
    KeyCode::Char(' ') | KeyCode::Char('l') | KeyCode::Right => {
      if let Some(id) = app.selected_watched_id() {
        app.select_result(&id);
      }
    }
    KeyCode::Char('d') | KeyCode::Delete => {
      if let Some(id) = app.selected_watched_id() {
        app.remove_watched(&id);
      }
    }
    KeyCode::Esc => {
      app.focus = Focus::Input;
    }
    _ => {}
  }
}
