use ratatui::{
  style::{Color, Style},
  text::{Line, Span},
};

/// Bounded 1..=max star selector. `hover` previews a value before it is committed.
#[derive(Debug, Clone)]
pub struct RatingInput {
  max: u8,
  rating: u8,
  hover: Option<u8>,
  messages: Vec<String>,
}

impl RatingInput {
  pub fn new(max: u8) -> Self {
    Self { max: max.max(1), rating: 0, hover: None, messages: Vec::new() }
  }

  /// Labels per value, used only when there is exactly one per star.
  pub fn with_messages(mut self, messages: Vec<String>) -> Self {
    self.messages = messages;
    self
  }

  pub fn with_default(mut self, rating: u8) -> Self {
    self.rating = rating.min(self.max);
    self
  }

  /// The committed rating; 0 means nothing chosen yet.
  pub fn rating(&self) -> u8 {
    self.rating
  }

  pub fn hover(&self) -> Option<u8> {
    self.hover
  }

  /// What the stars currently show: the preview if any, else the committed value.
  pub fn displayed(&self) -> u8 {
    self.hover.unwrap_or(self.rating)
  }

  pub fn select(&mut self, value: u8) {
    if (1..=self.max).contains(&value) {
      self.rating = value;
      self.hover = None;
    }
  }

  pub fn preview_next(&mut self) {
    let next = self.displayed().saturating_add(1).min(self.max);
    self.hover = Some(next);
  }

  pub fn preview_prev(&mut self) {
    let prev = self.displayed().saturating_sub(1).max(1);
    self.hover = Some(prev);
  }

  /// Commit the hovered value, if there is one.
  pub fn commit(&mut self) {
    if let Some(value) = self.hover.take() {
      self.rating = value;
    }
  }

  pub fn reset(&mut self) {
    self.rating = 0;
    self.hover = None;
  }

  pub fn label(&self) -> String {
    let shown = self.displayed();
    if shown == 0 {
      return String::new();
    }
    if self.messages.len() == usize::from(self.max) {
      return self.messages[usize::from(shown) - 1].clone();
    }
    shown.to_string()
  }

  pub fn line(&self, color: Color, muted: Color) -> Line<'static> {
    let shown = self.displayed();
    let mut spans: Vec<Span> = (1..=self.max)
      .map(|i| {
        if i <= shown {
          Span::styled("★ ", Style::default().fg(color))
        } else {
          Span::styled("☆ ", Style::default().fg(muted))
        }
      })
      .collect();
    spans.push(Span::styled(self.label(), Style::default().fg(color)));
    Line::from(spans)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn starts_unrated() {
    let r = RatingInput::new(10);
    assert_eq!(r.rating(), 0);
    assert_eq!(r.displayed(), 0);
    assert_eq!(r.label(), "");
  }

  #[test]
  fn select_is_bounded() {
    let mut r = RatingInput::new(10);
    r.select(11);
    assert_eq!(r.rating(), 0);
    r.select(0);
    assert_eq!(r.rating(), 0);
    r.select(10);
    assert_eq!(r.rating(), 10);
  }

  #[test]
  fn preview_does_not_commit() {
    let mut r = RatingInput::new(10);
    r.select(4);
    r.preview_next();
    assert_eq!(r.displayed(), 5);
    assert_eq!(r.rating(), 4);
    r.select(2);
    assert_eq!(r.displayed(), 2);
  }

  #[test]
  fn preview_steps_clamp_and_commit() {
    let mut r = RatingInput::new(3);
    r.preview_prev();
    assert_eq!(r.hover(), Some(1));
    r.preview_next();
    r.preview_next();
    r.preview_next();
    assert_eq!(r.hover(), Some(3));
    r.commit();
    assert_eq!(r.rating(), 3);
    assert_eq!(r.hover(), None);
  }

  #[test]
  fn messages_replace_numbers_when_complete() {
    let names = ["Terrible", "Bad", "Ok", "Good", "Great"].map(String::from).to_vec();
    let mut r = RatingInput::new(5).with_messages(names);
    r.select(4);
    assert_eq!(r.label(), "Good");

    let mut partial = RatingInput::new(5).with_messages(vec!["meh".into()]);
    partial.select(2);
    assert_eq!(partial.label(), "2");
  }

  #[test]
  fn default_rating_is_clamped() {
    assert_eq!(RatingInput::new(5).with_default(9).rating(), 5);
  }

  #[test]
  fn line_has_one_span_per_star_plus_label() {
    let mut r = RatingInput::new(10);
    r.select(3);
    let line = r.line(Color::Yellow, Color::Gray);
    assert_eq!(line.spans.len(), 11);
    assert_eq!(line.spans[2].content, "★ ");
    assert_eq!(line.spans[3].content, "☆ ");
  }
}
