use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, Focus};
use crate::detail::DetailPhase;
use crate::graphics::{PosterWidget, fit_poster};
use crate::omdb::MovieDetail;
use crate::theme::Theme;
use crate::watched::WatchedSummary;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn boxed<'a>(title: &'a str, open: bool, focused: bool, theme: &Theme) -> Block<'a> {
  let border = if focused { theme.accent } else { theme.border };
  let toggle = if open { "[–]" } else { "[+]" };
  Block::bordered()
    .title(Line::from(vec![
      Span::styled(format!(" {} ", title), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
      Span::styled(format!("{} ", toggle), Style::default().fg(theme.muted)),
    ]))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border))
}

fn centered_message<'a>(text: String, style: Style, block: Block<'a>) -> Paragraph<'a> {
  Paragraph::new(vec![Line::from(""), Line::from(Span::styled(text, style))])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(block)
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let left = Line::from(Span::styled(" 🍿 popcorn ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let count = format!("Found {} results ", app.search.found());
  let right = Line::from(Span::styled(&count, Style::default().fg(theme.muted)));
  let count_w = (count.len() as u16).min(area.width);
  let right_area = Rect { x: area.x + area.width - count_w, width: count_w, ..area };
  frame.render_widget(right, right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  let [results_area, side_area] =
    Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(area);
  render_results(frame, app, results_area);
  if app.detail.is_open() {
    render_detail(frame, app, side_area);
  } else {
    render_watched(frame, app, side_area);
  }
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let block = boxed("Results", app.results_open, app.focus == Focus::Results, theme);
  if !app.results_open {
    frame.render_widget(block, area);
    return;
  }

  if app.search.is_loading() {
    frame.render_widget(centered_message("Loading...".into(), Style::default().fg(theme.status), block), area);
    return;
  }
  if let Some(msg) = app.search.error() {
    frame.render_widget(centered_message(format!("⛔ {}", msg), Style::default().fg(theme.error), block), area);
    return;
  }

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;
  let selection = app.search.selection();
  let items: Vec<ListItem> = app
    .search
    .results()
    .iter()
    .enumerate()
    .map(|(i, result)| {
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      let open = selection == Some(result.id.as_str());
      let year = format!("🗓 {}", result.year);
      let year_w = display_width(&year, usize::MAX);
      let title = truncate_str(&result.title, inner_w.saturating_sub(year_w + 2));
      let gap = inner_w.saturating_sub(display_width(&title, usize::MAX) + year_w);
      let title_style =
        if open { Style::default().fg(theme.accent).add_modifier(Modifier::BOLD) } else { Style::default().fg(theme.fg) };
      ListItem::new(Line::from(vec![
        Span::styled(title, title_style),
        Span::raw(" ".repeat(gap)),
        Span::styled(year, Style::default().fg(theme.muted)),
      ]))
      .bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, area, &mut app.results_state);
}

fn render_detail(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let block = boxed("Movie", app.side_open, app.focus == Focus::Side, theme).padding(Padding::horizontal(1));
  if !app.side_open {
    frame.render_widget(block, area);
    return;
  }

  let detail = match app.detail.phase() {
    DetailPhase::Loaded(detail) => detail.clone(),
    DetailPhase::Failed(msg) => {
      frame.render_widget(centered_message(format!("⛔ {}", msg), Style::default().fg(theme.error), block), area);
      return;
    }
    DetailPhase::Loading | DetailPhase::Closed => {
      frame.render_widget(centered_message("Loading...".into(), Style::default().fg(theme.status), block), area);
      return;
    }
  };

  let inner = block.inner(area);
  frame.render_widget(block, area);

  let poster_ready =
    app.display_mode.shows_posters() && app.posters.original.as_ref().is_some_and(|(id, _)| *id == detail.id);
  let info_area = if poster_ready {
    let [poster_area, info_area] =
      Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)]).spacing(1).areas(inner);
    render_poster(frame, app, &detail.id, poster_area);
    info_area
  } else {
    inner
  };

  let mut lines = detail_header(&detail, theme, info_area.width as usize);
  lines.push(Line::from(""));
  match app.detail.watched_rating(app.watched.items()) {
    Some(rating) => lines.push(Line::from(Span::styled(
      format!("You rated this movie {} ⭐", rating),
      Style::default().fg(theme.star),
    ))),
    None => {
      lines.push(app.rating.line(theme.star, theme.muted));
      if let Some(preview) = app.rating.hover() {
        lines.push(Line::from(Span::styled(format!("Space to rate {}", preview), Style::default().fg(theme.muted))));
      } else if app.rating.rating() > 0 {
        lines.push(Line::from(Span::styled("+ Add to list (a)", Style::default().fg(theme.accent).bold())));
      }
    }
  }
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(detail.plot.clone(), Style::default().fg(theme.fg).italic())));
  lines.push(Line::from(""));
  lines.push(Line::from(vec![
    Span::styled("Starring ", Style::default().fg(theme.muted)),
    Span::styled(detail.actors.clone(), Style::default().fg(theme.fg)),
  ]));
  lines.push(Line::from(vec![
    Span::styled("Directed by ", Style::default().fg(theme.muted)),
    Span::styled(detail.director.clone(), Style::default().fg(theme.fg)),
  ]));

  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), info_area);
}

fn detail_header(detail: &MovieDetail, theme: &Theme, width: usize) -> Vec<Line<'static>> {
  vec![
    Line::from(Span::styled(truncate_str(&detail.title, width), Style::default().fg(theme.fg).bold())),
    Line::from(Span::styled(
      format!("{} • {}", detail.released, detail.runtime),
      Style::default().fg(theme.muted),
    )),
    Line::from(Span::styled(detail.genre.clone(), Style::default().fg(theme.muted))),
    Line::from(vec![
      Span::styled("⭐ ", Style::default().fg(theme.star)),
      Span::styled(format!("{} IMDb rating", detail.imdb_rating), Style::default().fg(theme.fg)),
    ]),
  ]
}

fn render_poster(frame: &mut Frame, app: &mut App, id: &str, area: Rect) {
  let stale = match &app.posters.fitted {
    Some((fitted_id, fitted_area, _)) => fitted_id != id || *fitted_area != area,
    None => true,
  };
  if stale && let Some((_, original)) = &app.posters.original {
    let fitted = fit_poster(original, area, app.display_mode);
    app.posters.fitted = Some((id.to_string(), area, fitted));
  }
  if let Some((_, _, image)) = &app.posters.fitted {
    frame.render_widget(PosterWidget { image, display_mode: app.display_mode }, area);
  }
}

fn render_watched(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let block = boxed("Watched", app.side_open, app.focus == Focus::Side, theme);
  if !app.side_open {
    frame.render_widget(block, area);
    return;
  }

  let inner = block.inner(area);
  frame.render_widget(block, area);
  let [summary_area, list_area] = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(inner);

  let summary = WatchedSummary::of(app.watched.items());
  let summary_lines = vec![
    Line::from(Span::styled(" Movies you watched", Style::default().fg(theme.fg).bold())),
    Line::from(vec![
      Span::styled(format!(" #️⃣ {} movies", summary.count), Style::default().fg(theme.fg)),
      Span::raw("   "),
      Span::styled(format!("⭐ {}", summary.imdb_label()), Style::default().fg(theme.star)),
      Span::raw("   "),
      Span::styled(format!("🌟 {}", summary.user_label()), Style::default().fg(theme.star)),
      Span::raw("   "),
      Span::styled(format!("⏳ {}", summary.runtime_label()), Style::default().fg(theme.fg)),
    ]),
  ];
  frame.render_widget(Paragraph::new(summary_lines).style(Style::default().bg(theme.stripe_bg)), summary_area);

  let inner_w = list_area.width.saturating_sub(2) as usize;
  let items: Vec<ListItem> = app
    .watched
    .items()
    .iter()
    .map(|entry| {
      ListItem::new(vec![
        Line::from(Span::styled(truncate_str(&entry.title, inner_w), Style::default().fg(theme.fg).bold())),
        Line::from(vec![
          Span::styled(format!("⭐ {}", entry.imdb_rating), Style::default().fg(theme.star)),
          Span::raw("   "),
          Span::styled(format!("🌟 {}", entry.user_rating), Style::default().fg(theme.star)),
          Span::raw("   "),
          Span::styled(format!("⏳ {} min", entry.runtime), Style::default().fg(theme.muted)),
        ]),
      ])
    })
    .collect();

  let list = List::new(items)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg));
  frame.render_stateful_widget(list, list_area, &mut app.watched_state);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if app.search.is_loading() {
    (" ⏳ Searching…".to_string(), Style::default().fg(theme.status))
  } else {
    (format!(" Ready [{}]", app.display_mode.label().to_lowercase()), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.focus == Focus::Input;
  let border_color = if focused { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search movies ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let query = app.search.query();
  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(query, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let paragraph = if query.is_empty() {
    Paragraph::new(Span::styled("Search movies...", Style::default().fg(theme.muted)))
  } else {
    let visible: String = query
      .chars()
      .scan(0usize, |col, c| {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        let start = *col;
        *col += w;
        Some((start, *col, c))
      })
      .skip_while(|(_, end, _)| *end <= app.input_scroll)
      .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
      .map(|(_, _, c)| c)
      .collect();
    Paragraph::new(visible).style(Style::default().fg(theme.fg))
  };
  frame.render_widget(paragraph.block(input_block), area);

  // Too narrow to show any text; there is no cell for the cursor either.
  if focused && inner_w > 0 {
    let cursor_x = area.x + 2 + cursor_col.saturating_sub(app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let has_results = !app.search.results().is_empty();
  let keys: Vec<(&str, &str)> = match app.focus {
    Focus::Input => {
      let mut k = vec![("Tab", "Focus"), ("^t", "Theme")];
      if has_results {
        k.push(("↓", "Results"));
      }
      k.push(("Esc", if app.search.query().is_empty() && !has_results { "Quit" } else { "Clear" }));
      k
    }
    Focus::Results => vec![("Space", "Details"), ("j/k", "Navigate"), ("^r", "Collapse"), ("Enter", "Search")],
    Focus::Side if app.detail.is_open() => {
      let mut k = vec![("←/→", "Preview"), ("1-0", "Rate"), ("Space", "Set"), ("a", "Add")];
      k.push(if app.escape_bound() { ("Esc", "Close") } else { ("⌫", "Close") });
      k
    }
    Focus::Side => vec![("Space", "Details"), ("d", "Remove"), ("j/k", "Navigate"), ("^w", "Collapse")],
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let label_w = (theme_label.len() as u16).min(area.width);
  let right_area = Rect { x: area.x + area.width - label_w, width: label_w, ..area };
  frame.render_widget(right, right_area);
}
