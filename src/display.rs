use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliDisplayMode {
  Auto,
  Direct,
  Ascii,
  Off,
}

/// How posters are drawn in the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  Off,
  Ascii,
  Direct,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Off => "off",
      DisplayMode::Ascii => "ascii",
      DisplayMode::Direct => "half-block",
    }
  }

  pub fn shows_posters(self) -> bool {
    self != DisplayMode::Off
  }
}

/// True-color terminals get half-block posters, everything else ASCII.
pub fn detect_display_mode(colorterm: &str) -> DisplayMode {
  match colorterm.to_lowercase().as_str() {
    "truecolor" | "24bit" => DisplayMode::Direct,
    _ => DisplayMode::Ascii,
  }
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(&std::env::var("COLORTERM").unwrap_or_default()),
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
    CliDisplayMode::Off => DisplayMode::Off,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detection_prefers_truecolor() {
    assert_eq!(detect_display_mode("truecolor"), DisplayMode::Direct);
    assert_eq!(detect_display_mode("24BIT"), DisplayMode::Direct);
    assert_eq!(detect_display_mode(""), DisplayMode::Ascii);
  }

  #[test]
  fn explicit_modes_win() {
    assert_eq!(resolve_display_mode(CliDisplayMode::Off), DisplayMode::Off);
    assert!(!DisplayMode::Off.shows_posters());
    assert!(DisplayMode::Ascii.shows_posters());
  }
}
