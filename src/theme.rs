use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub star: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "popcorn",
    bg: Color::Rgb(33, 37, 41),
    fg: Color::Rgb(222, 226, 230),
    accent: Color::Rgb(103, 65, 217),
    muted: Color::Rgb(134, 142, 150),
    border: Color::Rgb(73, 80, 87),
    highlight_fg: Color::Rgb(248, 249, 250),
    highlight_bg: Color::Rgb(52, 58, 64),
    stripe_bg: Color::Rgb(39, 43, 48),
    status: Color::Rgb(116, 192, 252),
    error: Color::Rgb(250, 82, 82),
    star: Color::Rgb(252, 196, 25),
    key_fg: Color::Rgb(33, 37, 41),
    key_bg: Color::Rgb(134, 142, 150),
  },
  Theme {
    name: "matinee",
    bg: Color::Rgb(250, 247, 240),
    fg: Color::Rgb(52, 40, 30),
    accent: Color::Rgb(190, 60, 40),
    muted: Color::Rgb(140, 120, 100),
    border: Color::Rgb(210, 195, 175),
    highlight_fg: Color::Rgb(250, 247, 240),
    highlight_bg: Color::Rgb(190, 60, 40),
    stripe_bg: Color::Rgb(242, 236, 224),
    status: Color::Rgb(40, 110, 160),
    error: Color::Rgb(200, 30, 30),
    star: Color::Rgb(220, 150, 0),
    key_fg: Color::Rgb(250, 247, 240),
    key_bg: Color::Rgb(140, 120, 100),
  },
  Theme {
    name: "noir",
    bg: Color::Black,
    fg: Color::Gray,
    accent: Color::White,
    muted: Color::DarkGray,
    border: Color::DarkGray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Gray,
    stripe_bg: Color::Black,
    status: Color::White,
    error: Color::LightRed,
    star: Color::White,
    key_fg: Color::Black,
    key_bg: Color::DarkGray,
  },
];
