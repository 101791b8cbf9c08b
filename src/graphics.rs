use image::{DynamicImage, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};

use crate::display::DisplayMode;

// --- Poster Widget ---

pub struct PosterWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

const ASCII_RAMP: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

/// Scale `image` to fit `area` for the given mode. Half-block cells hold two pixel rows.
pub fn fit_poster(image: &DynamicImage, area: Rect, mode: DisplayMode) -> DynamicImage {
  let rows = match mode {
    DisplayMode::Direct => u32::from(area.height) * 2,
    _ => u32::from(area.height),
  };
  // Terminal cells are roughly twice as tall as wide; ASCII needs to compensate horizontally.
  let cols = match mode {
    DisplayMode::Ascii => u32::from(area.width) / 2,
    _ => u32::from(area.width),
  };
  let fitted = image.resize(cols.max(1), rows.max(1), FilterType::Triangle);
  match mode {
    DisplayMode::Ascii => fitted.resize_exact(fitted.width() * 2, fitted.height(), FilterType::Nearest),
    _ => fitted,
  }
}

impl Widget for PosterWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => render_half_blocks(self.image, area, buf),
      DisplayMode::Ascii => render_ramp(self.image, area, buf),
      DisplayMode::Off => {}
    }
  }
}

fn cell_origin(area: Rect, used_w: u32, used_h: u32) -> (u16, u16) {
  let dx = u32::from(area.width).saturating_sub(used_w) / 2;
  let dy = u32::from(area.height).saturating_sub(used_h) / 2;
  (area.x.saturating_add(dx as u16), area.y.saturating_add(dy as u16))
}

fn render_half_blocks(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let w = rgb.width().min(u32::from(area.width));
  let h = rgb.height();
  let cells = h.div_ceil(2).min(u32::from(area.height));
  let (x0, y0) = cell_origin(area, w, cells);

  for cy in 0..cells {
    for x in 0..w {
      let top = rgb.get_pixel(x, cy * 2);
      let bottom = if cy * 2 + 1 < h {
        let p = rgb.get_pixel(x, cy * 2 + 1);
        Color::Rgb(p[0], p[1], p[2])
      } else {
        Color::Reset
      };
      buf.set_string(
        x0.saturating_add(x as u16),
        y0.saturating_add(cy as u16),
        "▀",
        Style::default().fg(Color::Rgb(top[0], top[1], top[2])).bg(bottom),
      );
    }
  }
}

fn render_ramp(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let w = luma.width().min(u32::from(area.width));
  let h = luma.height().min(u32::from(area.height));
  let (x0, y0) = cell_origin(area, w, h);

  for y in 0..h {
    for x in 0..w {
      let level = f32::from(luma.get_pixel(x, y)[0]) / 255.0;
      let idx = ((level * (ASCII_RAMP.len() - 1) as f32).round() as usize).min(ASCII_RAMP.len() - 1);
      buf.set_string(x0.saturating_add(x as u16), y0.saturating_add(y as u16), ASCII_RAMP[idx], Style::default());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  fn solid(w: u32, h: u32, px: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(px)))
  }

  #[test]
  fn fit_respects_area_for_half_blocks() {
    let poster = solid(300, 450, [10, 20, 30]);
    let fitted = fit_poster(&poster, Rect::new(0, 0, 20, 15), DisplayMode::Direct);
    assert!(fitted.width() <= 20);
    assert!(fitted.height() <= 30);
  }

  #[test]
  fn half_block_render_paints_colors() {
    let area = Rect::new(0, 0, 4, 2);
    let mut buf = Buffer::empty(area);
    let poster = solid(4, 4, [200, 10, 10]);
    PosterWidget { image: &poster, display_mode: DisplayMode::Direct }.render(area, &mut buf);
    let cell = &buf[(0, 0)];
    assert_eq!(cell.symbol(), "▀");
    assert_eq!(cell.fg, Color::Rgb(200, 10, 10));
    assert_eq!(cell.bg, Color::Rgb(200, 10, 10));
  }

  #[test]
  fn white_maps_to_densest_ascii() {
    let area = Rect::new(0, 0, 2, 1);
    let mut buf = Buffer::empty(area);
    let poster = solid(2, 1, [255, 255, 255]);
    PosterWidget { image: &poster, display_mode: DisplayMode::Ascii }.render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), "@");
  }

  #[test]
  fn off_mode_draws_nothing() {
    let area = Rect::new(0, 0, 2, 1);
    let mut buf = Buffer::empty(area);
    let poster = solid(2, 1, [255, 255, 255]);
    PosterWidget { image: &poster, display_mode: DisplayMode::Off }.render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), " ");
  }
}
