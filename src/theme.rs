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
  pub key_fg: Color,
  pub key_bg: Color,
  /// Filled part of progress and scrub bars.
  pub progress: Color,
}

pub const THEMES: [Theme; 4] = [
  Theme {
    name: "Midnight",
    bg: Color::Rgb(18, 18, 24),
    fg: Color::Rgb(220, 220, 230),
    accent: Color::Rgb(255, 85, 85),
    muted: Color::Rgb(120, 120, 140),
    border: Color::Rgb(60, 60, 80),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(60, 40, 50),
    stripe_bg: Color::Rgb(24, 24, 32),
    status: Color::Rgb(130, 200, 255),
    error: Color::Rgb(255, 110, 110),
    key_fg: Color::Rgb(18, 18, 24),
    key_bg: Color::Rgb(160, 160, 180),
    progress: Color::Rgb(255, 85, 85),
  },
  Theme {
    name: "Nord",
    bg: Color::Rgb(46, 52, 64),
    fg: Color::Rgb(216, 222, 233),
    accent: Color::Rgb(136, 192, 208),
    muted: Color::Rgb(118, 128, 148),
    border: Color::Rgb(76, 86, 106),
    highlight_fg: Color::Rgb(236, 239, 244),
    highlight_bg: Color::Rgb(67, 76, 94),
    stripe_bg: Color::Rgb(52, 58, 72),
    status: Color::Rgb(163, 190, 140),
    error: Color::Rgb(191, 97, 106),
    key_fg: Color::Rgb(46, 52, 64),
    key_bg: Color::Rgb(129, 161, 193),
    progress: Color::Rgb(136, 192, 208),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 248, 240),
    fg: Color::Rgb(40, 40, 40),
    accent: Color::Rgb(200, 60, 50),
    muted: Color::Rgb(140, 135, 125),
    border: Color::Rgb(200, 195, 185),
    highlight_fg: Color::Rgb(20, 20, 20),
    highlight_bg: Color::Rgb(235, 225, 205),
    stripe_bg: Color::Rgb(243, 240, 230),
    status: Color::Rgb(50, 110, 160),
    error: Color::Rgb(190, 40, 40),
    key_fg: Color::Rgb(250, 248, 240),
    key_bg: Color::Rgb(110, 105, 95),
    progress: Color::Rgb(200, 60, 50),
  },
  Theme {
    name: "Terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::Red,
    muted: Color::DarkGray,
    border: Color::DarkGray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Gray,
    stripe_bg: Color::Reset,
    status: Color::Cyan,
    error: Color::LightRed,
    key_fg: Color::Black,
    key_bg: Color::Gray,
    progress: Color::Red,
  },
];

/// Index of the theme called `name`, falling back to the first one.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name == n)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_are_unique() {
    for (i, a) in THEMES.iter().enumerate() {
      assert!(THEMES.iter().skip(i + 1).all(|b| b.name != a.name));
    }
  }

  #[test]
  fn lookup_by_name() {
    assert_eq!(theme_index(Some("Nord")), 1);
    assert_eq!(theme_index(Some("nope")), 0);
    assert_eq!(theme_index(None), 0);
  }
}
