use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::{App, HitAreas};
use crate::catalog::VideoRecord;
use crate::format::{format_duration, format_subscribers, format_upload_date, format_views};
use crate::navigation::Route;
use crate::theme::Theme;
use crate::watchlist::ListKind;

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

/// A one-row progress bar `width` cells wide.
fn bar_line(width: u16, fraction: f64, theme: &Theme) -> Line<'static> {
  let width = width as usize;
  let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
  Line::from(vec![
    Span::styled("━".repeat(filled), Style::default().fg(theme.progress)),
    Span::styled("─".repeat(width - filled), Style::default().fg(theme.border)),
  ])
}

fn rounded_block<'a>(title: impl Into<Line<'a>>, theme: &Theme) -> Block<'a> {
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
}

/// "Blender Foundation · 1.3M views · 2 years ago"
fn meta_line(video: &VideoRecord, app: &App) -> String {
  format!(
    "{} · {} · {}",
    video.creator.name,
    format_views(video.views),
    format_upload_date(video.upload_date, app.today)
  )
}

/// Striped list of videos: title on the left, duration on the right.
fn render_video_list(
  frame: &mut Frame,
  theme: &Theme,
  videos: &[&VideoRecord],
  block: Block,
  state: &mut ListState,
  area: Rect,
) {
  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;
  let items: Vec<ListItem> = videos
    .iter()
    .enumerate()
    .map(|(i, video)| {
      let is_selected = Some(i) == state.selected();
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let right = format!("{}  {}", video.creator.name, format_duration(video.duration as f64));
      let right_w = right.chars().count();
      let title = truncate_str(&video.title, inner_w.saturating_sub(right_w + 2));
      let gap = inner_w.saturating_sub(title.chars().count() + right_w);
      let line = Line::from(vec![
        Span::styled(title, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(theme.muted)),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, area, state);
}

fn render_empty(frame: &mut Frame, theme: &Theme, block: Block, message: &str, area: Rect) {
  let text = vec![Line::from(""), Line::from(Span::styled(message.to_string(), Style::default().fg(theme.muted)))];
  frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
}

/// Tab strip: `label (count)` entries with the active one highlighted.
fn tab_line(tabs: &[(String, usize)], active: usize, theme: &Theme) -> Line<'static> {
  let spans: Vec<Span> = tabs
    .iter()
    .enumerate()
    .flat_map(|(i, (label, count))| {
      let style = if i == active {
        Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
      } else {
        Style::default().fg(theme.muted)
      };
      vec![Span::styled(format!(" {} ({}) ", label, count), style), Span::raw(" ")]
    })
    .collect();
  Line::from(spans)
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  app.hits = HitAreas::default();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());

  render_header(frame, app, header_area);
  match app.route().clone() {
    Route::Home => render_home(frame, app, main_area),
    Route::Search => render_search(frame, app, main_area),
    Route::Watch(_) => render_watch(frame, app, main_area),
    Route::Discover => render_discover(frame, app, main_area),
    Route::MyList => render_my_list(frame, app, main_area),
  }
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let current = app.route().title();
  let mut spans = vec![Span::styled(" ▶ reel ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))];
  for (key, route) in [("1", Route::Home), ("2", Route::Discover), ("3", Route::MyList), ("/", Route::Search)] {
    let style = if route.title() == current {
      Style::default().fg(theme.fg).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
      Style::default().fg(theme.muted)
    };
    spans.push(Span::raw("  "));
    spans.push(Span::styled(format!("{} {}", key, route.title()), style));
  }
  frame.render_widget(Line::from(spans), area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_home(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [tabs_area, list_area] = Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(area);

  let tabs: Vec<(String, usize)> =
    app.home_tabs().into_iter().map(|(c, n)| (c.unwrap_or("All").to_string(), n)).collect();
  let active = app.home_tabs().iter().position(|(c, _)| *c == app.home.category.as_deref()).unwrap_or(0);
  frame.render_widget(tab_line(&tabs, active, theme), tabs_area);

  let title = format!(" {} ", app.home.section.label());
  let videos: Vec<&VideoRecord> = app.home_videos();
  let block = rounded_block(title, theme);
  if videos.is_empty() {
    render_empty(frame, theme, block, "Nothing here yet.", list_area);
    return;
  }
  let mut state = app.home.list_state.clone();
  render_video_list(frame, theme, &videos, block, &mut state, list_area);
  app.home.list_state = state;
}

fn render_search(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [input_area, list_area] = Layout::vertical([Constraint::Length(3), Constraint::Min(1)]).areas(area);
  render_search_input(frame, app, input_area);

  let results = app.search_results();
  let block = rounded_block(" Results ", theme);
  if results.is_empty() {
    let message = if app.search.searched && !app.search.input.trim().is_empty() {
      format!("No videos match '{}'.", app.search.input.trim())
    } else {
      "Search titles, creators, tags and descriptions.".to_string()
    };
    render_empty(frame, theme, block, &message, list_area);
    return;
  }
  let mut state = app.search.list_state.clone();
  render_video_list(frame, theme, &results, block, &mut state, list_area);
  app.search.list_state = state;
}

fn render_search_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let search = &mut app.search;
  let border_color = if search.editing { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&search.input, search.cursor_position);

  if cursor_col < search.input_scroll {
    search.input_scroll = cursor_col;
  } else if cursor_col >= search.input_scroll + inner_w {
    search.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let scroll = search.input_scroll;
  let visible: String = search
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= scroll)
    .take_while(|(start, _, _)| *start < scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if search.editing {
    let cursor_x = area.x + 2 + (cursor_col - scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_watch(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [player_area, related_area] =
    Layout::horizontal([Constraint::Percentage(64), Constraint::Percentage(36)]).areas(area);

  let Some(watch) = &app.watch else { return };
  let Some(video) = app.catalog.get(watch.player.video_id()) else { return };
  let p = &watch.player;

  let block = rounded_block(" Now Playing ", theme).padding(Padding::horizontal(1));
  let inner = block.inner(player_area);
  frame.render_widget(block, player_area);

  let [title_area, creator_area, stats_area, time_area, bar_area, controls_area, _, desc_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Min(0),
  ])
  .areas(inner);

  let inner_w = inner.width as usize;
  frame.render_widget(
    Span::styled(truncate_str(&video.title, inner_w), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)),
    title_area,
  );
  let creator = format!("{} · {}", video.creator.name, format_subscribers(video.creator.subscriber_count));
  frame.render_widget(Span::styled(truncate_str(&creator, inner_w), Style::default().fg(theme.fg)), creator_area);
  let stats = format!("{} · {}", format_views(video.views), format_upload_date(video.upload_date, app.today));
  frame.render_widget(Span::styled(truncate_str(&stats, inner_w), Style::default().fg(theme.muted)), stats_area);

  let state_label = if let Some(err) = &p.error {
    Span::styled(format!("⚠ {}", err), Style::default().fg(theme.error))
  } else if p.is_ended {
    Span::styled("■ Ended", Style::default().fg(theme.muted))
  } else if p.is_buffering {
    Span::styled("⏳ Buffering…", Style::default().fg(theme.status))
  } else if p.is_playing {
    Span::styled("▶ Playing", Style::default().fg(theme.accent))
  } else {
    Span::styled("⏸ Paused", Style::default().fg(theme.muted))
  };
  let duration = if p.duration_secs > 0.0 { p.duration_secs } else { video.duration as f64 };
  frame.render_widget(
    Line::from(vec![
      state_label,
      Span::raw("   "),
      Span::styled(
        format!("{} / {}", format_duration(p.played_secs), format_duration(duration)),
        Style::default().fg(theme.fg),
      ),
    ]),
    time_area,
  );

  frame.render_widget(bar_line(bar_area.width, p.played, theme), bar_area);

  let volume = if p.is_muted { "muted".to_string() } else { format!("{:.0}%", p.volume * 100.0) };
  let flag = |on: bool, label: &'static str| {
    let style = if on { Style::default().fg(theme.accent) } else { Style::default().fg(theme.muted) };
    Span::styled(label, style)
  };
  frame.render_widget(
    Line::from(vec![
      Span::styled(format!("Vol {}", volume), Style::default().fg(theme.fg)),
      Span::raw("   "),
      flag(p.watch.liked, "♥ Liked"),
      Span::raw("   "),
      flag(p.watch.saved, "⚑ Saved"),
      Span::raw("   "),
      flag(p.is_fullscreen, "⛶ Fullscreen"),
    ]),
    controls_area,
  );
  frame.render_widget(
    Paragraph::new(video.description.as_str()).style(Style::default().fg(theme.muted)).wrap(Wrap { trim: true }),
    desc_area,
  );
  app.hits.seek_bar = Some(bar_area);

  let related = app.related_videos();
  let block = rounded_block(" Related ", theme);
  if related.is_empty() {
    render_empty(frame, theme, block, "No related videos.", related_area);
    return;
  }
  let mut state = watch.list_state.clone();
  render_video_list(frame, theme, &related, block, &mut state, related_area);
  if let Some(watch) = &mut app.watch {
    watch.list_state = state;
  }
}

fn render_discover(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let Some(feed) = &app.discover else { return };
  let block = rounded_block(format!(" Discover  {} / {} ", feed.current_index() + 1, feed.len()), theme)
    .padding(Padding::horizontal(2));

  let (Some(video), Some(player)) = (app.discover_video(), feed.active_player()) else {
    render_empty(frame, theme, block, "The catalog is empty.", area);
    return;
  };

  // Portrait card centred in the area.
  let card_w = area.width.min(64);
  let card = Rect { x: area.x + (area.width - card_w) / 2, width: card_w, ..area };
  let inner = block.inner(card);
  frame.render_widget(block, card);

  let [_, title_area, meta_area, tags_area, _, state_area, _, desc_area, time_area, bar_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Min(0),
    Constraint::Length(1),
    Constraint::Length(1),
  ])
  .areas(inner);

  let inner_w = inner.width as usize;
  frame.render_widget(
    Span::styled(truncate_str(&video.title, inner_w), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)),
    title_area,
  );
  frame.render_widget(
    Span::styled(truncate_str(&meta_line(video, app), inner_w), Style::default().fg(theme.muted)),
    meta_area,
  );
  let tags = video.tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" ");
  frame.render_widget(Span::styled(truncate_str(&tags, inner_w), Style::default().fg(theme.accent)), tags_area);

  let state = player.state();
  let state_line = if state.error.is_some() {
    Span::styled("⚠ Playback failed. Tap to retry", Style::default().fg(theme.error))
  } else if player.needs_tap() {
    Span::styled("▶ Tap to play", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
  } else if player.is_loading() {
    Span::styled("⏳ Loading…", Style::default().fg(theme.muted))
  } else {
    Span::styled("♪ Playing", Style::default().fg(theme.status))
  };
  frame.render_widget(Line::from(state_line).alignment(Alignment::Center), state_area);
  frame.render_widget(
    Paragraph::new(video.description.as_str()).style(Style::default().fg(theme.muted)).wrap(Wrap { trim: true }),
    desc_area,
  );

  let window = if player.scrub_window() > 0.0 { player.scrub_window() } else { video.duration as f64 };
  let times = format!("{} / {}", format_duration(player.display_secs()), format_duration(window));
  frame.render_widget(Line::from(Span::styled(times, Style::default().fg(theme.fg))).alignment(Alignment::Right), time_area);
  frame.render_widget(bar_line(bar_area.width, player.display_fraction(), theme), bar_area);
  app.hits.feed = Some(card);
  app.hits.scrub_bar = Some(bar_area);
}

fn render_my_list(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [tabs_area, list_area] = Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(area);

  let kinds = [ListKind::Saved, ListKind::Liked];
  let tabs: Vec<(String, usize)> =
    kinds.iter().map(|k| (k.label().to_string(), app.watchlist.videos(*k, &app.catalog).len())).collect();
  let active = kinds.iter().position(|k| *k == app.my_list.tab).unwrap_or(0);
  frame.render_widget(tab_line(&tabs, active, theme), tabs_area);

  let videos = app.my_list_videos();
  let block = rounded_block(format!(" My {} Videos ", app.my_list.tab.label()), theme);
  if videos.is_empty() {
    let message = match app.my_list.tab {
      ListKind::Saved => "No saved videos yet. Press s while watching to save one.",
      ListKind::Liked => "No liked videos yet. Press l while watching to like one.",
    };
    render_empty(frame, theme, block, message, list_area);
    return;
  }
  let mut state = app.my_list.list_state.clone();
  render_video_list(frame, theme, &videos, block, &mut state, list_area);
  app.my_list.list_state = state;
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(msg) = &app.status_message {
    (format!(" ✓ {}", msg), Style::default().fg(theme.status))
  } else if let Some(video) = app.discover_video() {
    (format!(" ♪ {}", video.title), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let mut keys: Vec<(&str, &str)> = match app.route() {
    Route::Home => vec![("Enter", "Watch"), ("j/k", "Navigate"), ("h/l", "Category"), ("Tab", "Section")],
    Route::Search if app.search.editing => vec![("Enter", "Search"), ("↓", "Results"), ("Esc", "Clear")],
    Route::Search => vec![("Enter", "Watch"), ("j/k", "Navigate"), ("i", "Edit")],
    Route::Watch(_) => vec![
      ("Space", "Play"),
      ("←/→", "Skip"),
      ("+/-", "Volume"),
      ("m", "Mute"),
      ("l", "Like"),
      ("s", "Save"),
      ("f", "Fullscreen"),
    ],
    Route::Discover => vec![("j/k", "Next/Prev"), ("Space", "Play"), ("←/→", "Scrub"), ("Enter", "Watch")],
    Route::MyList => vec![("Enter", "Watch"), ("Tab", "Liked/Saved"), ("c", "Clear")],
  };
  keys.push(("^t", "Theme"));
  keys.push(("Esc", "Back"));

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
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
