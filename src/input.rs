use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use crate::app::{App, PointerGrab, step_selection};
use crate::constants::constants;
use crate::feed::{Direction, FeedInput};
use crate::navigation::Route;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Vertical pointer position in pixels for a terminal row.
pub fn row_to_px(row: u16) -> f32 {
  row as f32 * constants().cell_height_px
}

/// Horizontal position of `column` along a one-row bar, `0.0..=1.0`.
pub fn bar_fraction(column: u16, bar: Rect) -> f64 {
  let span = bar.width.saturating_sub(1).max(1) as f64;
  (column.saturating_sub(bar.x) as f64 / span).clamp(0.0, 1.0)
}

fn hit(area: Option<Rect>, column: u16, row: u16) -> bool {
  area.is_some_and(|a| a.contains(Position::new(column, row)))
}

fn open_selected(app: &mut App, ids: Vec<String>, selected: Option<usize>) {
  if let Some(id) = selected.and_then(|i| ids.into_iter().nth(i)) {
    app.go_to(Route::Watch(id));
  }
}

// --- Key Handling ---

pub fn handle_key_event(app: &mut App, key: KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  if *app.route() == Route::Search && app.search.editing {
    handle_search_input_key(app, key);
    return;
  }

  app.status_message = None;
  match key.code {
    KeyCode::Esc | KeyCode::Backspace => {
      if !app.go_back() && key.code == KeyCode::Esc {
        app.should_quit = true;
      }
      return;
    }
    KeyCode::Char('q') => {
      app.should_quit = true;
      return;
    }
    KeyCode::Char('1') => return app.go_to(Route::Home),
    KeyCode::Char('2') => return app.go_to(Route::Discover),
    KeyCode::Char('3') => return app.go_to(Route::MyList),
    KeyCode::Char('/') => return app.go_to(Route::Search),
    _ => {}
  }

  match app.route().clone() {
    Route::Home => handle_home_key(app, key),
    Route::Search => handle_search_results_key(app, key),
    Route::Watch(_) => handle_watch_key(app, key),
    Route::Discover => handle_discover_key(app, key),
    Route::MyList => handle_my_list_key(app, key),
  }
}

fn handle_home_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Left | KeyCode::Char('h') => app.cycle_category(false),
    KeyCode::Right | KeyCode::Char('l') => app.cycle_category(true),
    KeyCode::Tab => app.toggle_home_section(),
    KeyCode::Down | KeyCode::Char('j') => {
      let count = app.home_videos().len();
      step_selection(&mut app.home.list_state, count, true);
    }
    KeyCode::Up | KeyCode::Char('k') => {
      let count = app.home_videos().len();
      step_selection(&mut app.home.list_state, count, false);
    }
    KeyCode::Enter => {
      let ids = app.home_videos().iter().map(|v| v.id.clone()).collect();
      let selected = app.home.list_state.selected();
      open_selected(app, ids, selected);
    }
    _ => {}
  }
}

fn handle_search_input_key(app: &mut App, key: KeyEvent) {
  app.clear_error();
  let search = &mut app.search;
  match key.code {
    KeyCode::Enter => app.run_search(),
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&search.input, search.cursor_position);
      search.input.insert(byte_idx, c);
      search.cursor_position += 1;
      search.searched = false;
    }
    KeyCode::Backspace => {
      if search.cursor_position > 0 {
        search.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&search.input, search.cursor_position);
        search.input.remove(byte_idx);
        search.searched = false;
      }
    }
    KeyCode::Delete => {
      if search.cursor_position < search.input.chars().count() {
        let byte_idx = char_to_byte_index(&search.input, search.cursor_position);
        search.input.remove(byte_idx);
        search.searched = false;
      }
    }
    KeyCode::Left => {
      search.cursor_position = search.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if search.cursor_position < search.input.chars().count() {
        search.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      search.cursor_position = 0;
    }
    KeyCode::End => {
      search.cursor_position = search.input.chars().count();
    }
    KeyCode::Down => {
      if !search.results.is_empty() {
        search.editing = false;
      }
    }
    KeyCode::Esc => {
      if !search.input.is_empty() {
        search.input.clear();
        search.cursor_position = 0;
        search.input_scroll = 0;
        search.searched = false;
      } else if !app.go_back() {
        app.should_quit = true;
      }
    }
    _ => {}
  }
}

fn handle_search_results_key(app: &mut App, key: KeyEvent) {
  let count = app.search.results.len();
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => step_selection(&mut app.search.list_state, count, true),
    KeyCode::Up | KeyCode::Char('k') => step_selection(&mut app.search.list_state, count, false),
    KeyCode::Char('i') => app.search.editing = true,
    KeyCode::Enter => {
      let ids = app.search.results.clone();
      let selected = app.search.list_state.selected();
      open_selected(app, ids, selected);
    }
    _ => {}
  }
}

fn handle_watch_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Char('f') => return app.toggle_fullscreen(),
    KeyCode::Char('l') => return app.toggle_like(),
    KeyCode::Char('s') => return app.toggle_save(),
    KeyCode::Enter => {
      let ids = app.related_videos().iter().map(|v| v.id.clone()).collect();
      let selected = app.watch.as_ref().and_then(|w| w.list_state.selected());
      return open_selected(app, ids, selected);
    }
    _ => {}
  }

  let Some(watch) = &mut app.watch else { return };
  let count = watch.related.len();
  let player = &mut watch.player;
  match key.code {
    KeyCode::Char(' ') => player.toggle_play(),
    KeyCode::Char('m') => player.toggle_mute(),
    KeyCode::Char('+') | KeyCode::Char('=') => player.volume_up(),
    KeyCode::Char('-') => player.volume_down(),
    KeyCode::Left => player.rewind(),
    KeyCode::Right => player.forward(),
    KeyCode::Down | KeyCode::Char('j') => step_selection(&mut watch.list_state, count, true),
    KeyCode::Up | KeyCode::Char('k') => step_selection(&mut watch.list_state, count, false),
    _ => {}
  }
}

fn handle_discover_key(app: &mut App, key: KeyEvent) {
  if key.code == KeyCode::Enter {
    if let Some(id) = app.discover_video().map(|v| v.id.clone()) {
      app.go_to(Route::Watch(id));
    }
    return;
  }

  let Some(feed) = &mut app.discover else { return };
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => feed.request_advance(Direction::Next),
    KeyCode::Up | KeyCode::Char('k') => feed.request_advance(Direction::Prev),
    KeyCode::Char(' ') => feed.tap(),
    KeyCode::Left | KeyCode::Right => {
      let step = if key.code == KeyCode::Left { -0.1 } else { 0.1 };
      if let Some(player) = feed.active_player_mut() {
        let target = player.display_fraction() + step;
        player.seek_click(target);
      }
    }
    _ => {}
  }
}

fn handle_my_list_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Tab => app.toggle_my_list_tab(),
    KeyCode::Char('c') => app.clear_my_list(),
    KeyCode::Down | KeyCode::Char('j') => {
      let count = app.my_list_videos().len();
      step_selection(&mut app.my_list.list_state, count, true);
    }
    KeyCode::Up | KeyCode::Char('k') => {
      let count = app.my_list_videos().len();
      step_selection(&mut app.my_list.list_state, count, false);
    }
    KeyCode::Enter => {
      let ids = app.my_list_videos().iter().map(|v| v.id.clone()).collect();
      let selected = app.my_list.list_state.selected();
      open_selected(app, ids, selected);
    }
    _ => {}
  }
}

// --- Mouse Handling ---

pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
  match app.route().clone() {
    Route::Discover => handle_discover_mouse(app, mouse),
    Route::Watch(_) => handle_watch_mouse(app, mouse),
    _ => match mouse.kind {
      MouseEventKind::ScrollDown => handle_key_event(app, KeyEvent::from(KeyCode::Down)),
      MouseEventKind::ScrollUp => handle_key_event(app, KeyEvent::from(KeyCode::Up)),
      _ => {}
    },
  }
}

fn handle_discover_mouse(app: &mut App, mouse: MouseEvent) {
  let hits = app.hits;
  let (column, row) = (mouse.column, mouse.row);
  let Some(feed) = &mut app.discover else { return };
  let notch = constants().wheel_delta_per_notch;

  match mouse.kind {
    MouseEventKind::ScrollDown => feed.handle(FeedInput::Wheel { delta: notch }),
    MouseEventKind::ScrollUp => feed.handle(FeedInput::Wheel { delta: -notch }),
    MouseEventKind::Down(MouseButton::Left) => {
      if let Some(bar) = hits.scrub_bar
        && hit(Some(bar), column, row)
      {
        app.pointer = Some(PointerGrab::Scrub);
        feed.scrub_start(bar_fraction(column, bar));
      } else if hit(hits.feed, column, row) {
        app.pointer = Some(PointerGrab::Feed { row });
        feed.handle(FeedInput::GestureStart { y: row_to_px(row) });
      }
    }
    MouseEventKind::Drag(MouseButton::Left) => {
      if app.pointer == Some(PointerGrab::Scrub)
        && let Some(bar) = hits.scrub_bar
      {
        feed.scrub_drag(bar_fraction(column, bar));
      }
    }
    MouseEventKind::Up(MouseButton::Left) => match app.pointer.take() {
      Some(PointerGrab::Scrub) => feed.scrub_end(),
      Some(PointerGrab::Feed { row: start }) => {
        feed.handle(FeedInput::GestureEnd { y: row_to_px(row) });
        // A press and release on the same row is a tap, not a drag.
        if start == row {
          feed.tap();
        }
      }
      _ => {}
    },
    _ => {}
  }
}

fn handle_watch_mouse(app: &mut App, mouse: MouseEvent) {
  let hits = app.hits;
  let Some(watch) = &mut app.watch else { return };
  let count = watch.related.len();
  match mouse.kind {
    MouseEventKind::ScrollDown => step_selection(&mut watch.list_state, count, true),
    MouseEventKind::ScrollUp => step_selection(&mut watch.list_state, count, false),
    MouseEventKind::Down(MouseButton::Left) => {
      if let Some(bar) = hits.seek_bar
        && hit(Some(bar), mouse.column, mouse.row)
      {
        app.pointer = Some(PointerGrab::Seek);
        watch.player.seek_start();
        watch.player.seek_change(bar_fraction(mouse.column, bar));
      }
    }
    MouseEventKind::Drag(MouseButton::Left) => {
      if app.pointer == Some(PointerGrab::Seek)
        && let Some(bar) = hits.seek_bar
      {
        watch.player.seek_change(bar_fraction(mouse.column, bar));
      }
    }
    MouseEventKind::Up(MouseButton::Left) => {
      if app.pointer.take() == Some(PointerGrab::Seek)
        && let Some(bar) = hits.seek_bar
      {
        watch.player.seek_end(bar_fraction(mouse.column, bar));
      }
    }
    _ => {}
  }
}
