use chrono::{Local, NaiveDate};
use ratatui::{layout::Rect, widgets::ListState};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, VideoRecord};
use crate::config::Config;
use crate::constants::constants;
use crate::discover::DiscoverSession;
use crate::feed::FeedTuning;
use crate::full_player::FullPlayer;
use crate::mpv::MpvMedia;
use crate::navigation::{Navigator, Route};
use crate::ranking;
use crate::theme::{THEMES, Theme, theme_index};
use crate::timers::MonotonicClock;
use crate::watchlist::{KeyValueStore, ListKind, WatchListService};

// --- Types ---

pub type Feed = DiscoverSession<MpvMedia, MonotonicClock>;
pub type WatchList = WatchListService<Box<dyn KeyValueStore>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HomeSection {
  #[default]
  Popular,
  Recent,
}

impl HomeSection {
  pub fn label(self) -> &'static str {
    match self {
      HomeSection::Popular => "Popular",
      HomeSection::Recent => "Recently Added",
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      HomeSection::Popular => HomeSection::Recent,
      HomeSection::Recent => HomeSection::Popular,
    }
  }
}

#[derive(Default)]
pub struct HomeState {
  /// `None` is the "All" tab.
  pub category: Option<String>,
  pub section: HomeSection,
  pub list_state: ListState,
}

#[derive(Default)]
pub struct SearchState {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  /// Keys go to the query box rather than the result list.
  pub editing: bool,
  pub results: Vec<String>,
  pub list_state: ListState,
  /// Whether a query has been run since the box was last edited.
  pub searched: bool,
}

pub struct MyListState {
  pub tab: ListKind,
  pub list_state: ListState,
}

impl Default for MyListState {
  fn default() -> Self {
    Self { tab: ListKind::Saved, list_state: ListState::default() }
  }
}

pub struct WatchScreen {
  pub player: FullPlayer<MpvMedia>,
  pub related: Vec<String>,
  pub list_state: ListState,
}

/// Screen regions recorded during the last draw, for mouse hit-testing.
#[derive(Debug, Default, Clone, Copy)]
pub struct HitAreas {
  pub feed: Option<Rect>,
  pub scrub_bar: Option<Rect>,
  pub seek_bar: Option<Rect>,
}

/// What the left mouse button grabbed when it went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerGrab {
  Feed { row: u16 },
  Scrub,
  Seek,
}

pub struct App {
  pub catalog: Catalog,
  pub nav: Navigator,
  pub watchlist: WatchList,
  pub theme_index: usize,
  pub audio_only: bool,
  config: Config,
  tuning: FeedTuning,
  pub home: HomeState,
  pub search: SearchState,
  pub my_list: MyListState,
  pub watch: Option<WatchScreen>,
  pub discover: Option<Feed>,
  pub hits: HitAreas,
  pub pointer: Option<PointerGrab>,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  pub should_quit: bool,
  /// Reference date for relative upload dates.
  pub today: NaiveDate,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(catalog: Catalog, store: Box<dyn KeyValueStore>, config: Config, start: Route, audio_only: bool) -> Self {
    let tuning = config.feed_tuning();
    let mut app = Self {
      catalog,
      nav: Navigator::new(start),
      watchlist: WatchListService::new(store),
      theme_index: theme_index(config.theme_name.as_deref()),
      audio_only,
      config,
      tuning,
      home: HomeState::default(),
      search: SearchState::default(),
      my_list: MyListState::default(),
      watch: None,
      discover: None,
      hits: HitAreas::default(),
      pointer: None,
      last_error: None,
      status_message: None,
      should_quit: false,
      today: Local::now().date_naive(),
      error_time: None,
    };
    app.home.list_state.select(Some(0));
    app.sync_screens();
    app
  }

  pub fn theme(&self) -> &'static Theme {
    // theme_index is kept in range by theme_index() and next_theme().
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    warn!(msg = %msg, "app: error shown");
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  // --- Routing ---

  pub fn route(&self) -> &Route {
    self.nav.current()
  }

  pub fn go_to(&mut self, route: Route) {
    if let Route::Watch(id) = &route
      && self.catalog.get(id).is_none()
    {
      self.set_error(format!("Video '{}' not found", id));
      return;
    }
    if route == Route::Search {
      self.search.editing = true;
    }
    self.nav.go_to(route);
    self.sync_screens();
  }

  /// Go back one screen. Returns `false` at the root.
  pub fn go_back(&mut self) -> bool {
    let moved = self.nav.go_back();
    if moved {
      self.sync_screens();
    }
    moved
  }

  /// Mount the session the current route needs and drop the ones it does not.
  fn sync_screens(&mut self) {
    let route = self.nav.current().clone();

    if route != Route::Discover
      && let Some(mut feed) = self.discover.take()
    {
      feed.unmount();
    }
    if route == Route::Discover && self.discover.is_none() {
      let media = self.catalog.videos().iter().map(|v| MpvMedia::new(&v.video_url, self.audio_only)).collect();
      self.discover = Some(DiscoverSession::mount(media, self.tuning, MonotonicClock::new()));
      info!(items = self.catalog.len(), "app: discover mounted");
    }

    match &route {
      Route::Watch(id) => {
        if self.watch.as_ref().is_some_and(|w| w.player.video_id() == id) {
          return;
        }
        let Some(video) = self.catalog.get(id) else { return };
        let media = MpvMedia::new(&video.video_url, self.audio_only);
        let player = FullPlayer::new(media, id, &self.watchlist);
        let related = ranking::related_videos(&self.catalog, id, constants().related_limit)
          .into_iter()
          .map(|v| v.id.clone())
          .collect();
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        debug!(video_id = %id, "app: watch mounted");
        self.watch = Some(WatchScreen { player, related, list_state });
      }
      _ => self.watch = None,
    }
  }

  // --- Home ---

  /// Category tabs with their counts, "All" first.
  pub fn home_tabs(&self) -> Vec<(Option<&str>, usize)> {
    let mut tabs = vec![(None, self.catalog.len())];
    tabs.extend(self.catalog.categories().into_iter().map(|c| (Some(c), self.catalog.category_count(c))));
    tabs
  }

  pub fn cycle_category(&mut self, forward: bool) {
    let tabs: Vec<Option<String>> = self.home_tabs().into_iter().map(|(c, _)| c.map(str::to_string)).collect();
    let idx = tabs.iter().position(|c| *c == self.home.category).unwrap_or(0);
    let next = if forward { (idx + 1) % tabs.len() } else { (idx + tabs.len() - 1) % tabs.len() };
    self.home.category = tabs[next].clone();
    self.home.list_state.select(Some(0));
  }

  pub fn toggle_home_section(&mut self) {
    self.home.section = self.home.section.toggled();
    self.home.list_state.select(Some(0));
  }

  pub fn home_videos(&self) -> Vec<&VideoRecord> {
    let c = constants();
    let section = match self.home.section {
      HomeSection::Popular => ranking::popular_videos(&self.catalog, c.popular_limit),
      HomeSection::Recent => ranking::recent_videos(&self.catalog, c.recent_limit),
    };
    ranking::filter_by_category(section, self.home.category.as_deref())
  }

  // --- Search ---

  pub fn run_search(&mut self) {
    let results: Vec<String> =
      ranking::search_videos(&self.catalog, &self.search.input).into_iter().map(|v| v.id.clone()).collect();
    debug!(query = %self.search.input, hits = results.len(), "app: search");
    self.search.searched = true;
    self.search.list_state.select(if results.is_empty() { None } else { Some(0) });
    if !results.is_empty() {
      self.search.editing = false;
    }
    self.search.results = results;
  }

  pub fn search_results(&self) -> Vec<&VideoRecord> {
    self.search.results.iter().filter_map(|id| self.catalog.get(id)).collect()
  }

  // --- My List ---

  pub fn my_list_videos(&self) -> Vec<&VideoRecord> {
    self.watchlist.videos(self.my_list.tab, &self.catalog)
  }

  pub fn toggle_my_list_tab(&mut self) {
    self.my_list.tab = match self.my_list.tab {
      ListKind::Liked => ListKind::Saved,
      ListKind::Saved => ListKind::Liked,
    };
    self.my_list.list_state.select(Some(0));
  }

  pub fn clear_my_list(&mut self) {
    let kind = self.my_list.tab;
    match self.watchlist.clear(kind) {
      Ok(()) => {
        self.status_message = Some(format!("Cleared {} videos", kind.label().to_lowercase()));
        self.my_list.list_state.select(None);
      }
      Err(e) => self.set_error(format!("Failed to clear list: {:#}", e)),
    }
  }

  // --- Watch ---

  pub fn related_videos(&self) -> Vec<&VideoRecord> {
    let Some(watch) = &self.watch else { return Vec::new() };
    watch.related.iter().filter_map(|id| self.catalog.get(id)).collect()
  }

  pub fn toggle_like(&mut self) {
    let Some(watch) = &mut self.watch else { return };
    if let Err(e) = watch.player.toggle_like(&mut self.watchlist) {
      self.set_error(format!("Failed to update likes: {:#}", e));
    }
  }

  pub fn toggle_save(&mut self) {
    let Some(watch) = &mut self.watch else { return };
    if let Err(e) = watch.player.toggle_save(&mut self.watchlist) {
      self.set_error(format!("Failed to update saved list: {:#}", e));
    }
  }

  pub fn toggle_fullscreen(&mut self) {
    let Some(watch) = &mut self.watch else { return };
    if let Err(e) = watch.player.toggle_fullscreen() {
      self.set_error(format!("Fullscreen unavailable: {}", e));
    }
  }

  // --- Discover ---

  pub fn discover_video(&self) -> Option<&VideoRecord> {
    let feed = self.discover.as_ref()?;
    self.catalog.videos().get(feed.current_index())
  }

  // --- Event loop hooks ---

  /// Drain media events, fire due feed timers and expire stale errors.
  pub fn check_pending(&mut self) {
    self.expire_error();
    if let Some(feed) = &mut self.discover {
      feed.pump_media(|media| media.poll_events());
      feed.tick();
    }
    if let Some(watch) = &mut self.watch {
      for event in watch.player.media_mut().poll_events() {
        watch.player.on_media_event(event);
      }
    }
  }

  /// How long the event loop may block before a feed timer is due.
  pub fn time_until_next(&self) -> Option<Duration> {
    self.discover.as_ref().and_then(|feed| feed.time_until_next())
  }

  /// Stop every player and cancel pending timers.
  pub fn shutdown(&mut self) {
    if let Some(mut feed) = self.discover.take() {
      feed.unmount();
    }
    self.watch = None;
  }
}

impl Drop for App {
  fn drop(&mut self) {
    self.shutdown();
  }
}

// --- List helpers ---

/// Move a list selection one step, wrapping at both ends.
pub fn step_selection(state: &mut ListState, count: usize, forward: bool) {
  if count == 0 {
    state.select(None);
    return;
  }
  let i = match state.selected() {
    None => 0,
    Some(i) if forward => (i + 1) % count,
    Some(i) => if i == 0 { count - 1 } else { (i - 1).min(count - 1) },
  };
  state.select(Some(i));
}
