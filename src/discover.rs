//! A mounted discover feed: the navigation controller plus one playback
//! adapter per item.
//!
//! The session subscribes to the controller and forwards index changes to the
//! adapters as activity changes; adapters report natural ends back as
//! controller input. Adapters never touch the feed index themselves.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::feed::{Direction, FeedController, FeedEvent, FeedInput, FeedState, FeedTuning};
use crate::media::{MediaElement, MediaEvent};
use crate::short_player::ShortPlayer;
use crate::timers::Clock;

pub struct DiscoverSession<M: MediaElement, C: Clock> {
  feed: FeedController<C>,
  players: Vec<ShortPlayer<M>>,
  events_rx: mpsc::UnboundedReceiver<FeedEvent>,
}

impl<M: MediaElement, C: Clock> DiscoverSession<M, C> {
  /// Mount the feed over one media element per item; the first item starts active.
  pub fn mount(media: Vec<M>, tuning: FeedTuning, clock: C) -> Self {
    let mut feed = FeedController::new(media.len(), tuning, clock);
    let (tx, events_rx) = mpsc::unbounded_channel();
    feed.subscribe(move |event| {
      let _ = tx.send(*event);
    });

    let mut players: Vec<ShortPlayer<M>> = media.into_iter().map(ShortPlayer::new).collect();
    if let Some(first) = players.first_mut() {
      first.set_active(true);
    }
    debug!(items = players.len(), "discover: mounted");
    Self { feed, players, events_rx }
  }

  pub fn feed_state(&self) -> FeedState {
    self.feed.state()
  }

  pub fn current_index(&self) -> usize {
    self.feed.current_index()
  }

  pub fn len(&self) -> usize {
    self.players.len()
  }

  pub fn is_empty(&self) -> bool {
    self.players.is_empty()
  }

  pub fn player(&self, index: usize) -> Option<&ShortPlayer<M>> {
    self.players.get(index)
  }

  pub fn active_player(&self) -> Option<&ShortPlayer<M>> {
    self.players.get(self.feed.current_index())
  }

  pub fn active_player_mut(&mut self) -> Option<&mut ShortPlayer<M>> {
    self.players.get_mut(self.feed.current_index())
  }

  pub fn next_deadline(&self) -> Option<Duration> {
    self.feed.next_deadline()
  }

  pub fn time_until_next(&self) -> Option<Duration> {
    self.feed.time_until_next()
  }

  pub fn handle(&mut self, input: FeedInput) {
    self.feed.handle(input);
    self.apply_feed_events();
  }

  pub fn request_advance(&mut self, direction: Direction) {
    self.handle(FeedInput::RequestAdvance(direction));
  }

  /// Fire due timers and apply their effects.
  pub fn tick(&mut self) {
    self.feed.tick();
    self.apply_feed_events();
  }

  /// Route a media event to the adapter for `index`.
  pub fn on_media_event(&mut self, index: usize, event: MediaEvent) {
    let Some(player) = self.players.get_mut(index) else { return };
    if player.on_media_event(event) {
      self.handle(FeedInput::PlaybackNaturallyEnded { index });
    }
  }

  /// Collect pending events from every item's media with `poll` and route them.
  pub fn pump_media(&mut self, mut poll: impl FnMut(&mut M) -> Vec<MediaEvent>) {
    for index in 0..self.players.len() {
      let events = poll(self.players[index].media_mut());
      for event in events {
        self.on_media_event(index, event);
      }
    }
  }

  /// Tap on the active item.
  pub fn tap(&mut self) {
    if let Some(player) = self.active_player_mut() {
      player.tap();
    }
  }

  /// The scrub bar was grabbed. The feed stops interpreting gestures until release.
  pub fn scrub_start(&mut self, fraction: f64) {
    self.handle(FeedInput::InteractionClaimed);
    if let Some(player) = self.active_player_mut() {
      player.seek_start();
      player.seek_drag(fraction);
    }
  }

  pub fn scrub_drag(&mut self, fraction: f64) {
    if let Some(player) = self.active_player_mut() {
      player.seek_drag(fraction);
    }
  }

  pub fn scrub_end(&mut self) {
    if let Some(player) = self.active_player_mut() {
      player.seek_end();
    }
    self.handle(FeedInput::InteractionReleased);
  }

  /// Cancel every pending timer and silence all items.
  pub fn unmount(&mut self) {
    self.feed.unmount();
    for player in &mut self.players {
      player.set_active(false);
    }
    debug!("discover: unmounted");
  }

  fn apply_feed_events(&mut self) {
    while let Ok(event) = self.events_rx.try_recv() {
      if let FeedEvent::IndexChanged { from, to } = event {
        if let Some(player) = self.players.get_mut(from) {
          player.set_active(false);
        }
        if let Some(player) = self.players.get_mut(to) {
          player.set_active(true);
        }
      }
    }
  }
}
