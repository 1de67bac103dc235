//! Navigation state machine for the short-form discover feed.
//!
//! The controller owns `FeedState` and is the only thing that mutates it.
//! Raw gestures (drags, wheel notches) are classified into one-step advance
//! requests; a settle lock keeps transitions strictly serialized, and an
//! interaction claim (a scrub bar being dragged) mutes gesture handling.
//! Delays are `Timers` entries fired from `tick`, so tests drive time with a
//! `ManualClock` instead of sleeping.

use std::time::Duration;
use tracing::{debug, info};

use crate::constants::constants;
use crate::timers::{Clock, Timers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Next,
  Prev,
}

/// Delays and thresholds that shape gesture handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedTuning {
  /// How long the transition lock is held after an index change.
  pub settle_delay: Duration,
  /// Minimum drag displacement (px) that counts as a swipe.
  pub swipe_threshold_px: f32,
  /// Quiet period after the last wheel event before it is classified.
  pub wheel_debounce: Duration,
  /// Minimum accumulated wheel delta that counts as a scroll.
  pub wheel_min_delta: f32,
  /// Pause between a natural playback end and the automatic advance.
  pub end_grace: Duration,
  /// How long gestures stay muted after an embedded control lets go.
  pub interaction_cooldown: Duration,
}

impl Default for FeedTuning {
  fn default() -> Self {
    let c = constants();
    Self {
      settle_delay: Duration::from_millis(c.settle_delay_ms),
      swipe_threshold_px: c.swipe_threshold_px,
      wheel_debounce: Duration::from_millis(c.wheel_debounce_ms),
      wheel_min_delta: c.wheel_min_delta,
      end_grace: Duration::from_millis(c.end_grace_ms),
      interaction_cooldown: Duration::from_millis(c.interaction_cooldown_ms),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedState {
  pub current_index: usize,
  pub is_transitioning: bool,
  pub is_user_interacting: bool,
}

/// Inputs accepted by the controller, abstracted from their event source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedInput {
  RequestAdvance(Direction),
  /// Pointer/touch pressed at vertical position `y` (px).
  GestureStart { y: f32 },
  /// Pointer/touch released at vertical position `y` (px).
  GestureEnd { y: f32 },
  /// One wheel event; positive scrolls towards the next item.
  Wheel { delta: f32 },
  /// An embedded control took over the pointer.
  InteractionClaimed,
  InteractionReleased,
  /// The item at `index` finished playing on its own.
  PlaybackNaturallyEnded { index: usize },
}

/// Notifications sent to subscribers after the state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
  IndexChanged { from: usize, to: usize },
  TransitionSettled,
  InteractionChanged { interacting: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedTimer {
  SettleRelease,
  WheelDebounce,
  AutoAdvance,
  InteractionCooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&FeedEvent) + Send>;

pub struct FeedController<C: Clock> {
  clock: C,
  tuning: FeedTuning,
  len: usize,
  state: FeedState,
  timers: Timers<FeedTimer>,
  gesture_origin: Option<f32>,
  wheel_accum: f32,
  observers: Vec<(SubscriptionId, Observer)>,
  next_subscription: u64,
  mounted: bool,
}

impl<C: Clock> FeedController<C> {
  /// Mount a feed over `len` items, starting at index 0.
  pub fn new(len: usize, tuning: FeedTuning, clock: C) -> Self {
    Self {
      clock,
      tuning,
      len,
      state: FeedState::default(),
      timers: Timers::new(),
      gesture_origin: None,
      wheel_accum: 0.0,
      observers: Vec::new(),
      next_subscription: 0,
      mounted: true,
    }
  }

  pub fn state(&self) -> FeedState {
    self.state
  }

  pub fn current_index(&self) -> usize {
    self.state.current_index
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Register an observer called synchronously after every state change.
  pub fn subscribe(&mut self, observer: impl FnMut(&FeedEvent) + Send + 'static) -> SubscriptionId {
    let id = SubscriptionId(self.next_subscription);
    self.next_subscription += 1;
    self.observers.push((id, Box::new(observer)));
    id
  }

  pub fn unsubscribe(&mut self, id: SubscriptionId) {
    self.observers.retain(|(sid, _)| *sid != id);
  }

  fn notify(&mut self, event: FeedEvent) {
    for (_, observer) in &mut self.observers {
      observer(&event);
    }
  }

  /// Earliest pending timer deadline on the controller's clock.
  pub fn next_deadline(&self) -> Option<Duration> {
    self.timers.next_deadline()
  }

  /// Time left until the earliest pending timer is due.
  pub fn time_until_next(&self) -> Option<Duration> {
    self.next_deadline().map(|deadline| deadline.saturating_sub(self.clock.now()))
  }

  /// Tear the session down: every pending timer is cancelled and further
  /// input is ignored.
  pub fn unmount(&mut self) {
    self.timers.cancel_all();
    self.gesture_origin = None;
    self.wheel_accum = 0.0;
    self.mounted = false;
    debug!("feed: unmounted");
  }

  pub fn handle(&mut self, input: FeedInput) {
    if !self.mounted {
      return;
    }
    match input {
      FeedInput::RequestAdvance(direction) => {
        self.request_advance(direction);
      }
      FeedInput::GestureStart { y } => self.gesture_start(y),
      FeedInput::GestureEnd { y } => self.gesture_end(y),
      FeedInput::Wheel { delta } => self.wheel(delta),
      FeedInput::InteractionClaimed => self.claim_interaction(),
      FeedInput::InteractionReleased => self.release_interaction(),
      FeedInput::PlaybackNaturallyEnded { index } => self.playback_ended(index),
    }
  }

  /// Fire every timer that is due on the controller's clock.
  pub fn tick(&mut self) {
    if !self.mounted {
      return;
    }
    let now = self.clock.now();
    for timer in self.timers.drain_due(now) {
      match timer {
        FeedTimer::SettleRelease => {
          self.state.is_transitioning = false;
          debug!(index = self.state.current_index, "feed: transition settled");
          self.notify(FeedEvent::TransitionSettled);
        }
        FeedTimer::WheelDebounce => {
          let delta = std::mem::take(&mut self.wheel_accum);
          if delta.abs() > self.tuning.wheel_min_delta {
            let direction = if delta > 0.0 { Direction::Next } else { Direction::Prev };
            self.request_advance(direction);
          } else {
            debug!(delta, "feed: wheel below threshold");
          }
        }
        FeedTimer::AutoAdvance => {
          self.request_advance(Direction::Next);
        }
        FeedTimer::InteractionCooldown => {
          self.state.is_user_interacting = false;
          self.notify(FeedEvent::InteractionChanged { interacting: false });
        }
      }
    }
  }

  /// Move one step in `direction`. Returns whether the index changed.
  ///
  /// Rejected while a transition is settling, while an embedded control
  /// claims the pointer, and at either end of the feed.
  pub fn request_advance(&mut self, direction: Direction) -> bool {
    if !self.mounted {
      return false;
    }
    if self.state.is_transitioning || self.state.is_user_interacting {
      debug!(?direction, state = ?self.state, "feed: advance rejected (locked)");
      return false;
    }
    let from = self.state.current_index;
    let to = match direction {
      Direction::Next if from + 1 < self.len => from + 1,
      Direction::Prev if from > 0 => from - 1,
      _ => {
        debug!(?direction, index = from, "feed: advance rejected (edge)");
        return false;
      }
    };

    self.state.is_transitioning = true;
    self.state.current_index = to;
    // A pending auto-advance belonged to the item we just left.
    self.timers.cancel(FeedTimer::AutoAdvance);
    self.timers.schedule(FeedTimer::SettleRelease, self.clock.now(), self.tuning.settle_delay);
    info!(from, to, "feed: advanced");
    self.notify(FeedEvent::IndexChanged { from, to });
    true
  }

  fn gesture_start(&mut self, y: f32) {
    if self.state.is_user_interacting {
      return;
    }
    self.gesture_origin = Some(y);
  }

  fn gesture_end(&mut self, y: f32) {
    let origin = self.gesture_origin.take();
    if self.state.is_user_interacting {
      self.timers.schedule(FeedTimer::InteractionCooldown, self.clock.now(), self.tuning.interaction_cooldown);
      return;
    }
    let Some(origin) = origin else { return };
    if self.state.is_transitioning {
      return;
    }
    // Dragging upwards (origin below release point) reveals the next item.
    let displacement = origin - y;
    if displacement.abs() > self.tuning.swipe_threshold_px {
      let direction = if displacement > 0.0 { Direction::Next } else { Direction::Prev };
      self.request_advance(direction);
    } else {
      debug!(displacement, "feed: drag below threshold");
    }
  }

  fn wheel(&mut self, delta: f32) {
    if self.state.is_user_interacting || self.state.is_transitioning {
      return;
    }
    self.wheel_accum += delta;
    self.timers.schedule(FeedTimer::WheelDebounce, self.clock.now(), self.tuning.wheel_debounce);
  }

  fn claim_interaction(&mut self) {
    self.timers.cancel(FeedTimer::InteractionCooldown);
    self.timers.cancel(FeedTimer::WheelDebounce);
    self.wheel_accum = 0.0;
    self.gesture_origin = None;
    if !self.state.is_user_interacting {
      self.state.is_user_interacting = true;
      self.notify(FeedEvent::InteractionChanged { interacting: true });
    }
  }

  fn release_interaction(&mut self) {
    if self.state.is_user_interacting {
      self.timers.schedule(FeedTimer::InteractionCooldown, self.clock.now(), self.tuning.interaction_cooldown);
    }
  }

  fn playback_ended(&mut self, index: usize) {
    if index != self.state.current_index {
      debug!(index, current = self.state.current_index, "feed: ignoring end from inactive item");
      return;
    }
    if self.state.is_transitioning || self.state.is_user_interacting || index + 1 >= self.len {
      return;
    }
    self.timers.schedule(FeedTimer::AutoAdvance, self.clock.now(), self.tuning.end_grace);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::timers::ManualClock;
  use std::sync::{Arc, Mutex};

  fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
  }

  fn tuning() -> FeedTuning {
    FeedTuning {
      settle_delay: ms(600),
      swipe_threshold_px: 50.0,
      wheel_debounce: ms(10),
      wheel_min_delta: 5.0,
      end_grace: ms(500),
      interaction_cooldown: ms(100),
    }
  }

  fn feed(len: usize) -> (FeedController<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    (FeedController::new(len, tuning(), clock.clone()), clock)
  }

  fn wait(feed: &mut FeedController<ManualClock>, clock: &ManualClock, n: u64) {
    clock.advance(ms(n));
    feed.tick();
  }

  // --- request_advance ---

  #[test]
  fn prev_at_start_is_noop() {
    let (mut feed, _) = feed(12);
    assert!(!feed.request_advance(Direction::Prev));
    assert_eq!(feed.current_index(), 0);
    assert!(!feed.state().is_transitioning);
  }

  #[test]
  fn next_at_end_is_noop() {
    let (mut feed, clock) = feed(3);
    assert!(feed.request_advance(Direction::Next));
    wait(&mut feed, &clock, 600);
    assert!(feed.request_advance(Direction::Next));
    wait(&mut feed, &clock, 600);
    assert_eq!(feed.current_index(), 2);
    assert!(!feed.request_advance(Direction::Next));
    assert_eq!(feed.current_index(), 2);
  }

  #[test]
  fn two_requests_in_settle_window_advance_once() {
    let (mut feed, clock) = feed(12);
    feed.handle(FeedInput::RequestAdvance(Direction::Next));
    wait(&mut feed, &clock, 300);
    feed.handle(FeedInput::RequestAdvance(Direction::Next));
    assert_eq!(feed.current_index(), 1);
    wait(&mut feed, &clock, 299);
    assert!(feed.state().is_transitioning);
    wait(&mut feed, &clock, 1);
    assert!(!feed.state().is_transitioning);
    feed.handle(FeedInput::RequestAdvance(Direction::Next));
    assert_eq!(feed.current_index(), 2);
  }

  #[test]
  fn prev_is_symmetric() {
    let (mut feed, clock) = feed(5);
    feed.request_advance(Direction::Next);
    wait(&mut feed, &clock, 600);
    assert!(feed.request_advance(Direction::Prev));
    assert_eq!(feed.current_index(), 0);
  }

  #[test]
  fn empty_feed_never_moves() {
    let (mut feed, _) = feed(0);
    assert!(!feed.request_advance(Direction::Next));
    assert!(!feed.request_advance(Direction::Prev));
    assert_eq!(feed.current_index(), 0);
  }

  // --- gestures ---

  #[test]
  fn swipe_up_past_threshold_advances() {
    let (mut feed, _) = feed(12);
    feed.handle(FeedInput::GestureStart { y: 400.0 });
    feed.handle(FeedInput::GestureEnd { y: 300.0 });
    assert_eq!(feed.current_index(), 1);
  }

  #[test]
  fn huge_swipe_is_still_one_step() {
    let (mut feed, _) = feed(12);
    feed.handle(FeedInput::GestureStart { y: 5000.0 });
    feed.handle(FeedInput::GestureEnd { y: 0.0 });
    assert_eq!(feed.current_index(), 1);
  }

  #[test]
  fn swipe_down_goes_back() {
    let (mut feed, clock) = feed(12);
    feed.request_advance(Direction::Next);
    wait(&mut feed, &clock, 600);
    feed.handle(FeedInput::GestureStart { y: 100.0 });
    feed.handle(FeedInput::GestureEnd { y: 200.0 });
    assert_eq!(feed.current_index(), 0);
  }

  #[test]
  fn sub_threshold_drag_is_discarded() {
    let (mut feed, _) = feed(12);
    feed.handle(FeedInput::GestureStart { y: 100.0 });
    feed.handle(FeedInput::GestureEnd { y: 50.0 });
    assert_eq!(feed.state(), FeedState::default());
  }

  #[test]
  fn gesture_end_without_start_is_ignored() {
    let (mut feed, _) = feed(12);
    feed.handle(FeedInput::GestureEnd { y: 0.0 });
    assert_eq!(feed.current_index(), 0);
  }

  // --- wheel ---

  #[test]
  fn wheel_is_debounced_and_accumulated() {
    let (mut feed, clock) = feed(12);
    for _ in 0..3 {
      feed.handle(FeedInput::Wheel { delta: 2.0 });
      wait(&mut feed, &clock, 5);
    }
    assert_eq!(feed.current_index(), 0);
    wait(&mut feed, &clock, 5);
    assert_eq!(feed.current_index(), 1);
  }

  #[test]
  fn small_wheel_is_ignored() {
    let (mut feed, clock) = feed(12);
    feed.handle(FeedInput::Wheel { delta: 4.0 });
    wait(&mut feed, &clock, 20);
    assert_eq!(feed.current_index(), 0);
    // The accumulator resets once the debounce fires.
    feed.handle(FeedInput::Wheel { delta: 4.0 });
    wait(&mut feed, &clock, 20);
    assert_eq!(feed.current_index(), 0);
  }

  #[test]
  fn negative_wheel_goes_back() {
    let (mut feed, clock) = feed(12);
    feed.request_advance(Direction::Next);
    wait(&mut feed, &clock, 600);
    feed.handle(FeedInput::Wheel { delta: -120.0 });
    wait(&mut feed, &clock, 10);
    assert_eq!(feed.current_index(), 0);
  }

  #[test]
  fn swipe_during_settle_is_dropped() {
    let (mut feed, clock) = feed(12);
    feed.request_advance(Direction::Next);
    wait(&mut feed, &clock, 200);
    feed.handle(FeedInput::GestureStart { y: 400.0 });
    feed.handle(FeedInput::GestureEnd { y: 0.0 });
    assert_eq!(feed.current_index(), 1);
    wait(&mut feed, &clock, 400);
    assert!(!feed.state().is_transitioning);
    assert_eq!(feed.current_index(), 1);
  }

  #[test]
  fn wheel_during_transition_is_dropped() {
    let (mut feed, clock) = feed(12);
    feed.request_advance(Direction::Next);
    feed.handle(FeedInput::Wheel { delta: 100.0 });
    wait(&mut feed, &clock, 600);
    wait(&mut feed, &clock, 600);
    assert_eq!(feed.current_index(), 1);
  }

  // --- interaction claims ---

  #[test]
  fn claimed_interaction_suppresses_gestures() {
    let (mut feed, clock) = feed(12);
    feed.handle(FeedInput::InteractionClaimed);
    feed.handle(FeedInput::GestureStart { y: 400.0 });
    feed.handle(FeedInput::GestureEnd { y: 0.0 });
    feed.handle(FeedInput::Wheel { delta: 100.0 });
    wait(&mut feed, &clock, 50);
    assert_eq!(feed.current_index(), 0);
    assert!(!feed.request_advance(Direction::Next));
  }

  #[test]
  fn release_has_cooldown() {
    let (mut feed, clock) = feed(12);
    feed.handle(FeedInput::InteractionClaimed);
    feed.handle(FeedInput::InteractionReleased);
    wait(&mut feed, &clock, 99);
    assert!(feed.state().is_user_interacting);
    assert!(!feed.request_advance(Direction::Next));
    wait(&mut feed, &clock, 1);
    assert!(!feed.state().is_user_interacting);
    assert!(feed.request_advance(Direction::Next));
  }

  #[test]
  fn gesture_end_while_interacting_starts_cooldown() {
    let (mut feed, clock) = feed(12);
    feed.handle(FeedInput::InteractionClaimed);
    feed.handle(FeedInput::GestureEnd { y: 10.0 });
    wait(&mut feed, &clock, 100);
    assert!(!feed.state().is_user_interacting);
  }

  #[test]
  fn reclaim_cancels_pending_cooldown() {
    let (mut feed, clock) = feed(12);
    feed.handle(FeedInput::InteractionClaimed);
    feed.handle(FeedInput::InteractionReleased);
    wait(&mut feed, &clock, 50);
    feed.handle(FeedInput::InteractionClaimed);
    wait(&mut feed, &clock, 200);
    assert!(feed.state().is_user_interacting);
  }

  // --- natural end ---

  #[test]
  fn natural_end_advances_after_grace() {
    let (mut feed, clock) = feed(12);
    feed.handle(FeedInput::PlaybackNaturallyEnded { index: 0 });
    wait(&mut feed, &clock, 499);
    assert_eq!(feed.current_index(), 0);
    wait(&mut feed, &clock, 1);
    assert_eq!(feed.current_index(), 1);
  }

  #[test]
  fn natural_end_at_last_index_does_not_loop() {
    let (mut feed, clock) = feed(2);
    feed.request_advance(Direction::Next);
    wait(&mut feed, &clock, 600);
    feed.handle(FeedInput::PlaybackNaturallyEnded { index: 1 });
    wait(&mut feed, &clock, 1000);
    assert_eq!(feed.current_index(), 1);
  }

  #[test]
  fn natural_end_ignored_while_transitioning_or_interacting() {
    let (mut feed, clock) = feed(12);
    feed.request_advance(Direction::Next);
    feed.handle(FeedInput::PlaybackNaturallyEnded { index: 1 });
    wait(&mut feed, &clock, 1200);
    assert_eq!(feed.current_index(), 1);

    feed.handle(FeedInput::InteractionClaimed);
    feed.handle(FeedInput::PlaybackNaturallyEnded { index: 1 });
    wait(&mut feed, &clock, 1000);
    assert_eq!(feed.current_index(), 1);
  }

  #[test]
  fn natural_end_from_inactive_item_is_ignored() {
    let (mut feed, clock) = feed(12);
    feed.handle(FeedInput::PlaybackNaturallyEnded { index: 4 });
    wait(&mut feed, &clock, 1000);
    assert_eq!(feed.current_index(), 0);
  }

  #[test]
  fn manual_advance_cancels_pending_auto_advance() {
    let (mut feed, clock) = feed(12);
    feed.handle(FeedInput::PlaybackNaturallyEnded { index: 0 });
    wait(&mut feed, &clock, 100);
    feed.request_advance(Direction::Next);
    wait(&mut feed, &clock, 2000);
    assert_eq!(feed.current_index(), 1);
  }

  // --- lifecycle / observers ---

  #[test]
  fn unmount_cancels_pending_timers() {
    let (mut feed, clock) = feed(12);
    feed.request_advance(Direction::Next);
    feed.handle(FeedInput::Wheel { delta: 50.0 });
    feed.unmount();
    assert_eq!(feed.next_deadline(), None);
    wait(&mut feed, &clock, 5000);
    assert!(feed.state().is_transitioning);
    assert_eq!(feed.current_index(), 1);
    assert!(!feed.request_advance(Direction::Next));
  }

  #[test]
  fn unmount_cancels_pending_auto_advance() {
    let (mut feed, clock) = feed(12);
    feed.request_advance(Direction::Next);
    wait(&mut feed, &clock, 600);
    feed.handle(FeedInput::PlaybackNaturallyEnded { index: 1 });
    assert!(feed.next_deadline().is_some());
    feed.unmount();
    assert_eq!(feed.next_deadline(), None);
    wait(&mut feed, &clock, 1000);
    assert_eq!(feed.current_index(), 1);
  }

  #[test]
  fn time_until_next_counts_down() {
    let (mut feed, clock) = feed(12);
    assert_eq!(feed.time_until_next(), None);
    feed.request_advance(Direction::Next);
    clock.advance(ms(250));
    assert_eq!(feed.time_until_next(), Some(ms(350)));
  }

  #[test]
  fn observers_see_index_changes() {
    let (mut feed, clock) = feed(12);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = feed.subscribe(move |e| sink.lock().unwrap().push(*e));
    feed.request_advance(Direction::Next);
    wait(&mut feed, &clock, 600);
    feed.unsubscribe(id);
    feed.request_advance(Direction::Next);
    assert_eq!(*seen.lock().unwrap(), [FeedEvent::IndexChanged { from: 0, to: 1 }, FeedEvent::TransitionSettled]);
  }
}
