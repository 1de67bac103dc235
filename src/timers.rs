//! Deferred callbacks for the UI event loop.
//!
//! Nothing here sleeps. A `Timers` set remembers when each pending callback is
//! due; the owner polls `drain_due` with the current `Clock` reading and acts
//! on whatever fired. Dropping or clearing the set cancels everything pending.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source measured from an arbitrary origin.
pub trait Clock {
  fn now(&self) -> Duration;
}

/// Wall-clock backed `Clock`.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
  origin: Instant,
}

impl MonotonicClock {
  pub fn new() -> Self {
    Self { origin: Instant::now() }
  }
}

impl Default for MonotonicClock {
  fn default() -> Self {
    Self::new()
  }
}

impl Clock for MonotonicClock {
  fn now(&self) -> Duration {
    self.origin.elapsed()
  }
}

/// Hand-advanced `Clock`; clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
  millis: Arc<AtomicU64>,
}

impl ManualClock {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn advance(&self, by: Duration) {
    self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
  }
}

impl Clock for ManualClock {
  fn now(&self) -> Duration {
    Duration::from_millis(self.millis.load(Ordering::SeqCst))
  }
}

/// Pending deferred callbacks keyed by `K`. At most one entry per key:
/// scheduling an existing key replaces its deadline.
#[derive(Debug, Clone)]
pub struct Timers<K> {
  pending: Vec<(K, Duration)>,
}

impl<K> Default for Timers<K> {
  fn default() -> Self {
    Self { pending: Vec::new() }
  }
}

impl<K: Copy + PartialEq> Timers<K> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn schedule(&mut self, key: K, now: Duration, delay: Duration) {
    self.cancel(key);
    self.pending.push((key, now + delay));
  }

  pub fn cancel(&mut self, key: K) {
    self.pending.retain(|(k, _)| *k != key);
  }

  pub fn cancel_all(&mut self) {
    self.pending.clear();
  }

  pub fn is_empty(&self) -> bool {
    self.pending.is_empty()
  }

  /// Earliest pending deadline, used to bound the event-loop poll timeout.
  pub fn next_deadline(&self) -> Option<Duration> {
    self.pending.iter().map(|(_, due)| *due).min()
  }

  /// Remove and return every key due at `now`, earliest first.
  pub fn drain_due(&mut self, now: Duration) -> Vec<K> {
    let mut due: Vec<(K, Duration)> = Vec::new();
    self.pending.retain(|&(k, at)| {
      if at <= now {
        due.push((k, at));
        false
      } else {
        true
      }
    });
    due.sort_by_key(|&(_, at)| at);
    due.into_iter().map(|(k, _)| k).collect()
  }
}
