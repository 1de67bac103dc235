//! Per-item playback adapter for the discover feed.
//!
//! One `ShortPlayer` exists per feed item. It is told whether it is the
//! active item and turns that into play/pause/mute/seek commands on its own
//! media element. Inactive items are paused, muted and parked at 0. Only the
//! first `preview_window` seconds of an item are exposed; reaching the end of
//! that window counts as the item ending.

use tracing::{debug, warn};

use crate::constants::constants;
use crate::media::{MediaElement, MediaEvent, SeekTarget};

/// Adapter-owned playback state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
  pub is_playing: bool,
  /// One-shot play intent granted by the first explicit tap.
  pub can_play: bool,
  pub playhead_secs: f64,
  pub duration_secs: f64,
  /// Set while the scrub bar is held; progress reports are ignored meanwhile.
  pub is_seeking: bool,
  /// The media has loaded far enough to render a frame.
  pub is_ready: bool,
  pub error: Option<String>,
  end_reported: bool,
}

pub struct ShortPlayer<M: MediaElement> {
  media: M,
  is_active: bool,
  preview_window: f64,
  default_volume: f32,
  state: PlaybackState,
}

impl<M: MediaElement> ShortPlayer<M> {
  pub fn new(media: M) -> Self {
    let c = constants();
    Self::with_limits(media, c.preview_window_secs, c.default_volume)
  }

  pub fn with_limits(media: M, preview_window: f64, default_volume: f32) -> Self {
    Self { media, is_active: false, preview_window, default_volume, state: PlaybackState::default() }
  }

  pub fn state(&self) -> &PlaybackState {
    &self.state
  }

  pub fn is_active(&self) -> bool {
    self.is_active
  }

  pub fn media(&self) -> &M {
    &self.media
  }

  pub fn media_mut(&mut self) -> &mut M {
    &mut self.media
  }

  /// Length of the scrubbable window: `min(duration, preview_window)`.
  pub fn scrub_window(&self) -> f64 {
    self.state.duration_secs.min(self.preview_window).max(0.0)
  }

  /// Playhead as shown on the scrub bar, capped at the window.
  pub fn display_secs(&self) -> f64 {
    self.state.playhead_secs.min(self.preview_window)
  }

  /// Scrub bar fill, `0.0..=1.0`.
  pub fn display_fraction(&self) -> f64 {
    let window = self.scrub_window();
    if window > 0.0 { (self.display_secs() / window).clamp(0.0, 1.0) } else { 0.0 }
  }

  /// Whether the "tap to play" affordance should be shown.
  pub fn needs_tap(&self) -> bool {
    self.is_active && !self.state.is_playing
  }

  /// Playback was requested but the media has not loaded yet.
  pub fn is_loading(&self) -> bool {
    self.state.is_playing && !self.state.is_ready
  }

  pub fn set_active(&mut self, active: bool) {
    if active == self.is_active {
      return;
    }
    self.is_active = active;
    self.state.playhead_secs = 0.0;
    self.state.is_seeking = false;
    self.state.end_reported = false;
    self.media.seek_to(SeekTarget::Seconds(0.0));

    if active {
      if self.state.can_play && self.state.error.is_none() {
        self.start_audible();
      } else {
        self.state.is_playing = false;
        debug!("short: activated, waiting for tap");
      }
    } else {
      self.state.is_playing = false;
      self.media.pause();
      self.media.set_muted(true);
    }
  }

  fn start_audible(&mut self) {
    self.media.set_muted(false);
    self.media.set_volume(self.default_volume);
    self.media.play();
    self.state.is_playing = true;
  }

  /// An explicit tap on the item. Grants play intent and toggles playback.
  /// After an error a tap is the only way to retry.
  pub fn tap(&mut self) {
    if !self.is_active {
      return;
    }
    if self.state.error.take().is_some() {
      debug!("short: retrying after error");
      self.state.can_play = true;
      self.start_audible();
      return;
    }
    if self.state.is_playing {
      self.media.pause();
      self.state.is_playing = false;
    } else {
      self.state.can_play = true;
      self.start_audible();
    }
  }

  pub fn seek_start(&mut self) {
    if self.is_active {
      self.state.is_seeking = true;
    }
  }

  /// Move the displayed position while the scrub bar is held.
  pub fn seek_drag(&mut self, fraction: f64) {
    if self.state.is_seeking {
      self.state.playhead_secs = fraction.clamp(0.0, 1.0) * self.scrub_window();
    }
  }

  /// Release the scrub bar and perform the one authoritative seek.
  pub fn seek_end(&mut self) {
    if !self.state.is_seeking {
      return;
    }
    self.state.is_seeking = false;
    if self.state.duration_secs > 0.0 {
      self.media.seek_to(SeekTarget::Seconds(self.state.playhead_secs));
    }
  }

  /// Single click on the scrub bar.
  pub fn seek_click(&mut self, fraction: f64) {
    if !self.is_active || self.state.duration_secs <= 0.0 {
      return;
    }
    self.state.playhead_secs = fraction.clamp(0.0, 1.0) * self.scrub_window();
    self.media.seek_to(SeekTarget::Seconds(self.state.playhead_secs));
  }

  /// Feed a media event in. Returns `true` when the item should be reported
  /// as naturally ended; that happens at most once per activation.
  pub fn on_media_event(&mut self, event: MediaEvent) -> bool {
    match event {
      MediaEvent::Progress { played_seconds, .. } => {
        if !self.is_active || self.state.is_seeking {
          return false;
        }
        self.state.playhead_secs = played_seconds;
        let truncated = self.state.duration_secs > self.preview_window && played_seconds >= self.preview_window;
        if truncated {
          debug!(played_seconds, "short: preview window reached");
          self.media.pause();
          return self.finish();
        }
        false
      }
      MediaEvent::DurationKnown(secs) => {
        self.state.duration_secs = secs;
        false
      }
      MediaEvent::Ended => {
        if !self.is_active {
          return false;
        }
        self.finish()
      }
      MediaEvent::Ready => {
        self.state.is_ready = true;
        false
      }
      MediaEvent::Buffering(_) => false,
      MediaEvent::Error(reason) => {
        warn!(reason = %reason, "short: playback error");
        self.state.is_playing = false;
        self.state.error = Some(reason);
        false
      }
    }
  }

  fn finish(&mut self) -> bool {
    self.state.is_playing = false;
    if self.state.end_reported {
      return false;
    }
    self.state.end_reported = true;
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::media::testing::{MediaCommand, RecordingMedia};

  fn player() -> ShortPlayer<RecordingMedia> {
    ShortPlayer::with_limits(RecordingMedia::default(), 10.0, 0.8)
  }

  fn progress(secs: f64, duration: f64) -> MediaEvent {
    MediaEvent::Progress { played_fraction: secs / duration, played_seconds: secs }
  }

  // --- activation ---

  #[test]
  fn activation_without_intent_stays_paused_and_silent() {
    let mut p = player();
    p.set_active(true);
    assert!(!p.state().is_playing);
    assert!(p.needs_tap());
    let cmds = p.media_mut().take();
    assert_eq!(cmds, [MediaCommand::Seek(SeekTarget::Seconds(0.0))]);
  }

  #[test]
  fn activation_with_intent_autoplays_audibly() {
    let mut p = player();
    p.set_active(true);
    p.tap();
    p.set_active(false);
    p.media_mut().take();

    p.set_active(true);
    assert!(p.state().is_playing);
    assert_eq!(p.state().playhead_secs, 0.0);
    assert_eq!(
      p.media_mut().take(),
      [
        MediaCommand::Seek(SeekTarget::Seconds(0.0)),
        MediaCommand::Muted(false),
        MediaCommand::Volume(0.8),
        MediaCommand::Play,
      ]
    );
  }

  #[test]
  fn deactivation_pauses_mutes_and_rewinds() {
    let mut p = player();
    p.set_active(true);
    p.tap();
    p.on_media_event(MediaEvent::DurationKnown(30.0));
    p.on_media_event(progress(4.0, 30.0));
    p.media_mut().take();

    p.set_active(false);
    assert!(!p.state().is_playing);
    assert_eq!(p.state().playhead_secs, 0.0);
    assert_eq!(
      p.media_mut().take(),
      [MediaCommand::Seek(SeekTarget::Seconds(0.0)), MediaCommand::Pause, MediaCommand::Muted(true)]
    );
  }

  #[test]
  fn repeated_activation_is_idempotent() {
    let mut p = player();
    p.set_active(true);
    p.media_mut().take();
    p.set_active(true);
    assert!(p.media_mut().take().is_empty());
  }

  #[test]
  fn inactive_ignores_progress_and_taps() {
    let mut p = player();
    p.on_media_event(MediaEvent::DurationKnown(30.0));
    assert!(!p.on_media_event(progress(12.0, 30.0)));
    assert_eq!(p.state().playhead_secs, 0.0);
    p.tap();
    assert!(!p.state().can_play);
  }

  // --- tap ---

  #[test]
  fn tap_toggles_playback() {
    let mut p = player();
    p.set_active(true);
    p.tap();
    assert!(p.state().is_playing);
    assert!(p.state().can_play);
    p.tap();
    assert!(!p.state().is_playing);
    assert!(p.state().can_play);
  }

  #[test]
  fn loading_until_media_reports_ready() {
    let mut p = player();
    p.set_active(true);
    assert!(!p.is_loading());
    p.tap();
    assert!(p.is_loading());
    p.on_media_event(MediaEvent::Ready);
    assert!(!p.is_loading());
    assert!(p.state().is_ready);
  }

  // --- preview window ---

  #[test]
  fn long_media_ends_once_at_window() {
    let mut p = player();
    p.set_active(true);
    p.tap();
    p.on_media_event(MediaEvent::DurationKnown(20.0));
    assert!(!p.on_media_event(progress(9.5, 20.0)));
    assert!(p.on_media_event(progress(10.0, 20.0)));
    assert!(!p.on_media_event(progress(10.5, 20.0)));
    assert!(!p.on_media_event(MediaEvent::Ended));
    assert!(!p.state().is_playing);
  }

  #[test]
  fn short_media_ends_on_real_end() {
    let mut p = player();
    p.set_active(true);
    p.tap();
    p.on_media_event(MediaEvent::DurationKnown(8.0));
    assert!(!p.on_media_event(progress(8.0, 8.0)));
    assert!(p.on_media_event(MediaEvent::Ended));
    assert!(!p.on_media_event(MediaEvent::Ended));
  }

  #[test]
  fn end_latch_rearms_on_next_activation() {
    let mut p = player();
    p.set_active(true);
    p.tap();
    p.on_media_event(MediaEvent::DurationKnown(20.0));
    assert!(p.on_media_event(progress(10.0, 20.0)));
    p.set_active(false);
    p.set_active(true);
    assert!(p.on_media_event(progress(10.0, 20.0)));
  }

  #[test]
  fn display_is_capped_to_window() {
    let mut p = player();
    p.set_active(true);
    p.on_media_event(MediaEvent::DurationKnown(596.0));
    assert_eq!(p.scrub_window(), 10.0);
    p.on_media_event(progress(5.0, 596.0));
    assert!((p.display_fraction() - 0.5).abs() < 1e-9);

    let mut short = player();
    short.on_media_event(MediaEvent::DurationKnown(4.0));
    assert_eq!(short.scrub_window(), 4.0);
    assert_eq!(short.display_fraction(), 0.0);
  }

  // --- seeking ---

  #[test]
  fn seeking_suppresses_progress_and_seeks_once() {
    let mut p = player();
    p.set_active(true);
    p.tap();
    p.on_media_event(MediaEvent::DurationKnown(60.0));
    p.media_mut().take();

    p.seek_start();
    p.seek_drag(0.25);
    p.seek_drag(0.5);
    assert!(!p.on_media_event(progress(12.0, 60.0)));
    assert_eq!(p.state().playhead_secs, 5.0);
    assert!(p.media_mut().take().is_empty());

    p.seek_end();
    assert!(!p.state().is_seeking);
    assert_eq!(p.media_mut().take(), [MediaCommand::Seek(SeekTarget::Seconds(5.0))]);
  }

  #[test]
  fn seek_click_maps_into_window() {
    let mut p = player();
    p.set_active(true);
    p.on_media_event(MediaEvent::DurationKnown(60.0));
    p.media_mut().take();
    p.seek_click(0.3);
    assert_eq!(p.media_mut().take(), [MediaCommand::Seek(SeekTarget::Seconds(3.0))]);
  }

  #[test]
  fn seek_click_without_duration_is_ignored() {
    let mut p = player();
    p.set_active(true);
    p.media_mut().take();
    p.seek_click(0.5);
    assert!(p.media_mut().take().is_empty());
  }

  // --- errors ---

  #[test]
  fn error_blocks_autoplay_until_tap() {
    let mut p = player();
    p.set_active(true);
    p.tap();
    p.on_media_event(MediaEvent::Error("404".into()));
    assert!(!p.state().is_playing);
    assert_eq!(p.state().error.as_deref(), Some("404"));

    p.set_active(false);
    p.media_mut().take();
    p.set_active(true);
    assert!(!p.state().is_playing);
    assert!(!p.media_mut().take().contains(&MediaCommand::Play));

    p.tap();
    assert!(p.state().error.is_none());
    assert!(p.state().is_playing);
  }
}
