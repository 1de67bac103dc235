//! The media playback primitive both players drive.
//!
//! Players only issue the commands on `MediaElement` and only consume
//! `MediaEvent`s. The concrete backend lives in `mpv`.

use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekTarget {
  /// Fraction of the total duration, `0.0..=1.0`.
  Fraction(f64),
  Seconds(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
  Progress { played_fraction: f64, played_seconds: f64 },
  DurationKnown(f64),
  Ended,
  Ready,
  Buffering(bool),
  Error(String),
}

pub trait MediaElement {
  fn play(&mut self);
  fn pause(&mut self);
  fn seek_to(&mut self, target: SeekTarget);
  /// `volume` in `0.0..=1.0`.
  fn set_volume(&mut self, volume: f32);
  fn set_muted(&mut self, muted: bool);
}

/// Platform fullscreen capability for the full player.
pub trait Fullscreen {
  fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()>;
}
