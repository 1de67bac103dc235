//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Feed navigation
  pub settle_delay_ms: u64,
  pub swipe_threshold_px: f32,
  pub wheel_debounce_ms: u64,
  pub wheel_min_delta: f32,
  pub end_grace_ms: u64,
  pub interaction_cooldown_ms: u64,

  // Short-form playback
  pub preview_window_secs: f64,
  pub default_volume: f32,

  // Full player
  pub skip_secs: f64,
  pub volume_step: f32,

  // Home / watch sections
  pub popular_limit: usize,
  pub recent_limit: usize,
  pub related_limit: usize,

  // Terminal
  pub cell_height_px: f32,
  pub wheel_delta_per_notch: f32,
  pub error_dismiss_secs: u64,

  // mpv
  pub mpv_socket_prefix: String,
  pub mpv_connect_attempts: u32,
  pub mpv_connect_interval_ms: u64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
