use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::feed::FeedTuning;

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub audio_only: Option<bool>,
  #[serde(default, skip_serializing_if = "FeedOverrides::is_empty")]
  pub feed: FeedOverrides,
}

/// Optional `[feed]` table; any field left out keeps its built-in default.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct FeedOverrides {
  pub settle_delay_ms: Option<u64>,
  pub swipe_threshold_px: Option<f32>,
  pub wheel_debounce_ms: Option<u64>,
  pub wheel_min_delta: Option<f32>,
  pub end_grace_ms: Option<u64>,
  pub interaction_cooldown_ms: Option<u64>,
}

impl FeedOverrides {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "reel") {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(&config_file) {
        match Self::parse(&content) {
          Some(config) => return config,
          None => warn!(path = %config_file.display(), "config: invalid prefs.toml, using defaults"),
        }
      }
    }
    Self::default()
  }

  pub fn parse(content: &str) -> Option<Self> {
    toml::from_str(content).ok()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "reel") {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }

  /// Built-in feed tuning with this config's overrides applied.
  pub fn feed_tuning(&self) -> FeedTuning {
    let mut tuning = FeedTuning::default();
    let o = &self.feed;
    if let Some(ms) = o.settle_delay_ms {
      tuning.settle_delay = Duration::from_millis(ms);
    }
    if let Some(px) = o.swipe_threshold_px {
      tuning.swipe_threshold_px = px;
    }
    if let Some(ms) = o.wheel_debounce_ms {
      tuning.wheel_debounce = Duration::from_millis(ms);
    }
    if let Some(delta) = o.wheel_min_delta {
      tuning.wheel_min_delta = delta;
    }
    if let Some(ms) = o.end_grace_ms {
      tuning.end_grace = Duration::from_millis(ms);
    }
    if let Some(ms) = o.interaction_cooldown_ms {
      tuning.interaction_cooldown = Duration::from_millis(ms);
    }
    tuning
  }
}
