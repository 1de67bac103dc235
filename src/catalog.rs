//! The static video catalog.
//!
//! The built-in catalog is embedded from `catalog.ron`; a different file can be
//! supplied on the command line. Records are immutable once loaded and the
//! declaration order is kept, since every sort in `ranking` falls back to it.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Creator {
  pub id: String,
  pub name: String,
  pub avatar_url: String,
  pub subscriber_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VideoRecord {
  pub id: String,
  pub title: String,
  pub description: String,
  pub thumbnail_url: String,
  pub video_url: String,
  /// Length in whole seconds.
  pub duration: u32,
  pub views: u64,
  pub upload_date: NaiveDate,
  pub creator: Creator,
  pub tags: Vec<String>,
  pub category: String,
}

/// Ordered, read-only collection of video records.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
  videos: Vec<VideoRecord>,
}

impl Catalog {
  /// Build a catalog, rejecting duplicate ids.
  pub fn new(videos: Vec<VideoRecord>) -> Result<Self> {
    let mut seen = HashSet::new();
    for video in &videos {
      if !seen.insert(video.id.as_str()) {
        return Err(anyhow!("Duplicate video id '{}' in catalog", video.id));
      }
    }
    Ok(Self { videos })
  }

  pub fn from_ron(source: &str) -> Result<Self> {
    let videos: Vec<VideoRecord> = ron::from_str(source).context("Failed to parse catalog RON")?;
    Self::new(videos)
  }

  /// The catalog compiled into the binary.
  pub fn builtin() -> Result<Self> {
    Self::from_ron(include_str!("../catalog.ron")).context("Built-in catalog is invalid")
  }

  pub fn load(path: &Path) -> Result<Self> {
    let source =
      std::fs::read_to_string(path).with_context(|| format!("Failed to read catalog file {}", path.display()))?;
    Self::from_ron(&source).with_context(|| format!("Invalid catalog file {}", path.display()))
  }

  pub fn videos(&self) -> &[VideoRecord] {
    &self.videos
  }

  pub fn len(&self) -> usize {
    self.videos.len()
  }

  pub fn is_empty(&self) -> bool {
    self.videos.is_empty()
  }

  /// Direct lookup by id. Unknown ids are a normal outcome, not an error.
  pub fn get(&self, id: &str) -> Option<&VideoRecord> {
    self.videos.iter().find(|v| v.id == id)
  }

  /// Distinct categories, sorted alphabetically.
  pub fn categories(&self) -> Vec<&str> {
    let mut categories: Vec<&str> = self.videos.iter().map(|v| v.category.as_str()).collect();
    categories.sort_unstable();
    categories.dedup();
    categories
  }

  pub fn category_count(&self, category: &str) -> usize {
    self.videos.iter().filter(|v| v.category == category).count()
  }
}
