//! Liked/saved lists, persisted through a key-value store.
//!
//! The whole list lives under one key and is read and rewritten on every
//! change. A missing key is the empty list; an unreadable one is logged and
//! treated as empty too.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::catalog::{Catalog, VideoRecord};

const WATCH_LIST_KEY: &str = "watch_list";

pub trait KeyValueStore {
  fn get(&self, key: &str) -> Result<Option<String>>;
  fn set(&mut self, key: &str, value: String) -> Result<()>;
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  /// Store rooted in the platform data directory.
  pub fn default_location() -> Option<Self> {
    ProjectDirs::from("", "", "reel").map(|dirs| Self::new(dirs.data_dir().join("store")))
  }

  fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{}.json", key))
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let path = self.path_for(key);
    match std::fs::read_to_string(&path) {
      Ok(content) => Ok(Some(content)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
  }

  fn set(&mut self, key: &str, value: String) -> Result<()> {
    std::fs::create_dir_all(&self.dir).with_context(|| format!("Failed to create {}", self.dir.display()))?;
    let path = self.path_for(key);
    // Write then rename, so readers never see a partial record.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, value).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, &path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
  }
}

/// In-process store, used when no data directory is available and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    Ok(self.entries.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: String) -> Result<()> {
    self.entries.insert(key.to_string(), value);
    Ok(())
  }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
  fn get(&self, key: &str) -> Result<Option<String>> {
    (**self).get(key)
  }

  fn set(&mut self, key: &str, value: String) -> Result<()> {
    (**self).set(key, value)
  }
}

/// The persisted record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchList {
  #[serde(default)]
  pub liked_ids: Vec<String>,
  #[serde(default)]
  pub saved_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStatus {
  pub liked: bool,
  pub saved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
  Liked,
  Saved,
}

impl ListKind {
  pub fn label(self) -> &'static str {
    match self {
      ListKind::Liked => "Liked",
      ListKind::Saved => "Saved",
    }
  }
}

impl WatchList {
  fn ids_mut(&mut self, kind: ListKind) -> &mut Vec<String> {
    match kind {
      ListKind::Liked => &mut self.liked_ids,
      ListKind::Saved => &mut self.saved_ids,
    }
  }

  pub fn ids(&self, kind: ListKind) -> &[String] {
    match kind {
      ListKind::Liked => &self.liked_ids,
      ListKind::Saved => &self.saved_ids,
    }
  }

  fn set_member(&mut self, kind: ListKind, video_id: &str, member: bool) {
    let ids = self.ids_mut(kind);
    let present = ids.iter().any(|id| id == video_id);
    if member && !present {
      ids.push(video_id.to_string());
    } else if !member && present {
      ids.retain(|id| id != video_id);
    }
  }
}

/// The single access point to the persisted watch list.
#[derive(Debug)]
pub struct WatchListService<S: KeyValueStore> {
  store: S,
}

impl<S: KeyValueStore> WatchListService<S> {
  pub fn new(store: S) -> Self {
    Self { store }
  }

  pub fn load(&self) -> WatchList {
    let raw = match self.store.get(WATCH_LIST_KEY) {
      Ok(Some(raw)) => raw,
      Ok(None) => return WatchList::default(),
      Err(e) => {
        warn!(err = %e, "watchlist: read failed, using empty list");
        return WatchList::default();
      }
    };
    match serde_json::from_str(&raw) {
      Ok(list) => list,
      Err(e) => {
        warn!(err = %e, "watchlist: malformed record, using empty list");
        WatchList::default()
      }
    }
  }

  fn save(&mut self, list: &WatchList) -> Result<()> {
    let raw = serde_json::to_string(list).context("Failed to serialize watch list")?;
    self.store.set(WATCH_LIST_KEY, raw).context("Failed to persist watch list")
  }

  pub fn status(&self, video_id: &str) -> WatchStatus {
    let list = self.load();
    WatchStatus {
      liked: list.liked_ids.iter().any(|id| id == video_id),
      saved: list.saved_ids.iter().any(|id| id == video_id),
    }
  }

  pub fn set_status(&mut self, video_id: &str, status: WatchStatus) -> Result<()> {
    let mut list = self.load();
    list.set_member(ListKind::Liked, video_id, status.liked);
    list.set_member(ListKind::Saved, video_id, status.saved);
    self.save(&list)?;
    debug!(video_id, liked = status.liked, saved = status.saved, "watchlist: updated");
    Ok(())
  }

  /// Flip membership in one list and return the new membership.
  pub fn toggle(&mut self, kind: ListKind, video_id: &str) -> Result<bool> {
    let mut status = self.status(video_id);
    let flag = match kind {
      ListKind::Liked => &mut status.liked,
      ListKind::Saved => &mut status.saved,
    };
    *flag = !*flag;
    let member = *flag;
    self.set_status(video_id, status)?;
    Ok(member)
  }

  pub fn clear(&mut self, kind: ListKind) -> Result<()> {
    let mut list = self.load();
    list.ids_mut(kind).clear();
    self.save(&list)
  }

  /// Records in a list, in catalog order. Ids missing from the catalog are skipped.
  pub fn videos<'a>(&self, kind: ListKind, catalog: &'a Catalog) -> Vec<&'a VideoRecord> {
    let list = self.load();
    let ids = list.ids(kind);
    catalog.videos().iter().filter(|v| ids.contains(&v.id)).collect()
  }
}
