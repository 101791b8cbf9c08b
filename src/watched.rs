//! The persisted watch list and its summary statistics.
//!
//! A [`PersistentList`] is read once from a named slot at startup and written
//! back to the same slot after every mutation. Slots live behind the
//! [`SlotStore`] trait: [`FileStore`] keeps one JSON file per slot under the
//! app's data directory, [`MemoryStore`] keeps them in memory for `--ephemeral`
//! sessions.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("storage I/O failed: {0}")]
  Io(#[from] std::io::Error),
  #[error("failed to serialize list: {0}")]
  Serialize(#[from] serde_json::Error),
}

/// A get/set pair keyed by slot name.
pub trait SlotStore {
  fn get(&self, slot: &str) -> Result<Option<String>, StoreError>;
  fn set(&self, slot: &str, value: &str) -> Result<(), StoreError>;
}

/// One `<slot>.json` file per slot, written atomically (temp file + rename).
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  fn slot_path(&self, slot: &str) -> PathBuf {
    self.dir.join(format!("{}.json", slot))
  }
}

impl SlotStore for FileStore {
  fn get(&self, slot: &str) -> Result<Option<String>, StoreError> {
    match std::fs::read_to_string(self.slot_path(slot)) {
      Ok(content) => Ok(Some(content)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn set(&self, slot: &str, value: &str) -> Result<(), StoreError> {
    std::fs::create_dir_all(&self.dir)?;
    let path = self.slot_path(slot);
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, value)?;
    std::fs::rename(&tmp_path, &path)?;
    debug!(path = ?path, bytes = value.len(), "store: slot written");
    Ok(())
  }
}

#[derive(Default)]
pub struct MemoryStore {
  slots: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl SlotStore for MemoryStore {
  fn get(&self, slot: &str) -> Result<Option<String>, StoreError> {
    Ok(self.slots.borrow().get(slot).cloned())
  }

  fn set(&self, slot: &str, value: &str) -> Result<(), StoreError> {
    self.slots.borrow_mut().insert(slot.to_string(), value.to_string());
    Ok(())
  }
}

/// Anything stored in a list that `remove` can address by id.
pub trait Keyed {
  fn key(&self) -> &str;
}

pub struct PersistentList<T> {
  slot: String,
  items: Vec<T>,
  store: Box<dyn SlotStore>,
}

impl<T: Serialize + DeserializeOwned> PersistentList<T> {
  /// Read `slot`, falling back to `default` when it is absent or unparseable.
  pub fn load(store: Box<dyn SlotStore>, slot: &str, default: Vec<T>) -> Self {
    let items = match store.get(slot) {
      Ok(Some(raw)) => match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
          warn!(slot, err = %e, "store: slot unparseable, using default");
          default
        }
      },
      Ok(None) => default,
      Err(e) => {
        warn!(slot, err = %e, "store: slot unreadable, using default");
        default
      }
    };
    Self { slot: slot.to_string(), items, store }
  }

  pub fn items(&self) -> &[T] {
    &self.items
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Overwrite the list and persist it to the slot it was loaded from.
  pub fn replace(&mut self, items: Vec<T>) -> Result<(), StoreError> {
    self.items = items;
    self.persist()
  }

  pub fn push(&mut self, item: T) -> Result<(), StoreError> {
    let mut items = std::mem::take(&mut self.items);
    items.push(item);
    self.replace(items)
  }

  fn persist(&self) -> Result<(), StoreError> {
    let json = serde_json::to_string(&self.items)?;
    self.store.set(&self.slot, &json)
  }
}

impl<T: Keyed + Serialize + DeserializeOwned> PersistentList<T> {
  pub fn remove(&mut self, id: &str) -> Result<(), StoreError> {
    let mut items = std::mem::take(&mut self.items);
    items.retain(|item| item.key() != id);
    self.replace(items)
  }

  pub fn find(&self, id: &str) -> Option<&T> {
    self.items.iter().find(|item| item.key() == id)
  }

  pub fn contains(&self, id: &str) -> bool {
    self.find(id).is_some()
  }
}

/// A movie the user rated and kept. Field names match the stored JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedEntry {
  #[serde(rename = "imdbID")]
  pub id: String,
  #[serde(rename = "Title")]
  pub title: String,
  #[serde(rename = "Poster")]
  pub poster: String,
  /// Minutes.
  pub runtime: u32,
  #[serde(rename = "imdbRating")]
  pub imdb_rating: f64,
  #[serde(rename = "userRating")]
  pub user_rating: u8,
}

impl Keyed for WatchedEntry {
  fn key(&self) -> &str {
    &self.id
  }
}

/// Arithmetic mean. The mean of nothing is 0.
pub fn average(values: &[f64]) -> f64 {
  if values.is_empty() {
    return 0.0;
  }
  values.iter().sum::<f64>() / values.len() as f64
}

/// Derived on every read; lists are small.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchedSummary {
  pub count: usize,
  pub avg_imdb_rating: f64,
  pub avg_user_rating: f64,
  pub avg_runtime: f64,
}

impl WatchedSummary {
  pub fn of(entries: &[WatchedEntry]) -> Self {
    let field = |f: fn(&WatchedEntry) -> f64| entries.iter().map(f).collect::<Vec<_>>();
    Self {
      count: entries.len(),
      avg_imdb_rating: average(&field(|e| e.imdb_rating)),
      avg_user_rating: average(&field(|e| f64::from(e.user_rating))),
      avg_runtime: average(&field(|e| f64::from(e.runtime))),
    }
  }

  pub fn imdb_label(&self) -> String {
    format!("{:.2}", self.avg_imdb_rating)
  }

  pub fn user_label(&self) -> String {
    format!("{:.2}", self.avg_user_rating)
  }

  pub fn runtime_label(&self) -> String {
    format!("{:.0} min", self.avg_runtime)
  }
}
