//! Note collection persistence adapter.
//!
//! # Invariants
//! - The whole collection is rewritten on every save (no partial updates).
//! - Absent data loads as empty; malformed data loads as empty with a warning.
//! - Save failures leave in-memory state untouched and are only logged.

use super::kv::{KeyValueStore, StoreResult};
use crate::model::note::{Note, NoteRecord};
use log::{debug, warn};

/// Serializes notes as one JSON array under a fixed key.
pub struct NoteStore {
    backend: Box<dyn KeyValueStore>,
    key: String,
}

impl NoteStore {
    pub fn new(backend: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the persisted collection, degrading every failure to "no notes".
    pub fn load(&self) -> Vec<NoteRecord> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("event=notes_load module=store status=empty key={}", self.key);
                return Vec::new();
            }
            Err(err) => {
                warn!(
                    "event=notes_load module=store status=error key={} error={}",
                    self.key, err
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<NoteRecord>>(&raw) {
            Ok(records) => {
                debug!(
                    "event=notes_load module=store status=ok key={} count={}",
                    self.key,
                    records.len()
                );
                records
            }
            Err(err) => {
                warn!(
                    "event=notes_load module=store status=malformed key={} error={}",
                    self.key, err
                );
                Vec::new()
            }
        }
    }

    /// Writes the full collection. Returns whether the write succeeded.
    pub fn save<'a>(&mut self, notes: impl IntoIterator<Item = &'a Note>) -> bool {
        match self.try_save(notes) {
            Ok(count) => {
                debug!(
                    "event=notes_save module=store status=ok key={} count={}",
                    self.key, count
                );
                true
            }
            Err(err) => {
                warn!(
                    "event=notes_save module=store status=error key={} error={}",
                    self.key, err
                );
                false
            }
        }
    }

    fn try_save<'a>(&mut self, notes: impl IntoIterator<Item = &'a Note>) -> StoreResult<usize> {
        let records: Vec<NoteRecord> = notes.into_iter().map(Note::to_record).collect();
        let payload = serde_json::to_string(&records)?;
        self.backend.set(&self.key, &payload)?;
        Ok(records.len())
    }
}
