//! Spatial note model.
//!
//! # Responsibility
//! - Define the canonical in-memory note and its persisted record shape.
//!
//! # Invariants
//! - `NoteId::generate()` ids embed creation time plus random bits (UUIDv7);
//!   collisions are not structurally prevented, only astronomically unlikely.
//! - Ids read back from storage are kept verbatim, whatever their format.
//! - `position` does not change after creation.

use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque note identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteId(String);

impl NoteId {
    /// Creates a fresh time-ordered id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A user-authored annotation anchored at a world position.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub position: Point<Real>,
    /// Free text, empty by default.
    pub content: String,
}

impl Note {
    pub fn new(id: NoteId, position: Point<Real>, content: impl Into<String>) -> Self {
        Self {
            id,
            position,
            content: content.into(),
        }
    }

    pub fn to_record(&self) -> NoteRecord {
        NoteRecord {
            id: self.id.to_string(),
            content: self.content.clone(),
            position: [self.position.x, self.position.y, self.position.z],
        }
    }

    pub fn from_record(record: NoteRecord) -> Self {
        let [x, y, z] = record.position;
        Self {
            id: NoteId::from(record.id),
            position: point![x, y, z],
            content: record.content,
        }
    }
}

/// Flat storage shape: `{ "id", "content", "position": [x, y, z] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    pub content: String,
    pub position: [f32; 3],
}
