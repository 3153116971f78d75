//! Flat key-value persistence for the note set.
//!
//! # Responsibility
//! - Define the key-value store contract and its SQLite/in-memory backends.
//! - Encode/decode the note collection as one JSON array under one key.
//!
//! # Invariants
//! - Store failures never propagate into the frame tick; `NoteStore` logs and
//!   degrades instead.

pub mod kv;
pub mod note_store;

pub use kv::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StoreError, StoreResult};
pub use note_store::NoteStore;
