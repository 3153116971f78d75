//! Persisted domain model.
//!
//! # Responsibility
//! - Define the note identity and the flat record written to storage.
//!
//! # Invariants
//! - A `NoteId` never changes for the lifetime of a note, including across
//!   save/restore cycles.

pub mod note;
