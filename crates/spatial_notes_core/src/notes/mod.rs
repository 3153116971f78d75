//! Spatial notes: markers, hover, editing and deletion.
//!
//! # Responsibility
//! - Keep the note collection, its markers and the stored copy in step.
//! - Host the single modal slot shared by text entry and delete confirmation.
//!
//! # Invariants
//! - Removal is all-or-nothing: marker, pickables, hover and modal together.

pub mod confirm;
pub mod label;
pub mod manager;
pub mod marker;
pub mod modal;

pub use confirm::{ConfirmChoice, DeleteConfirmDialog};
pub use label::{label_text, EMPTY_NOTE_LABEL};
pub use manager::{NoteContext, NoteManager};
pub use marker::MarkerParts;
pub use modal::{ActiveModal, ModalSlot};
