//! Single slot for the open modal (text entry or delete confirmation).
//!
//! # Invariants
//! - At most one modal is open at any time.
//! - Opening a modal tears the current one down before the new one exists.

use super::confirm::DeleteConfirmDialog;
use crate::config::SessionConfig;
use crate::input::TextEntrySurface;
use crate::model::note::NoteId;
use crate::scene::Scene;
use log::debug;
use rapier3d::prelude::*;

#[derive(Debug, Clone)]
pub enum ActiveModal {
    TextEntry { note: NoteId },
    DeleteConfirm(DeleteConfirmDialog),
}

impl ActiveModal {
    pub fn note(&self) -> &NoteId {
        match self {
            Self::TextEntry { note } => note,
            Self::DeleteConfirm(dialog) => dialog.note(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ModalSlot {
    active: Option<ActiveModal>,
}

impl ModalSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveModal> {
        self.active.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Note whose text editor is open, if any.
    pub fn editing(&self) -> Option<&NoteId> {
        match &self.active {
            Some(ActiveModal::TextEntry { note }) => Some(note),
            _ => None,
        }
    }

    pub fn confirm_dialog(&self) -> Option<&DeleteConfirmDialog> {
        match &self.active {
            Some(ActiveModal::DeleteConfirm(dialog)) => Some(dialog),
            _ => None,
        }
    }

    pub fn references(&self, note: &NoteId) -> bool {
        self.active.as_ref().is_some_and(|modal| modal.note() == note)
    }

    pub fn open_text_entry(
        &mut self,
        scene: &mut dyn Scene,
        editor: &mut dyn TextEntrySurface,
        note: &NoteId,
        content: &str,
    ) {
        self.close(scene, editor);
        editor.open(note, content);
        debug!("event=modal_open module=modal status=ok kind=text_entry note={note}");
        self.active = Some(ActiveModal::TextEntry { note: note.clone() });
    }

    pub fn open_delete_confirm(
        &mut self,
        scene: &mut dyn Scene,
        editor: &mut dyn TextEntrySurface,
        config: &SessionConfig,
        note: &NoteId,
        anchor: Point<Real>,
    ) {
        self.close(scene, editor);
        let dialog = DeleteConfirmDialog::open(scene, config, note, anchor);
        debug!("event=modal_open module=modal status=ok kind=delete_confirm note={note}");
        self.active = Some(ActiveModal::DeleteConfirm(dialog));
    }

    /// Tears down whatever is open. Returns whether anything was open.
    pub fn close(&mut self, scene: &mut dyn Scene, editor: &mut dyn TextEntrySurface) -> bool {
        match self.active.take() {
            None => false,
            Some(ActiveModal::TextEntry { note }) => {
                editor.close();
                debug!("event=modal_close module=modal status=ok kind=text_entry note={note}");
                true
            }
            Some(ActiveModal::DeleteConfirm(dialog)) => {
                dialog.teardown(scene);
                true
            }
        }
    }
}
