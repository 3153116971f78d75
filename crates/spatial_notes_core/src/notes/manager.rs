//! Note lifecycle: create, hover, edit, delete, persist, restore.
//!
//! # Responsibility
//! - Own the note collection, the pickable mapping and the hover slot.
//! - Route controller buttons to note actions.
//! - Apply text-entry results and keep the store in sync.
//!
//! # Invariants
//! - Every pickable maps to a note present in the collection.
//! - A note is in the collection iff its marker group is attached.
//! - The hover slot is empty or names a note in the collection.
//! - Every mutation rewrites the store; startup restore does not.

use super::confirm::ConfirmChoice;
use super::label::label_text;
use super::marker::{build_marker, rebuild_label, set_highlight, MarkerParts};
use super::modal::ModalSlot;
use crate::config::SessionConfig;
use crate::input::{Button, FrameInput, TextEntryAction, TextEntrySurface};
use crate::interaction::pointer::{pick, PickTable};
use crate::model::note::{Note, NoteId, NoteRecord};
use crate::scene::Scene;
use crate::store::NoteStore;
use log::{debug, info, warn};
use rapier3d::prelude::*;

/// Collaborators a note operation may touch.
pub struct NoteContext<'a> {
    pub scene: &'a mut dyn Scene,
    pub config: &'a SessionConfig,
    pub store: &'a mut NoteStore,
    pub editor: &'a mut dyn TextEntrySurface,
}

#[derive(Debug)]
struct NoteEntry {
    note: Note,
    parts: MarkerParts,
}

#[derive(Debug, Default)]
pub struct NoteManager {
    entries: Vec<NoteEntry>,
    pickables: PickTable<NoteId>,
    hovered: Option<NoteId>,
    modal: ModalSlot,
}

impl NoteManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.entries.iter().map(|entry| &entry.note)
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.entry(id).map(|entry| &entry.note)
    }

    pub fn marker(&self, id: &NoteId) -> Option<&MarkerParts> {
        self.entry(id).map(|entry| &entry.parts)
    }

    pub fn pickables(&self) -> &PickTable<NoteId> {
        &self.pickables
    }

    pub fn hovered(&self) -> Option<&NoteId> {
        self.hovered.as_ref()
    }

    pub fn modal(&self) -> &ModalSlot {
        &self.modal
    }

    /// Adds a note, persists the collection and optionally opens its editor.
    ///
    /// An id that is already in the collection returns the existing note
    /// unchanged.
    pub fn create(
        &mut self,
        ctx: &mut NoteContext<'_>,
        position: Point<Real>,
        content: &str,
        open_editor: bool,
        id: Option<NoteId>,
    ) -> NoteId {
        if let Some(existing) = id.as_ref().filter(|id| self.entry(id).is_some()) {
            warn!("event=note_create module=notes status=skip reason=duplicate_id id={existing}");
            return existing.clone();
        }
        let note = Note::new(id.unwrap_or_else(NoteId::generate), position, content);
        let id = self.insert(ctx.scene, ctx.config, note);
        info!(
            "event=note_create module=notes status=ok id={} x={:.2} y={:.2} z={:.2}",
            id, position.x, position.y, position.z
        );
        ctx.store.save(self.notes());
        if open_editor {
            self.modal
                .open_text_entry(ctx.scene, ctx.editor, &id, content);
        }
        id
    }

    /// Rebuilds markers for stored records without writing back.
    ///
    /// Records whose id is already present are skipped.
    pub fn restore(
        &mut self,
        scene: &mut dyn Scene,
        config: &SessionConfig,
        records: Vec<NoteRecord>,
    ) -> usize {
        let mut restored = 0;
        for record in records {
            let note = Note::from_record(record);
            if self.entry(&note.id).is_some() {
                warn!(
                    "event=note_restore module=notes status=skip reason=duplicate_id id={}",
                    note.id
                );
                continue;
            }
            self.insert(scene, config, note);
            restored += 1;
        }
        info!("event=note_restore module=notes status=ok count={restored}");
        restored
    }

    /// Removes a note with all of its visuals. Unknown ids are a no-op.
    pub fn remove(&mut self, ctx: &mut NoteContext<'_>, id: &NoteId) -> bool {
        let Some(index) = self.entries.iter().position(|entry| &entry.note.id == id) else {
            debug!("event=note_remove module=notes status=skip reason=unknown id={id}");
            return false;
        };
        let entry = self.entries.remove(index);
        self.pickables.remove_owner(id);
        ctx.scene.dispose(entry.parts.group);
        if self.hovered.as_ref() == Some(id) {
            self.hovered = None;
        }
        if self.modal.references(id) {
            self.modal.close(ctx.scene, ctx.editor);
        }
        info!("event=note_remove module=notes status=ok id={id}");
        ctx.store.save(self.notes());
        true
    }

    /// Re-resolves the hovered note and moves the highlight if it changed.
    pub fn update_hover(&mut self, scene: &mut dyn Scene, frame: &FrameInput) {
        let ray = frame.target_ray();
        let next = pick(&*scene, ray.as_ref(), &self.pickables).map(|hit| hit.owner);
        if next == self.hovered {
            return;
        }
        if let Some(previous) = self.hovered.take() {
            if let Some(entry) = self.entry(&previous) {
                set_highlight(scene, &entry.parts, false);
            }
        }
        if let Some(current) = &next {
            if let Some(entry) = self.entry(current) {
                set_highlight(scene, &entry.parts, true);
            }
        }
        self.hovered = next;
    }

    /// One note frame: dialog sub-loop, hover, then button routing.
    ///
    /// `target` is the floor hit of this frame; `fallback` is used for new
    /// notes when there is none.
    pub fn tick(
        &mut self,
        ctx: &mut NoteContext<'_>,
        frame: &FrameInput,
        target: Option<Point<Real>>,
        fallback: Option<Point<Real>>,
    ) {
        let dialog_consumed_primary = self.tick_dialog(ctx, frame);
        self.update_hover(ctx.scene, frame);

        if frame.clicked(Button::Primary) && !dialog_consumed_primary {
            match self.hovered.clone() {
                Some(id) => {
                    self.open_delete_confirm(ctx, &id);
                }
                None => match target.or(fallback) {
                    Some(position) => {
                        self.create(ctx, position, "", true, None);
                    }
                    None => {
                        debug!("event=note_create module=notes status=skip reason=no_position");
                    }
                },
            }
        }

        if frame.clicked(Button::Secondary) {
            if let Some(id) = self.hovered.clone() {
                self.open_editor(ctx, &id);
            }
        }

        if frame.clicked(Button::Grip) {
            if let Some(id) = self.hovered.clone() {
                self.remove(ctx, &id);
            }
        }
    }

    /// Runs the open confirmation dialog. Returns whether it consumed the
    /// primary button this frame.
    fn tick_dialog(&mut self, ctx: &mut NoteContext<'_>, frame: &FrameInput) -> bool {
        let Some(dialog) = self.modal.confirm_dialog() else {
            return false;
        };
        let note = dialog.note().clone();
        match dialog.tick(ctx.scene, frame) {
            Some(ConfirmChoice::Confirm) => {
                self.remove(ctx, &note);
            }
            Some(ConfirmChoice::Cancel) => {
                self.modal.close(ctx.scene, ctx.editor);
            }
            None => {}
        }
        frame.clicked(Button::Primary)
    }

    pub fn open_editor(&mut self, ctx: &mut NoteContext<'_>, id: &NoteId) -> bool {
        let Some(content) = self.get(id).map(|note| note.content.clone()) else {
            return false;
        };
        self.modal.open_text_entry(ctx.scene, ctx.editor, id, &content);
        true
    }

    pub fn open_delete_confirm(&mut self, ctx: &mut NoteContext<'_>, id: &NoteId) -> bool {
        let Some(anchor) = self.marker(id).and_then(|parts| ctx.scene.world_pose(parts.group))
        else {
            return false;
        };
        self.modal.open_delete_confirm(
            ctx.scene,
            ctx.editor,
            ctx.config,
            id,
            Point::from(anchor.translation.vector),
        );
        true
    }

    /// Applies an action reported by the text-entry overlay.
    pub fn on_text_entry(&mut self, ctx: &mut NoteContext<'_>, action: TextEntryAction) {
        let Some(id) = self.modal.editing().cloned() else {
            debug!("event=text_entry module=notes status=skip reason=no_editor");
            return;
        };
        match action {
            TextEntryAction::Save(text) => self.commit_text(ctx, &id, &text),
            TextEntryAction::Cancel => {
                self.modal.close(ctx.scene, ctx.editor);
            }
            TextEntryAction::Delete => {
                self.remove(ctx, &id);
            }
        }
    }

    fn commit_text(&mut self, ctx: &mut NoteContext<'_>, id: &NoteId, text: &str) {
        let content = text.trim().to_string();
        let visible = self.hovered.as_ref() == Some(id);
        let Some(entry) = self.entries.iter_mut().find(|entry| &entry.note.id == id) else {
            self.modal.close(ctx.scene, ctx.editor);
            return;
        };
        entry.note.content = content;

        let text = label_text(&entry.note.content, ctx.config.label_max_chars);
        if !ctx.scene.update_label(entry.parts.label, &text) {
            rebuild_label(ctx.scene, ctx.config, &mut entry.parts, &entry.note.content, visible);
        }
        debug!(
            "event=note_update module=notes status=ok id={} chars={}",
            id,
            entry.note.content.chars().count()
        );
        ctx.store.save(self.notes());
        self.modal.close(ctx.scene, ctx.editor);
    }

    fn insert(&mut self, scene: &mut dyn Scene, config: &SessionConfig, note: Note) -> NoteId {
        let parts = build_marker(scene, config, &note);
        for node in parts.pickables() {
            self.pickables.register(node, note.id.clone());
        }
        let id = note.id.clone();
        self.entries.push(NoteEntry { note, parts });
        id
    }

    fn entry(&self, id: &NoteId) -> Option<&NoteEntry> {
        self.entries.iter().find(|entry| &entry.note.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteContext, NoteManager};
    use crate::config::SessionConfig;
    use crate::input::{
        Button, ButtonStates, ControllerFrame, FrameInput, TargetRay, TextEntryAction,
        TextEntrySurface,
    };
    use crate::model::note::NoteId;
    use crate::notes::label::EMPTY_NOTE_LABEL;
    use crate::notes::modal::ActiveModal;
    use crate::scene::{MemoryScene, NodeId, Scene};
    use crate::store::{MemoryKeyValueStore, NoteStore};
    use rapier3d::prelude::*;

    #[derive(Default)]
    struct RecordingEditor {
        open: Vec<(String, String)>,
        closes: usize,
    }

    impl TextEntrySurface for RecordingEditor {
        fn open(&mut self, note: &NoteId, initial_text: &str) {
            self.open.push((note.to_string(), initial_text.to_string()));
        }

        fn close(&mut self) {
            self.closes += 1;
        }
    }

    struct Fixture {
        scene: MemoryScene,
        config: SessionConfig,
        store: NoteStore,
        editor: RecordingEditor,
        manager: NoteManager,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_scene(MemoryScene::new())
        }

        fn with_scene(scene: MemoryScene) -> Self {
            Self {
                scene,
                config: SessionConfig::default(),
                store: NoteStore::new(Box::new(MemoryKeyValueStore::new()), "notes"),
                editor: RecordingEditor::default(),
                manager: NoteManager::new(),
            }
        }

        fn run<R>(&mut self, f: impl FnOnce(&mut NoteManager, &mut NoteContext<'_>) -> R) -> R {
            let mut ctx = NoteContext {
                scene: &mut self.scene,
                config: &self.config,
                store: &mut self.store,
                editor: &mut self.editor,
            };
            f(&mut self.manager, &mut ctx)
        }

        fn aim(&self, node: NodeId, buttons: ButtonStates) -> FrameInput {
            let target = self.scene.world_pose(node).unwrap().translation.vector;
            let origin = point![0.0, 1.6, 3.0];
            FrameInput::new(1.0 / 60.0).with_controller(ControllerFrame {
                target_ray: TargetRay::new(origin, target - origin.coords),
                buttons,
                thumbstick: [0.0, 0.0],
            })
        }

        fn head(&self, id: &NoteId) -> NodeId {
            self.manager.marker(id).unwrap().head
        }
    }

    fn nowhere(buttons: ButtonStates) -> FrameInput {
        FrameInput::new(1.0 / 60.0).with_controller(ControllerFrame {
            target_ray: TargetRay::new(point![0.0, 1.6, 3.0], vector![0.0, 1.0, 0.0]),
            buttons,
            thumbstick: [0.0, 0.0],
        })
    }

    #[test]
    fn create_registers_pickables_and_persists() {
        let mut fx = Fixture::new();
        let id = fx.run(|m, ctx| m.create(ctx, point![1.0, 0.0, 1.0], "buy lamp", false, None));

        assert_eq!(fx.manager.len(), 1);
        assert_eq!(fx.manager.pickables().len(), 2);
        assert!(fx.manager.pickables().iter().all(|(_, owner)| owner == &id));
        assert!(fx.scene.is_attached(fx.manager.marker(&id).unwrap().group));
        assert_eq!(fx.store.load().len(), 1);
        assert!(fx.manager.modal().active().is_none());
    }

    #[test]
    fn create_with_taken_id_keeps_the_existing_note() {
        let mut fx = Fixture::new();
        let id = NoteId::from("x");
        let first =
            fx.run(|m, ctx| m.create(ctx, point![0.0, 0.0, 0.0], "a", false, Some(id.clone())));
        let second =
            fx.run(|m, ctx| m.create(ctx, point![1.0, 0.0, 0.0], "b", true, Some(id.clone())));

        assert_eq!(first, id);
        assert_eq!(second, id);
        assert_eq!(fx.manager.len(), 1);
        assert_eq!(fx.manager.get(&id).unwrap().content, "a");
        assert_eq!(fx.manager.pickables().len(), 2);
        assert_eq!(fx.scene.find_attached("note").len(), 1);
        assert!(fx.manager.modal().active().is_none());

        assert!(fx.run(|m, ctx| m.remove(ctx, &id)));
        assert!(fx.manager.is_empty());
        assert!(fx.manager.pickables().is_empty());
        assert!(fx.scene.find_attached("note").is_empty());
        assert!(fx.store.load().is_empty());
    }

    #[test]
    fn create_with_editor_opens_text_entry() {
        let mut fx = Fixture::new();
        let id = fx.run(|m, ctx| m.create(ctx, point![0.0, 0.0, 0.0], "", true, None));
        assert_eq!(fx.manager.modal().editing(), Some(&id));
        assert_eq!(fx.editor.open, vec![(id.to_string(), String::new())]);
    }

    #[test]
    fn hover_highlights_one_note_and_shows_its_label() {
        let mut fx = Fixture::new();
        let a = fx.run(|m, ctx| m.create(ctx, point![-0.5, 0.0, 0.0], "a", false, None));
        let b = fx.run(|m, ctx| m.create(ctx, point![0.5, 0.0, 0.0], "b", false, None));

        let frame = fx.aim(fx.head(&a), ButtonStates::default());
        fx.manager.update_hover(&mut fx.scene, &frame);
        assert_eq!(fx.manager.hovered(), Some(&a));
        let a_parts = *fx.manager.marker(&a).unwrap();
        assert!(fx.scene.is_emphasized(a_parts.head));
        assert!(fx.scene.is_visible(a_parts.label));

        let frame = fx.aim(fx.head(&b), ButtonStates::default());
        fx.manager.update_hover(&mut fx.scene, &frame);
        assert_eq!(fx.manager.hovered(), Some(&b));
        assert!(!fx.scene.is_emphasized(a_parts.head));
        assert!(!fx.scene.is_visible(a_parts.label));

        fx.manager.update_hover(&mut fx.scene, &nowhere(ButtonStates::default()));
        assert_eq!(fx.manager.hovered(), None);
        assert!(!fx.scene.is_visible(fx.manager.marker(&b).unwrap().label));
    }

    #[test]
    fn remove_is_idempotent_and_clears_hover() {
        let mut fx = Fixture::new();
        let id = fx.run(|m, ctx| m.create(ctx, point![0.0, 0.0, 0.0], "x", false, None));
        let group = fx.manager.marker(&id).unwrap().group;
        let frame = fx.aim(fx.head(&id), ButtonStates::default());
        fx.manager.update_hover(&mut fx.scene, &frame);

        assert!(fx.run(|m, ctx| m.remove(ctx, &id)));
        assert!(fx.manager.is_empty());
        assert!(fx.manager.pickables().is_empty());
        assert_eq!(fx.manager.hovered(), None);
        assert!(!fx.scene.contains(group));
        assert!(fx.store.load().is_empty());

        assert!(!fx.run(|m, ctx| m.remove(ctx, &id)));
        assert!(!fx.run(|m, ctx| m.remove(ctx, &NoteId::from("foreign"))));
    }

    #[test]
    fn primary_on_empty_space_creates_note_at_target() {
        let mut fx = Fixture::new();
        let frame = nowhere(ButtonStates::default().press(Button::Primary));
        fx.run(|m, ctx| m.tick(ctx, &frame, Some(point![2.0, 0.0, -1.0]), None));

        let note = fx.manager.notes().next().unwrap().clone();
        assert_eq!(note.position, point![2.0, 0.0, -1.0]);
        assert_eq!(fx.manager.modal().editing(), Some(&note.id));
    }

    #[test]
    fn primary_without_target_falls_back_to_carried_position() {
        let mut fx = Fixture::new();
        let frame = nowhere(ButtonStates::default().press(Button::Primary));
        fx.run(|m, ctx| m.tick(ctx, &frame, None, Some(point![0.0, 1.0, -1.5])));
        assert_eq!(fx.manager.notes().next().unwrap().position, point![0.0, 1.0, -1.5]);
    }

    #[test]
    fn primary_on_hovered_note_opens_confirmation_then_confirm_deletes() {
        let mut fx = Fixture::new();
        let id = fx.run(|m, ctx| m.create(ctx, point![0.0, 0.0, 0.0], "x", false, None));

        let frame = fx.aim(fx.head(&id), ButtonStates::default().press(Button::Primary));
        fx.run(|m, ctx| m.tick(ctx, &frame, Some(point![0.0, 0.0, 0.0]), None));
        assert_eq!(fx.manager.len(), 1);
        let confirm = match fx.manager.modal().active() {
            Some(ActiveModal::DeleteConfirm(dialog)) => {
                dialog.target(crate::notes::confirm::ConfirmChoice::Confirm).unwrap()
            }
            other => panic!("expected confirmation, got {other:?}"),
        };

        let frame = fx.aim(confirm, ButtonStates::default().press(Button::Primary));
        fx.run(|m, ctx| m.tick(ctx, &frame, Some(point![0.0, 0.0, 0.0]), None));
        assert!(fx.manager.is_empty());
        assert!(fx.manager.modal().active().is_none());
        assert!(fx.scene.find_attached("delete-dialog").is_empty());
    }

    #[test]
    fn primary_while_dialog_open_never_creates() {
        let mut fx = Fixture::new();
        let id = fx.run(|m, ctx| m.create(ctx, point![0.0, 0.0, 0.0], "x", false, None));
        fx.run(|m, ctx| m.open_delete_confirm(ctx, &id));

        let frame = nowhere(ButtonStates::default().press(Button::Primary));
        fx.run(|m, ctx| m.tick(ctx, &frame, Some(point![3.0, 0.0, 0.0]), None));
        assert_eq!(fx.manager.len(), 1);
        assert!(fx.manager.modal().confirm_dialog().is_some());
    }

    #[test]
    fn grip_deletes_hovered_note_directly() {
        let mut fx = Fixture::new();
        let id = fx.run(|m, ctx| m.create(ctx, point![0.0, 0.0, 0.0], "x", false, None));
        let frame = fx.aim(fx.head(&id), ButtonStates::default().press(Button::Grip));
        fx.run(|m, ctx| m.tick(ctx, &frame, None, None));
        assert!(fx.manager.is_empty());
        assert!(fx.manager.pickables().is_empty());
        assert!(fx.manager.modal().active().is_none());
    }

    #[test]
    fn secondary_opens_editor_with_current_content() {
        let mut fx = Fixture::new();
        let id = fx.run(|m, ctx| m.create(ctx, point![0.0, 0.0, 0.0], "draft", false, None));
        let frame = fx.aim(fx.head(&id), ButtonStates::default().press(Button::Secondary));
        fx.run(|m, ctx| m.tick(ctx, &frame, None, None));
        assert_eq!(fx.manager.modal().editing(), Some(&id));
        assert_eq!(fx.editor.open.last().unwrap().1, "draft");
    }

    #[test]
    fn save_trims_updates_label_in_place_and_persists() {
        let mut fx = Fixture::new();
        let id = fx.run(|m, ctx| m.create(ctx, point![0.0, 0.0, 0.0], "", true, None));
        let label = fx.manager.marker(&id).unwrap().label;
        assert_eq!(fx.scene.label_text(label), Some(EMPTY_NOTE_LABEL));

        fx.run(|m, ctx| m.on_text_entry(ctx, TextEntryAction::Save("  move rug \n".into())));

        assert_eq!(fx.manager.get(&id).unwrap().content, "move rug");
        assert_eq!(fx.manager.marker(&id).unwrap().label, label);
        assert_eq!(fx.scene.label_text(label), Some("move rug"));
        assert_eq!(fx.store.load()[0].content, "move rug");
        assert!(fx.manager.modal().active().is_none());
        assert_eq!(fx.editor.closes, 1);
    }

    #[test]
    fn save_rebuilds_label_when_scene_cannot_update_in_place() {
        let mut fx = Fixture::with_scene(MemoryScene::without_in_place_labels());
        let id = fx.run(|m, ctx| m.create(ctx, point![0.0, 0.0, 0.0], "old", true, None));
        let old_label = fx.manager.marker(&id).unwrap().label;

        fx.run(|m, ctx| m.on_text_entry(ctx, TextEntryAction::Save("new".into())));

        let new_label = fx.manager.marker(&id).unwrap().label;
        assert_ne!(new_label, old_label);
        assert!(!fx.scene.contains(old_label));
        assert_eq!(fx.scene.label_text(new_label), Some("new"));
        assert!(!fx.scene.is_visible(new_label));
    }

    #[test]
    fn editor_delete_and_cancel() {
        let mut fx = Fixture::new();
        let keep = fx.run(|m, ctx| m.create(ctx, point![0.0, 0.0, 0.0], "keep", true, None));
        fx.run(|m, ctx| m.on_text_entry(ctx, TextEntryAction::Cancel));
        assert!(fx.manager.get(&keep).is_some());
        assert!(fx.manager.modal().active().is_none());

        let drop = fx.run(|m, ctx| m.create(ctx, point![1.0, 0.0, 0.0], "drop", true, None));
        fx.run(|m, ctx| m.on_text_entry(ctx, TextEntryAction::Delete));
        assert!(fx.manager.get(&drop).is_none());
        assert_eq!(fx.manager.len(), 1);
        assert!(fx.manager.modal().active().is_none());

        fx.run(|m, ctx| m.on_text_entry(ctx, TextEntryAction::Save("ignored".into())));
        assert_eq!(fx.manager.get(&keep).unwrap().content, "keep");
    }

    #[test]
    fn restore_skips_duplicates_and_does_not_persist() {
        let mut fx = Fixture::new();
        let records = vec![
            crate::model::note::NoteRecord {
                id: "same".into(),
                content: "one".into(),
                position: [0.0, 0.0, 0.0],
            },
            crate::model::note::NoteRecord {
                id: "same".into(),
                content: "two".into(),
                position: [1.0, 0.0, 0.0],
            },
        ];
        let restored = fx.manager.restore(&mut fx.scene, &fx.config, records);
        assert_eq!(restored, 1);
        assert_eq!(fx.manager.get(&NoteId::from("same")).unwrap().content, "one");
        assert!(fx.store.load().is_empty());
    }
}
