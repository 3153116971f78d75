//! Delete-confirmation dialog shown above a note.
//!
//! # Responsibility
//! - Build a small 3D panel with confirm and cancel targets.
//! - Keep the panel turned toward the viewer while it is open.
//! - Hit-test the pointer against its own two targets only.
//!
//! # Invariants
//! - Only the primary button produces a choice.
//! - Teardown disposes the whole panel subtree.

use crate::config::SessionConfig;
use crate::input::{Button, FrameInput, TargetRay};
use crate::interaction::pointer::{pick, PickTable};
use crate::model::note::NoteId;
use crate::scene::{NodeId, Primitive, Scene};
use log::debug;
use rapier3d::prelude::*;

const BUTTON_HALF_EXTENTS: [Real; 3] = [0.06, 0.03, 0.01];
const BUTTON_SPACING: Real = 0.08;

/// What the user chose on the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    Confirm,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct DeleteConfirmDialog {
    note: NoteId,
    root: NodeId,
    targets: PickTable<ConfirmChoice>,
}

impl DeleteConfirmDialog {
    /// Builds the panel `dialog_offset` above `anchor` and attaches it.
    pub fn open(
        scene: &mut dyn Scene,
        config: &SessionConfig,
        note: &NoteId,
        anchor: Point<Real>,
    ) -> Self {
        let root = scene.create_node("delete-dialog", Primitive::Group);
        scene.set_position(root, anchor.coords + vector![0.0, config.dialog_offset, 0.0]);

        let panel = scene.create_node(
            "delete-dialog-panel",
            Primitive::Cuboid {
                half_extents: vector![0.16, 0.08, 0.005],
            },
        );
        scene.attach(root, panel);
        scene.set_position(panel, vector![0.0, 0.0, -0.02]);

        let title = scene.create_node(
            "delete-dialog-title",
            Primitive::Label {
                text: "Delete note?".to_string(),
            },
        );
        scene.attach(root, title);
        scene.set_position(title, vector![0.0, 0.04, 0.0]);

        let mut targets = PickTable::new();
        for (name, choice, x) in [
            ("delete-dialog-confirm", ConfirmChoice::Confirm, -BUTTON_SPACING),
            ("delete-dialog-cancel", ConfirmChoice::Cancel, BUTTON_SPACING),
        ] {
            let button = scene.create_node(
                name,
                Primitive::Cuboid {
                    half_extents: Vector::from(BUTTON_HALF_EXTENTS),
                },
            );
            scene.attach(root, button);
            scene.set_position(button, vector![x, -0.03, 0.0]);
            targets.register(button, choice);
        }

        let scene_root = scene.root();
        scene.attach(scene_root, root);
        debug!("event=dialog_open module=confirm status=ok note={note}");

        Self {
            note: note.clone(),
            root,
            targets,
        }
    }

    pub fn note(&self) -> &NoteId {
        &self.note
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node of the target that produces `choice`.
    pub fn target(&self, choice: ConfirmChoice) -> Option<NodeId> {
        self.targets
            .iter()
            .find(|(_, owner)| **owner == choice)
            .map(|(node, _)| node)
    }

    /// Turns the panel about Y so its front faces `viewer`.
    pub fn face(&self, scene: &mut dyn Scene, viewer: Point<Real>) {
        let Some(pose) = scene.world_pose(self.root) else {
            return;
        };
        let dx = viewer.x - pose.translation.x;
        let dz = viewer.z - pose.translation.z;
        if dx.abs() < Real::EPSILON && dz.abs() < Real::EPSILON {
            return;
        }
        let yaw = dx.atan2(dz);
        scene.set_rotation(self.root, Rotation::from_axis_angle(&Vector::y_axis(), yaw));
    }

    pub fn hit_test(&self, scene: &dyn Scene, ray: Option<&TargetRay>) -> Option<ConfirmChoice> {
        pick(scene, ray, &self.targets).map(|hit| hit.owner)
    }

    /// One dialog frame: billboard, then resolve a primary click.
    pub fn tick(&self, scene: &mut dyn Scene, frame: &FrameInput) -> Option<ConfirmChoice> {
        self.face(scene, frame.viewer);
        if !frame.clicked(Button::Primary) {
            return None;
        }
        let ray = frame.target_ray();
        let choice = self.hit_test(scene, ray.as_ref());
        debug!(
            "event=dialog_click module=confirm status=ok note={} choice={:?}",
            self.note, choice
        );
        choice
    }

    pub fn teardown(self, scene: &mut dyn Scene) {
        scene.dispose(self.root);
        debug!("event=dialog_close module=confirm status=ok note={}", self.note);
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfirmChoice, DeleteConfirmDialog};
    use crate::config::SessionConfig;
    use crate::input::{Button, ButtonStates, ControllerFrame, FrameInput, TargetRay};
    use crate::model::note::NoteId;
    use crate::scene::{MemoryScene, Scene};
    use rapier3d::prelude::*;

    fn aim_at(scene: &MemoryScene, node: crate::scene::NodeId, press: bool) -> FrameInput {
        let target = scene.world_pose(node).unwrap().translation.vector;
        let origin = point![0.0, 1.6, 2.0];
        let ray = TargetRay::new(origin, target - origin.coords).unwrap();
        let buttons = if press {
            ButtonStates::default().press(Button::Primary)
        } else {
            ButtonStates::default()
        };
        FrameInput::new(1.0 / 60.0)
            .with_viewer(origin)
            .with_controller(ControllerFrame {
                target_ray: Some(ray),
                buttons,
                thumbstick: [0.0, 0.0],
            })
    }

    #[test]
    fn panel_sits_above_anchor_and_faces_viewer() {
        let mut scene = MemoryScene::new();
        let config = SessionConfig::default();
        let dialog =
            DeleteConfirmDialog::open(&mut scene, &config, &NoteId::from("n1"), point![0.0, 1.0, 0.0]);

        let pose = scene.world_pose(dialog.root()).unwrap();
        assert!((pose.translation.y - (1.0 + config.dialog_offset)).abs() < 1e-5);

        dialog.face(&mut scene, point![3.0, 1.6, 0.0]);
        let front = scene.world_pose(dialog.root()).unwrap().rotation * Vector::z();
        assert!((front.x - 1.0).abs() < 1e-4);
        assert!(front.z.abs() < 1e-4);
    }

    #[test]
    fn only_primary_clicks_on_targets_produce_a_choice() {
        let mut scene = MemoryScene::new();
        let config = SessionConfig::default();
        let dialog =
            DeleteConfirmDialog::open(&mut scene, &config, &NoteId::from("n1"), point![0.0, 1.0, 0.0]);
        let confirm = dialog.target(ConfirmChoice::Confirm).unwrap();
        let cancel = dialog.target(ConfirmChoice::Cancel).unwrap();

        let idle = aim_at(&scene, confirm, false);
        assert_eq!(dialog.tick(&mut scene, &idle), None);

        let frame = aim_at(&scene, confirm, true);
        assert_eq!(dialog.tick(&mut scene, &frame), Some(ConfirmChoice::Confirm));

        let frame = aim_at(&scene, cancel, true);
        assert_eq!(dialog.tick(&mut scene, &frame), Some(ConfirmChoice::Cancel));

        let away = FrameInput::new(1.0 / 60.0).with_controller(ControllerFrame {
            target_ray: TargetRay::new(point![0.0, 1.6, 2.0], vector![0.0, 0.0, 1.0]),
            buttons: ButtonStates::default().press(Button::Primary),
            thumbstick: [0.0, 0.0],
        });
        assert_eq!(dialog.tick(&mut scene, &away), None);
    }

    #[test]
    fn teardown_disposes_panel() {
        let mut scene = MemoryScene::new();
        let config = SessionConfig::default();
        let before = scene.node_count();
        let dialog =
            DeleteConfirmDialog::open(&mut scene, &config, &NoteId::from("n1"), point![0.0, 1.0, 0.0]);
        let root = dialog.root();
        dialog.teardown(&mut scene);
        assert!(!scene.contains(root));
        assert_eq!(scene.node_count(), before);
    }
}
