//! Visual marker for one note: a stem, a head and a hidden label.

use super::label::label_text;
use crate::config::SessionConfig;
use crate::model::note::Note;
use crate::scene::{NodeId, Primitive, Scene};
use rapier3d::prelude::*;

const LABEL_GAP: Real = 0.08;

/// Scene nodes making up one note marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerParts {
    pub group: NodeId,
    pub head: NodeId,
    pub stem: NodeId,
    pub label: NodeId,
}

impl MarkerParts {
    /// Nodes that resolve to the note when hit by the target ray.
    pub fn pickables(&self) -> [NodeId; 2] {
        [self.head, self.stem]
    }
}

/// Builds and attaches the marker for `note`.
pub fn build_marker(scene: &mut dyn Scene, config: &SessionConfig, note: &Note) -> MarkerParts {
    let stem_height = config.note_stem_height;
    let radius = config.note_head_radius;

    let group = scene.create_node("note", Primitive::Group);
    scene.set_position(group, note.position.coords);

    let stem = scene.create_node(
        "note-stem",
        Primitive::Cylinder {
            half_height: stem_height / 2.0,
            radius: radius / 4.0,
        },
    );
    scene.attach(group, stem);
    scene.set_position(stem, vector![0.0, stem_height / 2.0, 0.0]);

    let head = scene.create_node("note-head", Primitive::Sphere { radius });
    scene.attach(group, head);
    scene.set_position(head, vector![0.0, stem_height + radius, 0.0]);

    let label = create_label(scene, config, group, &note.content);

    let root = scene.root();
    scene.attach(root, group);

    MarkerParts {
        group,
        head,
        stem,
        label,
    }
}

/// Replaces the label surface with a freshly built one.
pub fn rebuild_label(
    scene: &mut dyn Scene,
    config: &SessionConfig,
    parts: &mut MarkerParts,
    content: &str,
    visible: bool,
) {
    scene.dispose(parts.label);
    parts.label = create_label(scene, config, parts.group, content);
    scene.set_visible(parts.label, visible);
}

/// Emphasizes the marker and shows its label, or resets both.
pub fn set_highlight(scene: &mut dyn Scene, parts: &MarkerParts, on: bool) {
    scene.set_emphasis(parts.head, on);
    scene.set_emphasis(parts.stem, on);
    scene.set_visible(parts.label, on);
}

fn create_label(scene: &mut dyn Scene, config: &SessionConfig, group: NodeId, content: &str) -> NodeId {
    let label = scene.create_node(
        "note-label",
        Primitive::Label {
            text: label_text(content, config.label_max_chars),
        },
    );
    scene.attach(group, label);
    scene.set_position(
        label,
        vector![
            0.0,
            config.note_stem_height + 2.0 * config.note_head_radius + LABEL_GAP,
            0.0
        ],
    );
    scene.set_visible(label, false);
    label
}
