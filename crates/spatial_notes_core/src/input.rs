//! Per-frame input snapshots from the host.
//!
//! # Responsibility
//! - Carry controller pose, button and axis state into one tick.
//! - Describe surfaces reported by environment understanding.
//! - Define the text-entry collaborator and the actions it reports back.

use crate::model::note::NoteId;
use rapier3d::prelude::*;

/// Pointing ray of a tracked controller. The direction is unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRay {
    origin: Point<Real>,
    direction: Vector<Real>,
}

impl TargetRay {
    /// Returns `None` for a zero or non-finite direction.
    pub fn new(origin: Point<Real>, direction: Vector<Real>) -> Option<Self> {
        let direction = direction
            .try_normalize(1.0e-6)
            .filter(|d| d.iter().all(|c| c.is_finite()))?;
        Some(Self { origin, direction })
    }

    pub fn origin(&self) -> Point<Real> {
        self.origin
    }

    pub fn direction(&self) -> Vector<Real> {
        self.direction
    }

    pub fn to_ray(&self) -> Ray {
        Ray::new(self.origin, self.direction)
    }
}

/// Discrete controller buttons the core reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Trigger: create a note, or open delete confirmation on a hovered one.
    Primary,
    /// Opens the text editor for the hovered note.
    Secondary,
    /// Squeeze: deletes the hovered note without confirmation.
    Grip,
    /// Finalizes the carried item.
    Place,
}

impl Button {
    const ALL: [Button; 4] = [Button::Primary, Button::Secondary, Button::Grip, Button::Place];

    fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
            Self::Grip => 2,
            Self::Place => 3,
        }
    }
}

/// Held/edge state for every `Button`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonStates {
    down: [bool; Button::ALL.len()],
    clicked: [bool; Button::ALL.len()],
}

impl ButtonStates {
    /// Marks `button` as pressed this frame (held and edge).
    pub fn press(mut self, button: Button) -> Self {
        self.down[button.index()] = true;
        self.clicked[button.index()] = true;
        self
    }

    /// Marks `button` as held without a new edge.
    pub fn hold(mut self, button: Button) -> Self {
        self.down[button.index()] = true;
        self
    }

    pub fn is_down(&self, button: Button) -> bool {
        self.down[button.index()]
    }

    /// Whether `button` went down this frame.
    pub fn clicked(&self, button: Button) -> bool {
        self.clicked[button.index()]
    }
}

/// One controller's state for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerFrame {
    /// `None` while the device has no valid pose.
    pub target_ray: Option<TargetRay>,
    pub buttons: ButtonStates,
    /// Thumbstick `[x, y]`, each in `[-1, 1]`.
    pub thumbstick: [f32; 2],
}

/// Everything the core reads in one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Viewer (camera) position, used to face dialogs.
    pub viewer: Point<Real>,
    pub controller: Option<ControllerFrame>,
}

impl FrameInput {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            viewer: point![0.0, 1.6, 0.0],
            controller: None,
        }
    }

    pub fn with_controller(mut self, controller: ControllerFrame) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn with_viewer(mut self, viewer: Point<Real>) -> Self {
        self.viewer = viewer;
        self
    }

    pub fn target_ray(&self) -> Option<TargetRay> {
        self.controller.and_then(|c| c.target_ray)
    }

    pub fn clicked(&self, button: Button) -> bool {
        self.controller.is_some_and(|c| c.buttons.clicked(button))
    }

    pub fn thumbstick_x(&self) -> f32 {
        self.controller.map_or(0.0, |c| c.thumbstick[0])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneOrientation {
    Horizontal,
    Vertical,
}

/// A physical surface reported by environment understanding.
///
/// The surface is a rectangle in the pose's local XZ plane; local +Y is its
/// normal.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedPlane {
    pub orientation: PlaneOrientation,
    /// Semantic label such as `floor`, `wall`, `table`.
    pub label: Option<String>,
    /// Bounding rectangle `[width, depth]` in meters.
    pub extent: [f32; 2],
    pub pose: Isometry<Real>,
}

impl DetectedPlane {
    pub fn is_floor(&self) -> bool {
        self.label
            .as_deref()
            .is_some_and(|label| label.trim().eq_ignore_ascii_case("floor"))
    }
}

/// Outcome reported by the text-entry overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEntryAction {
    Save(String),
    Cancel,
    Delete,
}

/// 2D text-entry overlay; at most one is open at a time.
pub trait TextEntrySurface {
    fn open(&mut self, note: &NoteId, initial_text: &str);
    fn close(&mut self);
}
