//! Scene-graph collaborator boundary.
//!
//! # Responsibility
//! - Describe the node operations the interaction core needs from a renderer.
//! - Provide `MemoryScene`, a headless implementation used by tests and tools.
//!
//! # Invariants
//! - Ray intersection only considers candidates attached under `root()`.
//! - A disposed node id is never handed out again.

mod memory;

pub use memory::MemoryScene;

use rapier3d::prelude::*;

/// Handle to a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

/// Geometry carried by a node. Groups and labels are never ray targets.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Group,
    Sphere { radius: Real },
    Cuboid { half_extents: Vector<Real> },
    Cylinder { half_height: Real, radius: Real },
    /// Flat rectangle in the node's local XZ plane.
    Plane { half_width: Real, half_depth: Real },
    Label { text: String },
    Model { name: String, half_extents: Vector<Real> },
}

/// Nearest ray intersection returned by `Scene::intersect`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    pub node: NodeId,
    pub point: Point<Real>,
    pub distance: Real,
}

/// Operations the core performs on the rendering collaborator.
pub trait Scene {
    fn root(&self) -> NodeId;
    fn create_node(&mut self, name: &str, primitive: Primitive) -> NodeId;
    /// Attaches `child` under `parent`, keeping its local transform.
    fn attach(&mut self, parent: NodeId, child: NodeId);
    /// Re-parents `child` under `parent` so its world transform is unchanged.
    fn attach_preserving_world(&mut self, parent: NodeId, child: NodeId);
    fn detach(&mut self, node: NodeId);
    /// Detaches `node` and releases it together with its subtree.
    fn dispose(&mut self, node: NodeId);
    fn set_visible(&mut self, node: NodeId, visible: bool);
    fn set_position(&mut self, node: NodeId, position: Vector<Real>);
    fn set_rotation(&mut self, node: NodeId, rotation: Rotation<Real>);
    fn set_emphasis(&mut self, node: NodeId, emphasized: bool);
    fn set_cast_shadow(&mut self, node: NodeId, cast: bool);
    fn world_pose(&self, node: NodeId) -> Option<Isometry<Real>>;
    /// Rewrites a label's text in place. Returns `false` when unsupported.
    fn update_label(&mut self, node: NodeId, text: &str) -> bool;
    fn intersect(&self, ray: &Ray, candidates: &[NodeId]) -> Option<SceneHit>;
}
