//! Headless scene graph with parry-backed ray casts.

use super::{NodeId, Primitive, Scene, SceneHit};
use log::warn;
use rapier3d::parry::query::RayCast;
use rapier3d::parry::shape::{Ball, Cuboid, Cylinder};
use rapier3d::prelude::*;
use std::collections::BTreeMap;

/// Half thickness given to zero-thickness planes for ray casting.
const PLANE_HALF_THICKNESS: Real = 1.0e-4;

#[derive(Debug, Clone)]
struct SceneNode {
    name: String,
    primitive: Primitive,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    position: Vector<Real>,
    rotation: Rotation<Real>,
    visible: bool,
    emphasized: bool,
    casts_shadow: bool,
}

impl SceneNode {
    fn new(name: &str, primitive: Primitive) -> Self {
        Self {
            name: name.to_string(),
            primitive,
            parent: None,
            children: Vec::new(),
            position: Vector::zeros(),
            rotation: Rotation::identity(),
            visible: true,
            emphasized: false,
            casts_shadow: false,
        }
    }

    fn local_pose(&self) -> Isometry<Real> {
        Isometry::from_parts(Translation::from(self.position), self.rotation)
    }
}

/// In-memory `Scene` implementation.
#[derive(Debug, Clone)]
pub struct MemoryScene {
    nodes: BTreeMap<NodeId, SceneNode>,
    root: NodeId,
    next_id: u64,
    in_place_labels: bool,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(root, SceneNode::new("scene", Primitive::Group));
        Self {
            nodes,
            root,
            next_id: 1,
            in_place_labels: true,
        }
    }

    /// A scene whose label surfaces must be rebuilt on every text change.
    pub fn without_in_place_labels() -> Self {
        Self {
            in_place_labels: false,
            ..Self::new()
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.name.as_str())
    }

    pub fn primitive(&self, node: NodeId) -> Option<&Primitive> {
        self.nodes.get(&node).map(|n| &n.primitive)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.visible)
    }

    pub fn is_emphasized(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.emphasized)
    }

    pub fn casts_shadow(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.casts_shadow)
    }

    pub fn label_text(&self, node: NodeId) -> Option<&str> {
        match self.primitive(node) {
            Some(Primitive::Label { text }) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Whether `node` reaches the root through its parent chain.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// Nodes named `name` that are attached under the root.
    pub fn find_attached(&self, name: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(id, node)| node.name == name && self.is_attached(**id))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Whether `ancestor` is `node` or lies on its parent chain.
    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    fn unlink(&mut self, node: NodeId) {
        let parent = self.nodes.get_mut(&node).and_then(|n| n.parent.take());
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| *child != node);
        }
    }

    fn ray_toi(&self, node: &SceneNode, pose: &Isometry<Real>, ray: &Ray) -> Option<Real> {
        match &node.primitive {
            Primitive::Sphere { radius } => Ball::new(*radius).cast_ray(pose, ray, Real::MAX, true),
            Primitive::Cuboid { half_extents } | Primitive::Model { half_extents, .. } => {
                Cuboid::new(*half_extents).cast_ray(pose, ray, Real::MAX, true)
            }
            Primitive::Cylinder {
                half_height,
                radius,
            } => Cylinder::new(*half_height, *radius).cast_ray(pose, ray, Real::MAX, true),
            Primitive::Plane {
                half_width,
                half_depth,
            } => Cuboid::new(vector![*half_width, PLANE_HALF_THICKNESS, *half_depth])
                .cast_ray(pose, ray, Real::MAX, true),
            Primitive::Group | Primitive::Label { .. } => None,
        }
    }
}

impl Scene for MemoryScene {
    fn root(&self) -> NodeId {
        self.root
    }

    fn create_node(&mut self, name: &str, primitive: Primitive) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, SceneNode::new(name, primitive));
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) {
            return;
        }
        if self.is_ancestor_or_self(child, parent) {
            warn!("event=scene_attach module=scene status=skip reason=cycle");
            return;
        }
        self.unlink(child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    fn attach_preserving_world(&mut self, parent: NodeId, child: NodeId) {
        let (Some(child_world), Some(parent_world)) =
            (self.world_pose(child), self.world_pose(parent))
        else {
            return;
        };
        let local = parent_world.inverse() * child_world;
        self.attach(parent, child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.position = local.translation.vector;
            node.rotation = local.rotation;
        }
    }

    fn detach(&mut self, node: NodeId) {
        self.unlink(node);
    }

    fn dispose(&mut self, node: NodeId) {
        if node == self.root {
            return;
        }
        self.unlink(node);
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            if let Some(removed) = self.nodes.remove(&id) {
                pending.extend(removed.children);
            }
        }
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.visible = visible;
        }
    }

    fn set_position(&mut self, node: NodeId, position: Vector<Real>) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.position = position;
        }
    }

    fn set_rotation(&mut self, node: NodeId, rotation: Rotation<Real>) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.rotation = rotation;
        }
    }

    fn set_emphasis(&mut self, node: NodeId, emphasized: bool) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.emphasized = emphasized;
        }
    }

    fn set_cast_shadow(&mut self, node: NodeId, cast: bool) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.casts_shadow = cast;
        }
    }

    fn world_pose(&self, node: NodeId) -> Option<Isometry<Real>> {
        let mut current = self.nodes.get(&node)?;
        let mut pose = current.local_pose();
        while let Some(parent) = current.parent.and_then(|p| self.nodes.get(&p)) {
            pose = parent.local_pose() * pose;
            current = parent;
        }
        Some(pose)
    }

    fn update_label(&mut self, node: NodeId, text: &str) -> bool {
        if !self.in_place_labels {
            return false;
        }
        match self.nodes.get_mut(&node).map(|n| &mut n.primitive) {
            Some(Primitive::Label { text: current }) => {
                *current = text.to_string();
                true
            }
            _ => false,
        }
    }

    fn intersect(&self, ray: &Ray, candidates: &[NodeId]) -> Option<SceneHit> {
        candidates
            .iter()
            .filter(|id| self.is_attached(**id))
            .filter_map(|id| {
                let node = self.nodes.get(id)?;
                let pose = self.world_pose(*id)?;
                let toi = self.ray_toi(node, &pose, ray)?;
                Some(SceneHit {
                    node: *id,
                    point: ray.point_at(toi),
                    distance: toi,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryScene;
    use crate::scene::{Primitive, Scene};
    use rapier3d::prelude::*;

    fn down_ray_at(x: f32, z: f32) -> Ray {
        Ray::new(point![x, 5.0, z], vector![0.0, -1.0, 0.0])
    }

    #[test]
    fn intersect_returns_nearest_attached_candidate() {
        let mut scene = MemoryScene::new();
        let root = scene.root();
        let low = scene.create_node("low", Primitive::Sphere { radius: 0.5 });
        let high = scene.create_node("high", Primitive::Sphere { radius: 0.5 });
        scene.attach(root, low);
        scene.attach(root, high);
        scene.set_position(high, vector![0.0, 2.0, 0.0]);

        let hit = scene
            .intersect(&down_ray_at(0.0, 0.0), &[low, high])
            .expect("ray should hit");
        assert_eq!(hit.node, high);
        assert!((hit.point.y - 2.5).abs() < 1e-4);

        scene.detach(high);
        let hit = scene.intersect(&down_ray_at(0.0, 0.0), &[low, high]).unwrap();
        assert_eq!(hit.node, low);
    }

    #[test]
    fn child_nodes_use_world_transform() {
        let mut scene = MemoryScene::new();
        let root = scene.root();
        let group = scene.create_node("group", Primitive::Group);
        let head = scene.create_node("head", Primitive::Sphere { radius: 0.1 });
        scene.attach(root, group);
        scene.attach(group, head);
        scene.set_position(group, vector![3.0, 0.0, 0.0]);

        assert!(scene.intersect(&down_ray_at(0.0, 0.0), &[head]).is_none());
        assert!(scene.intersect(&down_ray_at(3.0, 0.0), &[head]).is_some());
        assert!(scene.intersect(&down_ray_at(3.0, 0.0), &[group]).is_none());
    }

    #[test]
    fn attach_preserving_world_keeps_pose() {
        let mut scene = MemoryScene::new();
        let root = scene.root();
        let carrier = scene.create_node("carrier", Primitive::Group);
        let model = scene.create_node("model", Primitive::Group);
        scene.attach(root, carrier);
        scene.attach(carrier, model);
        scene.set_position(carrier, vector![1.0, 2.0, 3.0]);
        scene.set_rotation(carrier, Rotation::from_axis_angle(&Vector::y_axis(), 0.5));
        scene.set_position(model, vector![0.0, 0.5, 0.0]);

        let before = scene.world_pose(model).unwrap();
        scene.attach_preserving_world(root, model);
        let after = scene.world_pose(model).unwrap();

        assert_eq!(scene.parent(model), Some(root));
        assert!((before.translation.vector - after.translation.vector).norm() < 1e-5);
        assert!(before.rotation.angle_to(&after.rotation) < 1e-5);
    }

    #[test]
    fn dispose_releases_subtree() {
        let mut scene = MemoryScene::new();
        let root = scene.root();
        let group = scene.create_node("group", Primitive::Group);
        let child = scene.create_node("child", Primitive::Label { text: "x".into() });
        scene.attach(root, group);
        scene.attach(group, child);

        scene.dispose(group);
        assert!(!scene.contains(group));
        assert!(!scene.contains(child));
        assert!(scene.children(root).is_empty());
    }

    #[test]
    fn attach_refuses_parent_cycles() {
        let mut scene = MemoryScene::new();
        let root = scene.root();
        let outer = scene.create_node("outer", Primitive::Group);
        let inner = scene.create_node("inner", Primitive::Sphere { radius: 0.1 });
        scene.attach(root, outer);
        scene.attach(outer, inner);

        scene.attach(inner, outer);
        scene.attach(outer, outer);
        scene.attach(inner, root);

        assert_eq!(scene.parent(outer), Some(root));
        assert_eq!(scene.parent(inner), Some(outer));
        assert_eq!(scene.parent(root), None);
        assert!(scene.is_attached(inner));
        assert!(scene.world_pose(inner).is_some());
    }

    #[test]
    fn label_update_can_be_refused() {
        let mut scene = MemoryScene::without_in_place_labels();
        let label = scene.create_node("label", Primitive::Label { text: "a".into() });
        assert!(!scene.update_label(label, "b"));
        assert_eq!(scene.label_text(label), Some("a"));

        let mut scene = MemoryScene::new();
        let label = scene.create_node("label", Primitive::Label { text: "a".into() });
        assert!(scene.update_label(label, "b"));
        assert_eq!(scene.label_text(label), Some("b"));
    }
}
