//! Target-ray picking.
//!
//! # Responsibility
//! - Resolve the controller ray to the nearest hit among candidate nodes.
//! - Map hit nodes back to their owners through an explicit table.
//!
//! # Invariants
//! - Resolution is side-effect free.
//! - A missing pose or a miss is `None`, never an error.

use crate::input::TargetRay;
use crate::scene::{NodeId, Scene};
use rapier3d::prelude::*;
use std::collections::BTreeMap;

/// Nearest intersection along the target ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerHit {
    pub point: Point<Real>,
    pub node: NodeId,
}

/// A hit resolved to the owner registered for the hit node.
#[derive(Debug, Clone, PartialEq)]
pub struct Pick<K> {
    pub owner: K,
    pub point: Point<Real>,
    pub node: NodeId,
}

/// Pickable node → owner mapping.
#[derive(Debug, Clone)]
pub struct PickTable<K> {
    owners: BTreeMap<NodeId, K>,
}

impl<K> Default for PickTable<K> {
    fn default() -> Self {
        Self {
            owners: BTreeMap::new(),
        }
    }
}

impl<K: Clone + PartialEq> PickTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, node: NodeId, owner: K) {
        self.owners.insert(node, owner);
    }

    /// Drops every node owned by `owner`, returning how many were removed.
    pub fn remove_owner(&mut self, owner: &K) -> usize {
        let before = self.owners.len();
        self.owners.retain(|_, current| current != owner);
        before - self.owners.len()
    }

    pub fn owner(&self, node: NodeId) -> Option<&K> {
        self.owners.get(&node)
    }

    pub fn candidates(&self) -> Vec<NodeId> {
        self.owners.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &K)> {
        self.owners.iter().map(|(node, owner)| (*node, owner))
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Nearest hit of `ray` among `candidates`.
pub fn resolve(
    scene: &dyn Scene,
    ray: Option<&TargetRay>,
    candidates: &[NodeId],
) -> Option<PointerHit> {
    let ray = ray?;
    if candidates.is_empty() {
        return None;
    }
    scene
        .intersect(&ray.to_ray(), candidates)
        .map(|hit| PointerHit {
            point: hit.point,
            node: hit.node,
        })
}

/// Nearest hit of `ray` among the table's nodes, resolved to its owner.
pub fn pick<K: Clone + PartialEq>(
    scene: &dyn Scene,
    ray: Option<&TargetRay>,
    table: &PickTable<K>,
) -> Option<Pick<K>> {
    let hit = resolve(scene, ray, &table.candidates())?;
    let owner = table.owner(hit.node)?.clone();
    Some(Pick {
        owner,
        point: hit.point,
        node: hit.node,
    })
}
