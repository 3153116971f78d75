//! Floor/wall collider synchronization with discovered surfaces.
//!
//! # Responsibility
//! - Keep exactly one floor collider in the world and the visual floor at the
//!   same height.
//! - Add a static collider for every discovered vertical surface.
//!
//! # Invariants
//! - The floor collider is replaced inside one call; no step observes zero or
//!   two floor colliders.
//! - A floor probe miss leaves the previous floor untouched.

use super::world::PhysicsWorld;
use crate::config::SessionConfig;
use crate::input::{DetectedPlane, PlaneOrientation};
use crate::scene::{NodeId, Primitive, Scene};
use log::{debug, info, warn};
use rapier3d::parry::query::RayCast;
use rapier3d::parry::shape::Cuboid;
use rapier3d::prelude::*;

const PROBE_HALF_THICKNESS: Real = 1.0e-3;

/// What a discovered plane changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceUpdate {
    WallAdded(ColliderHandle),
    FloorReplaced { height: Real },
    ProbeMissed,
    Ignored,
}

/// Tracks the authoritative floor collider and the wall colliders.
#[derive(Debug)]
pub struct SurfaceSync {
    floor_collider: ColliderHandle,
    floor_height: Real,
    floor_node: NodeId,
    walls: Vec<ColliderHandle>,
}

impl SurfaceSync {
    /// Inserts the default floor at height 0 and its visual plane.
    pub fn install(world: &mut PhysicsWorld, scene: &mut dyn Scene, config: &SessionConfig) -> Self {
        let floor_collider = insert_floor_slab(world, config, 0.0);
        let floor_node = scene.create_node(
            "floor",
            Primitive::Plane {
                half_width: config.floor_half_extent,
                half_depth: config.floor_half_extent,
            },
        );
        scene.attach(scene.root(), floor_node);
        Self {
            floor_collider,
            floor_height: 0.0,
            floor_node,
            walls: Vec::new(),
        }
    }

    pub fn floor_collider(&self) -> ColliderHandle {
        self.floor_collider
    }

    pub fn floor_height(&self) -> Real {
        self.floor_height
    }

    /// Visual floor node; the target ray is resolved against it.
    pub fn floor_node(&self) -> NodeId {
        self.floor_node
    }

    pub fn walls(&self) -> &[ColliderHandle] {
        &self.walls
    }

    /// Reacts to one discovered plane.
    pub fn apply_plane(
        &mut self,
        world: &mut PhysicsWorld,
        scene: &mut dyn Scene,
        config: &SessionConfig,
        plane: &DetectedPlane,
    ) -> SurfaceUpdate {
        if plane.orientation == PlaneOrientation::Vertical {
            let [width, depth] = plane.extent;
            let handle = world.insert_static_cuboid(
                vector![width / 2.0, config.wall_thickness / 2.0, depth / 2.0],
                plane.pose,
                config.wall_friction,
            );
            self.walls.push(handle);
            debug!(
                "event=wall_added module=surfaces status=ok width={width:.2} depth={depth:.2} walls={}",
                self.walls.len()
            );
            return SurfaceUpdate::WallAdded(handle);
        }

        if !plane.is_floor() {
            return SurfaceUpdate::Ignored;
        }

        let Some(height) = probe_floor_height(plane, config.probe_height) else {
            warn!(
                "event=floor_probe module=surfaces status=miss kept_height={:.3}",
                self.floor_height
            );
            return SurfaceUpdate::ProbeMissed;
        };

        world.remove_collider(self.floor_collider);
        self.floor_collider = insert_floor_slab(world, config, height);
        self.floor_height = height;
        scene.set_position(self.floor_node, vector![0.0, height, 0.0]);
        info!("event=floor_replaced module=surfaces status=ok height={height:.3}");
        SurfaceUpdate::FloorReplaced { height }
    }
}

fn insert_floor_slab(world: &mut PhysicsWorld, config: &SessionConfig, height: Real) -> ColliderHandle {
    let half_thickness = config.floor_thickness / 2.0;
    world.insert_static_cuboid(
        vector![config.floor_half_extent, half_thickness, config.floor_half_extent],
        Isometry::translation(0.0, height - half_thickness, 0.0),
        config.floor_friction,
    )
}

/// Casts straight down from `probe_height` above the origin onto the plane.
fn probe_floor_height(plane: &DetectedPlane, probe_height: Real) -> Option<Real> {
    let [width, depth] = plane.extent;
    let shape = Cuboid::new(vector![width / 2.0, PROBE_HALF_THICKNESS, depth / 2.0]);
    let ray = Ray::new(point![0.0, probe_height, 0.0], vector![0.0, -1.0, 0.0]);
    let toi = shape.cast_ray(&plane.pose, &ray, Real::MAX, true)?;
    Some(ray.point_at(toi).y - PROBE_HALF_THICKNESS)
}
