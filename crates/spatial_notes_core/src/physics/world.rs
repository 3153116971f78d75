//! Rigid-body world wrapper over `rapier3d`.
//!
//! # Invariants
//! - `step` advances the simulation exactly once with the given elapsed time.
//! - Handles returned here stay valid until removed through this type.

use rapier3d::prelude::*;

/// Owns every rapier set and the pipeline that steps them.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl PhysicsWorld {
    pub fn new(gravity: Vector<Real>) -> Self {
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Inserts a body-less cuboid collider at `pose`.
    pub fn insert_static_cuboid(
        &mut self,
        half_extents: Vector<Real>,
        pose: Isometry<Real>,
        friction: Real,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .position(pose)
            .friction(friction)
            .build();
        self.colliders.insert(collider)
    }

    pub fn remove_collider(&mut self, handle: ColliderHandle) -> bool {
        self.colliders
            .remove(handle, &mut self.islands, &mut self.bodies, true)
            .is_some()
    }

    /// Inserts a dynamic body that may only spin about the vertical axis.
    pub fn insert_upright_dynamic_body(
        &mut self,
        translation: Vector<Real>,
        half_extents: Vector<Real>,
        angular_damping: Real,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body = RigidBodyBuilder::dynamic()
            .translation(translation)
            .enabled_rotations(false, true, false)
            .angular_damping(angular_damping)
            .build();
        self.insert_body_with_cuboid(body, half_extents)
    }

    /// Inserts a fixed body at `pose` with a matching cuboid collider.
    pub fn insert_fixed_body(
        &mut self,
        pose: Isometry<Real>,
        half_extents: Vector<Real>,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body = RigidBodyBuilder::fixed().position(pose).build();
        self.insert_body_with_cuboid(body, half_extents)
    }

    fn insert_body_with_cuboid(
        &mut self,
        body: RigidBody,
        half_extents: Vector<Real>,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body_handle = self.bodies.insert(body);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .friction(0.7)
            .build();
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);
        (body_handle, collider_handle)
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    pub fn contains_collider(&self, handle: ColliderHandle) -> bool {
        self.colliders.contains(handle)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Advances the world once by `dt` seconds. Non-positive `dt` is skipped.
    pub fn step(&mut self, dt: Real) {
        if !(dt > 0.0) {
            return;
        }
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }
}
