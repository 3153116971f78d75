//! Impulse-driven transport of the carried body.
//!
//! # Responsibility
//! - Move the carried body toward the target point and stop it on arrival.
//! - Apply yaw from the thumbstick every frame, target or not.
//! - Step the world once per frame and mirror the body onto its visual group.
//! - Own the carried model slot and its in-flight load.
//!
//! # Invariants
//! - At most one model load is in flight; requests during a load are ignored.
//! - Loaded models attach during a later `poll_model`, never synchronously.
//! - Visual transforms follow the body, never the other way around.
//! - After arrival the linear velocity is zero at the end of every frame
//!   until a target beyond the arrival threshold appears.

use super::assets::{AssetLoader, AssetRequest, ModelAsset, ModelLoad};
use crate::config::SessionConfig;
use crate::physics::PhysicsWorld;
use crate::scene::{NodeId, Primitive, Scene};
use crate::task::Pending;
use log::{debug, info, warn};
use rapier3d::prelude::*;

/// Motion state reported by one transport tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// No target this frame.
    Idle,
    Seeking { distance: Real },
    Arrived,
}

/// A model attached to the carried group.
#[derive(Debug, Clone, PartialEq)]
pub struct CarriedModel {
    pub node: NodeId,
    pub asset: ModelAsset,
}

/// Drives the single carried body.
pub struct TransportController {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    group: NodeId,
    indicator: NodeId,
    model: Option<CarriedModel>,
    loading: Option<ModelLoad>,
    floor_height: Real,
    /// Set on arrival, cleared once the body seeks again.
    parked: bool,
}

impl TransportController {
    /// Spawns the carried body above `floor_height` with no model attached.
    pub fn spawn(
        world: &mut PhysicsWorld,
        scene: &mut dyn Scene,
        config: &SessionConfig,
        floor_height: Real,
    ) -> Self {
        let (body, collider) = world.insert_upright_dynamic_body(
            config.spawn_position(floor_height),
            config.carried_half_extents(),
            config.angular_damping,
        );

        let root = scene.root();
        let group = scene.create_node("carried", Primitive::Group);
        scene.attach(root, group);
        scene.set_position(group, config.spawn_position(floor_height));

        let indicator = scene.create_node(
            "target-indicator",
            Primitive::Cylinder {
                half_height: 0.005,
                radius: 0.15,
            },
        );
        scene.attach(root, indicator);
        scene.set_visible(indicator, false);

        Self {
            body,
            collider,
            group,
            indicator,
            model: None,
            loading: None,
            floor_height,
            parked: false,
        }
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    pub fn group(&self) -> NodeId {
        self.group
    }

    pub fn indicator(&self) -> NodeId {
        self.indicator
    }

    pub fn model(&self) -> Option<&CarriedModel> {
        self.model.as_ref()
    }

    pub fn is_parked(&self) -> bool {
        self.parked
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn position(&self, world: &PhysicsWorld) -> Option<Point<Real>> {
        world.body(self.body).map(|b| Point::from(*b.translation()))
    }

    pub fn pose(&self, world: &PhysicsWorld) -> Option<Isometry<Real>> {
        world.body(self.body).map(|b| *b.position())
    }

    /// Starts loading a model unless one is attached or already loading.
    pub fn request_model(&mut self, loader: &mut dyn AssetLoader, request: &AssetRequest) -> bool {
        if self.loading.is_some() {
            debug!(
                "event=model_request module=transport status=skip reason=in_flight name={}",
                request.name
            );
            return false;
        }
        if self.model.is_some() {
            debug!(
                "event=model_request module=transport status=skip reason=occupied name={}",
                request.name
            );
            return false;
        }
        info!(
            "event=model_request module=transport status=start name={}",
            request.name
        );
        self.loading = Some(loader.load(request));
        true
    }

    /// Attaches a finished load to the carried group.
    pub fn poll_model(&mut self, scene: &mut dyn Scene) {
        let Some(loading) = self.loading.as_mut() else {
            return;
        };
        match loading.take_ready() {
            Some(Ok(asset)) => {
                let node = scene.create_node(
                    &asset.name,
                    Primitive::Model {
                        name: asset.name.clone(),
                        half_extents: Vector::from(asset.half_extents),
                    },
                );
                scene.attach(self.group, node);
                info!(
                    "event=model_attach module=transport status=ok name={}",
                    asset.name
                );
                self.model = Some(CarriedModel { node, asset });
                self.loading = None;
            }
            Some(Err(err)) => {
                warn!("event=model_attach module=transport status=error error={err}");
                self.loading = None;
            }
            None if matches!(loading, Pending::Abandoned) => self.loading = None,
            None => {}
        }
    }

    pub(crate) fn take_model(&mut self) -> Option<CarriedModel> {
        self.model.take()
    }

    /// Runs one frame of transport and steps the world.
    pub fn tick(
        &mut self,
        world: &mut PhysicsWorld,
        scene: &mut dyn Scene,
        config: &SessionConfig,
        target: Option<Point<Real>>,
        yaw_axis: f32,
        dt: Real,
    ) -> Motion {
        let motion = match target {
            None => {
                scene.set_visible(self.indicator, false);
                Motion::Idle
            }
            Some(target) => {
                scene.set_visible(self.indicator, true);
                scene.set_position(self.indicator, target.coords);
                self.seek(world, config, target, dt)
            }
        };

        match motion {
            Motion::Arrived => self.parked = true,
            Motion::Seeking { .. } => self.parked = false,
            Motion::Idle => {}
        }

        self.apply_yaw(world, config, yaw_axis);
        world.step(dt);
        if self.parked {
            self.hold_still(world, config);
        }
        self.recover_from_pit(world, config);
        self.sync_visual(world, scene);
        motion
    }

    /// Cancels what the step added to a parked body's velocity.
    ///
    /// Vertical speed is kept once it exceeds the arrival threshold so a
    /// parked body that lost its support still falls.
    fn hold_still(&self, world: &mut PhysicsWorld, config: &SessionConfig) {
        let Some(body) = world.body_mut(self.body) else {
            return;
        };
        let current = *body.linvel();
        let vertical = if current.y.abs() < config.arrival_epsilon {
            0.0
        } else {
            current.y
        };
        let held = vector![0.0, vertical, 0.0];
        if held != current {
            body.set_linvel(held, false);
        }
    }

    fn seek(
        &mut self,
        world: &mut PhysicsWorld,
        config: &SessionConfig,
        target: Point<Real>,
        dt: Real,
    ) -> Motion {
        let Some(body) = world.body_mut(self.body) else {
            return Motion::Idle;
        };

        let mut displacement = target.coords - body.translation();
        displacement.y = 0.0;
        let distance = displacement.norm();

        if distance < config.arrival_epsilon {
            body.set_linvel(Vector::zeros(), true);
            return Motion::Arrived;
        }

        // Cap the speed so the last step lands on the target instead of past it.
        let reachable = if dt > 0.0 { distance / dt } else { config.move_speed };
        let desired = displacement / distance * config.move_speed.min(reachable);
        let current = body.linvel();
        let change = vector![desired.x - current.x, 0.0, desired.z - current.z];
        let impulse = change * body.mass();
        body.apply_impulse(impulse, true);
        Motion::Seeking { distance }
    }

    fn apply_yaw(&mut self, world: &mut PhysicsWorld, config: &SessionConfig, axis: f32) {
        if axis.abs() <= config.axis_deadzone {
            return;
        }
        let Some(body) = world.body_mut(self.body) else {
            return;
        };
        let [hx, _, hz] = config.carried_half_extents;
        let yaw_inertia = body.mass() * (hx * hx + hz * hz) / 3.0;
        let desired = -axis.clamp(-1.0, 1.0) * config.rotation_speed;
        let change = desired - body.angvel().y;
        body.apply_torque_impulse(vector![0.0, change * yaw_inertia, 0.0], true);
    }

    fn recover_from_pit(&mut self, world: &mut PhysicsWorld, config: &SessionConfig) {
        let spawn = config.spawn_position(self.floor_height);
        let Some(body) = world.body_mut(self.body) else {
            return;
        };
        if body.translation().y < config.pit_height {
            warn!(
                "event=pit_recovery module=transport status=ok y={:.2}",
                body.translation().y
            );
            body.set_translation(spawn, true);
        }
    }

    fn sync_visual(&self, world: &PhysicsWorld, scene: &mut dyn Scene) {
        if let Some(body) = world.body(self.body) {
            scene.set_position(self.group, *body.translation());
            scene.set_rotation(self.group, *body.rotation());
        }
    }

    /// Puts the body back at the spawn pose with zero velocity.
    pub fn reset_to_spawn(&mut self, world: &mut PhysicsWorld, scene: &mut dyn Scene, config: &SessionConfig) {
        let spawn = config.spawn_position(self.floor_height);
        self.parked = false;
        if let Some(body) = world.body_mut(self.body) {
            body.set_translation(spawn, true);
            body.set_rotation(Rotation::identity(), true);
            body.set_linvel(Vector::zeros(), true);
            body.set_angvel(Vector::zeros(), true);
        }
        self.sync_visual(world, scene);
    }

    /// Moves the body to hover above a new floor height.
    pub fn rest_on_floor(
        &mut self,
        world: &mut PhysicsWorld,
        scene: &mut dyn Scene,
        config: &SessionConfig,
        floor_height: Real,
    ) {
        self.floor_height = floor_height;
        if let Some(body) = world.body_mut(self.body) {
            let mut translation = *body.translation();
            translation.y = floor_height + config.spawn_offset[1];
            body.set_translation(translation, true);
            body.set_linvel(Vector::zeros(), true);
        }
        self.sync_visual(world, scene);
    }
}
