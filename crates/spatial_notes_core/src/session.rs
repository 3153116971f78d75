//! Per-frame interaction session.
//!
//! # Responsibility
//! - Own every collaborator and piece of interaction state explicitly.
//! - Run one frame in a fixed order: pointer, transport, placement, notes.
//! - Accept host callbacks (planes, text entry, placement requests).
//!
//! # Invariants
//! - Until the physics world is ready, `tick` does nothing.
//! - Work requested before the world is ready is queued and replayed once.
//! - No failure inside a frame stops later frames.

use crate::config::SessionConfig;
use crate::input::{Button, DetectedPlane, FrameInput, TextEntryAction, TextEntrySurface};
use crate::interaction::assets::{AssetLoader, AssetRequest};
use crate::interaction::placement::{finalize, PlacedItem};
use crate::interaction::pointer::resolve;
use crate::interaction::transport::{Motion, TransportController};
use crate::notes::{NoteContext, NoteManager};
use crate::physics::{PhysicsWorld, SurfaceSync, SurfaceUpdate};
use crate::scene::Scene;
use crate::store::NoteStore;
use crate::task::Pending;
use log::{debug, info};
use rapier3d::prelude::*;

/// Physics-backed state that exists once the world has loaded.
pub struct Stage {
    pub world: PhysicsWorld,
    pub surfaces: SurfaceSync,
    pub transport: TransportController,
    pub placed: Vec<PlacedItem>,
}

/// What one frame did, for hosts and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub motion: Motion,
    pub target: Option<Point<Real>>,
    pub placed: bool,
}

pub struct Session<S: Scene> {
    config: SessionConfig,
    scene: S,
    physics: Pending<PhysicsWorld>,
    stage: Option<Stage>,
    notes: NoteManager,
    store: NoteStore,
    editor: Box<dyn TextEntrySurface>,
    assets: Box<dyn AssetLoader>,
    queued_placement: Option<AssetRequest>,
    queued_planes: Vec<DetectedPlane>,
}

impl<S: Scene> Session<S> {
    /// Builds a session and restores stored notes into `scene`.
    pub fn new(
        config: SessionConfig,
        mut scene: S,
        physics: Pending<PhysicsWorld>,
        store: NoteStore,
        editor: Box<dyn TextEntrySurface>,
        assets: Box<dyn AssetLoader>,
    ) -> Self {
        let mut notes = NoteManager::new();
        notes.restore(&mut scene, &config, store.load());
        Self {
            config,
            scene,
            physics,
            stage: None,
            notes,
            store,
            editor,
            assets,
            queued_placement: None,
            queued_planes: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.stage.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.stage.is_some()
    }

    pub fn notes(&self) -> &NoteManager {
        &self.notes
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    /// Runs one frame. Returns `None` while the world is still loading.
    pub fn tick(&mut self, frame: &FrameInput) -> Option<FrameReport> {
        if self.stage.is_none() {
            self.try_build_stage();
        }
        let stage = self.stage.as_mut()?;

        stage.transport.poll_model(&mut self.scene);

        let ray = frame.target_ray();
        let target = resolve(&self.scene, ray.as_ref(), &[stage.surfaces.floor_node()])
            .map(|hit| hit.point);

        let motion = stage.transport.tick(
            &mut stage.world,
            &mut self.scene,
            &self.config,
            target,
            frame.thumbstick_x(),
            frame.dt,
        );

        let mut placed = false;
        if frame.clicked(Button::Place) {
            if let Some(item) = finalize(
                &mut stage.world,
                &mut self.scene,
                &self.config,
                &mut stage.transport,
            ) {
                stage.placed.push(item);
                placed = true;
            }
        }

        let fallback = stage.transport.position(&stage.world);
        let mut ctx = NoteContext {
            scene: &mut self.scene,
            config: &self.config,
            store: &mut self.store,
            editor: self.editor.as_mut(),
        };
        self.notes.tick(&mut ctx, frame, target, fallback);

        Some(FrameReport {
            motion,
            target,
            placed,
        })
    }

    /// Host callback for every surface environment understanding reports.
    pub fn on_plane_detected(&mut self, plane: DetectedPlane) {
        match self.stage.as_mut() {
            Some(stage) => Self::apply_plane(stage, &mut self.scene, &self.config, &plane),
            None => {
                debug!(
                    "event=plane_queued module=session status=ok queued={}",
                    self.queued_planes.len() + 1
                );
                self.queued_planes.push(plane);
            }
        }
    }

    /// Host callback for the text-entry overlay.
    pub fn on_text_entry(&mut self, action: TextEntryAction) {
        let mut ctx = NoteContext {
            scene: &mut self.scene,
            config: &self.config,
            store: &mut self.store,
            editor: self.editor.as_mut(),
        };
        self.notes.on_text_entry(&mut ctx, action);
    }

    /// Asks for a model to carry. Returns whether a load started now.
    ///
    /// Requests made before the world is ready are held (latest wins).
    pub fn request_placement(&mut self, request: AssetRequest) -> bool {
        match self.stage.as_mut() {
            Some(stage) => stage.transport.request_model(self.assets.as_mut(), &request),
            None => {
                debug!(
                    "event=placement_queued module=session status=ok name={}",
                    request.name
                );
                self.queued_placement = Some(request);
                false
            }
        }
    }

    fn try_build_stage(&mut self) {
        let Some(mut world) = self.physics.take_ready() else {
            return;
        };
        let surfaces = SurfaceSync::install(&mut world, &mut self.scene, &self.config);
        let transport = TransportController::spawn(
            &mut world,
            &mut self.scene,
            &self.config,
            surfaces.floor_height(),
        );
        let mut stage = Stage {
            world,
            surfaces,
            transport,
            placed: Vec::new(),
        };
        info!(
            "event=stage_ready module=session status=ok queued_planes={} queued_placement={}",
            self.queued_planes.len(),
            self.queued_placement.is_some()
        );

        for plane in std::mem::take(&mut self.queued_planes) {
            Self::apply_plane(&mut stage, &mut self.scene, &self.config, &plane);
        }
        if let Some(request) = self.queued_placement.take() {
            stage
                .transport
                .request_model(self.assets.as_mut(), &request);
        }
        self.stage = Some(stage);
    }

    fn apply_plane(stage: &mut Stage, scene: &mut S, config: &SessionConfig, plane: &DetectedPlane) {
        let update = stage
            .surfaces
            .apply_plane(&mut stage.world, scene, config, plane);
        if let SurfaceUpdate::FloorReplaced { height } = update {
            stage
                .transport
                .rest_on_floor(&mut stage.world, scene, config, height);
        }
    }
}
