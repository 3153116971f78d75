//! Converting the carried item into a permanently placed one.
//!
//! # Invariants
//! - Without an attached model, `finalize` changes nothing.
//! - The model node moves (not copies) to the scene root with its world pose.
//! - The carrying body is reused, never removed.

use super::transport::TransportController;
use crate::config::SessionConfig;
use crate::physics::PhysicsWorld;
use crate::scene::{NodeId, Scene};
use log::{debug, info};
use rapier3d::prelude::*;

/// A finalized item: its visual node plus a fixed body and collider.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedItem {
    pub name: String,
    pub node: NodeId,
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

/// Drops the carried model where the body stands and recycles the body.
pub fn finalize(
    world: &mut PhysicsWorld,
    scene: &mut dyn Scene,
    config: &SessionConfig,
    transport: &mut TransportController,
) -> Option<PlacedItem> {
    if transport.model().is_none() {
        debug!("event=finalize module=placement status=skip reason=no_model");
        return None;
    }
    let pose = transport.pose(world)?;
    let model = transport.take_model()?;

    let root = scene.root();
    scene.attach_preserving_world(root, model.node);
    scene.set_cast_shadow(model.node, true);

    let (body, collider) =
        world.insert_fixed_body(pose, Vector::from(model.asset.half_extents));
    transport.reset_to_spawn(world, scene, config);

    info!(
        "event=finalize module=placement status=ok name={} x={:.2} y={:.2} z={:.2}",
        model.asset.name, pose.translation.x, pose.translation.y, pose.translation.z
    );
    Some(PlacedItem {
        name: model.asset.name,
        node: model.node,
        body,
        collider,
    })
}

#[cfg(test)]
mod tests {
    use super::finalize;
    use crate::config::SessionConfig;
    use crate::interaction::assets::{AssetLoader, AssetRequest, ModelAsset, ModelLoad};
    use crate::interaction::transport::TransportController;
    use crate::physics::PhysicsWorld;
    use crate::scene::{MemoryScene, Scene};
    use crate::task::Pending;
    use rapier3d::prelude::*;

    struct InstantLoader;

    impl AssetLoader for InstantLoader {
        fn load(&mut self, request: &AssetRequest) -> ModelLoad {
            Pending::ready(Ok(ModelAsset {
                name: request.name.clone(),
                half_extents: [0.4, 0.4, 0.4],
            }))
        }
    }

    fn setup() -> (PhysicsWorld, MemoryScene, SessionConfig, TransportController) {
        let config = SessionConfig {
            gravity_y: 0.0,
            ..SessionConfig::default()
        };
        let mut world = PhysicsWorld::new(config.gravity());
        let mut scene = MemoryScene::new();
        let transport = TransportController::spawn(&mut world, &mut scene, &config, 0.0);
        (world, scene, config, transport)
    }

    #[test]
    fn finalize_without_model_changes_nothing() {
        let (mut world, mut scene, config, mut transport) = setup();
        let bodies = world.body_count();
        let colliders = world.collider_count();

        assert!(finalize(&mut world, &mut scene, &config, &mut transport).is_none());
        assert_eq!(world.body_count(), bodies);
        assert_eq!(world.collider_count(), colliders);
    }

    #[test]
    fn finalize_moves_model_to_root_and_recycles_body() {
        let (mut world, mut scene, config, mut transport) = setup();
        transport.request_model(&mut InstantLoader, &AssetRequest::new("chair"));
        transport.poll_model(&mut scene);

        let target = point![1.0, 1.0, 1.0];
        for _ in 0..30 {
            transport.tick(&mut world, &mut scene, &config, Some(target), 0.0, 1.0 / 60.0);
        }
        let carried_at = transport.pose(&world).unwrap();
        let model_node = transport.model().unwrap().node;
        let model_world = scene.world_pose(model_node).unwrap();
        let bodies = world.body_count();

        let placed = finalize(&mut world, &mut scene, &config, &mut transport).expect("placed");

        assert_eq!(placed.node, model_node);
        assert_eq!(scene.parent(model_node), Some(scene.root()));
        assert!(scene.casts_shadow(model_node));
        let after = scene.world_pose(model_node).unwrap();
        assert!((after.translation.vector - model_world.translation.vector).norm() < 1e-5);

        assert_eq!(world.body_count(), bodies + 1);
        let fixed = world.body(placed.body).unwrap();
        assert!(fixed.is_fixed());
        assert!((fixed.translation() - carried_at.translation.vector).norm() < 1e-5);

        let carrier = world.body(transport.body()).unwrap();
        assert!(carrier.is_dynamic());
        assert_eq!(*carrier.linvel(), Vector::zeros());
        assert!((carrier.translation() - config.spawn_position(0.0)).norm() < 1e-5);
        assert!(transport.model().is_none());
    }
}
