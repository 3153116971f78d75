//! Physics collaborator wrapper and surface synchronization.
//!
//! # Responsibility
//! - Own the `rapier3d` world and expose the few operations the core needs.
//! - Keep floor and wall colliders in step with discovered surfaces.

pub mod surfaces;
pub mod world;

pub use surfaces::{SurfaceSync, SurfaceUpdate};
pub use world::PhysicsWorld;
