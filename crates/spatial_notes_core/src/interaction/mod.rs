//! Pointer picking, carried-object transport and placement.
//!
//! # Responsibility
//! - Resolve the controller ray against the floor and other pickables.
//! - Move the carried body with impulses and commit it as a placed item.
//!
//! # Invariants
//! - Physics owns the carried pose; visuals only mirror it.

pub mod assets;
pub mod placement;
pub mod pointer;
pub mod transport;

pub use assets::{AssetError, AssetLoader, AssetRequest, ModelAsset, ModelLoad};
pub use placement::{finalize, PlacedItem};
pub use pointer::{pick, resolve, Pick, PickTable, PointerHit};
pub use transport::{CarriedModel, Motion, TransportController};
