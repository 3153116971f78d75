//! Interaction core for spatial notes and physically carried furniture.
//! This crate owns every per-frame interaction invariant; rendering, input,
//! asset loading and text entry stay behind collaborator traits.

pub mod config;
pub mod db;
pub mod input;
pub mod interaction;
pub mod logging;
pub mod model;
pub mod notes;
pub mod physics;
pub mod scene;
pub mod session;
pub mod store;
pub mod task;

pub use config::{ConfigError, SessionConfig, DEFAULT_NOTES_KEY};
pub use input::{
    Button, ButtonStates, ControllerFrame, DetectedPlane, FrameInput, PlaneOrientation, TargetRay,
    TextEntryAction, TextEntrySurface,
};
pub use interaction::{AssetError, AssetLoader, AssetRequest, ModelAsset, ModelLoad, Motion};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteId, NoteRecord};
pub use notes::{NoteManager, EMPTY_NOTE_LABEL};
pub use physics::PhysicsWorld;
pub use scene::{MemoryScene, NodeId, Primitive, Scene};
pub use session::{FrameReport, Session, Stage};
pub use store::{KeyValueStore, MemoryKeyValueStore, NoteStore, SqliteKeyValueStore, StoreError};
pub use task::Pending;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
