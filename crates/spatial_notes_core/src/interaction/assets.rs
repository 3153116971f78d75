//! Asset-loading collaborator contract.

use crate::task::Pending;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which furniture item to load for the carried object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub name: String,
}

impl AssetRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A loaded model, reduced to what the core needs: a name and its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    pub name: String,
    pub half_extents: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    Unknown(String),
    Failed { name: String, reason: String },
}

impl Display for AssetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "unknown asset `{name}`"),
            Self::Failed { name, reason } => write!(f, "failed to load `{name}`: {reason}"),
        }
    }
}

impl Error for AssetError {}

pub type ModelLoad = Pending<Result<ModelAsset, AssetError>>;

/// Starts model loads; completion is observed by polling the returned slot.
pub trait AssetLoader {
    fn load(&mut self, request: &AssetRequest) -> ModelLoad;
}
