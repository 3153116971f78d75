//! Session tunables.
//!
//! # Responsibility
//! - Hold every constant the interaction core depends on, with defaults.
//! - Parse host-provided JSON overrides and reject nonsensical values.
//!
//! # Invariants
//! - A config returned by `from_json_str` has passed `validate()`.
//! - Missing JSON fields fall back to `SessionConfig::default()` values.

use rapier3d::prelude::*;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default persistence key for the note collection.
pub const DEFAULT_NOTES_KEY: &str = "spatial-notes.v1";

/// Config parse/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid session config: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Tunables for physics, transport, surfaces, notes and persistence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// World gravity along Y, m/s².
    pub gravity_y: f32,
    /// Half extents of the carried body's collider.
    pub carried_half_extents: [f32; 3],
    /// Spawn position of the carried body relative to the floor height.
    pub spawn_offset: [f32; 3],
    /// Horizontal transport speed, m/s.
    pub move_speed: f32,
    /// Horizontal distance under which the body counts as arrived.
    pub arrival_epsilon: f32,
    /// Yaw rate in rad/s at full thumbstick deflection.
    pub rotation_speed: f32,
    /// Thumbstick deflection ignored around the center.
    pub axis_deadzone: f32,
    pub angular_damping: f32,
    /// Bodies below this height are teleported back to spawn.
    pub pit_height: f32,
    pub floor_half_extent: f32,
    pub floor_thickness: f32,
    pub floor_friction: f32,
    pub wall_friction: f32,
    pub wall_thickness: f32,
    /// Height the downward floor probe starts from.
    pub probe_height: f32,
    pub note_head_radius: f32,
    pub note_stem_height: f32,
    /// Height of the delete dialog above the note it targets.
    pub dialog_offset: f32,
    pub label_max_chars: usize,
    pub notes_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gravity_y: -9.81,
            carried_half_extents: [0.25, 0.25, 0.25],
            spawn_offset: [0.0, 1.0, -1.5],
            move_speed: 1.5,
            arrival_epsilon: 0.02,
            rotation_speed: 1.5,
            axis_deadzone: 0.1,
            angular_damping: 4.0,
            pit_height: -10.0,
            floor_half_extent: 50.0,
            floor_thickness: 0.1,
            floor_friction: 0.8,
            wall_friction: 0.5,
            wall_thickness: 0.05,
            probe_height: 10.0,
            note_head_radius: 0.05,
            note_stem_height: 0.2,
            dialog_offset: 0.45,
            label_max_chars: 80,
            notes_key: DEFAULT_NOTES_KEY.to_string(),
        }
    }
}

impl SessionConfig {
    /// Parses JSON overrides on top of the defaults and validates the result.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges the core relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("move_speed", self.move_speed),
            ("rotation_speed", self.rotation_speed),
            ("arrival_epsilon", self.arrival_epsilon),
            ("floor_half_extent", self.floor_half_extent),
            ("floor_thickness", self.floor_thickness),
            ("wall_thickness", self.wall_thickness),
            ("probe_height", self.probe_height),
            ("note_head_radius", self.note_head_radius),
            ("note_stem_height", self.note_stem_height),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero",
                });
            }
        }
        if self.carried_half_extents.iter().any(|extent| !(*extent > 0.0)) {
            return Err(ConfigError::Invalid {
                field: "carried_half_extents",
                reason: "every half extent must be greater than zero",
            });
        }
        if !(0.0..1.0).contains(&self.axis_deadzone) {
            return Err(ConfigError::Invalid {
                field: "axis_deadzone",
                reason: "must be in [0, 1)",
            });
        }
        if self.pit_height >= self.spawn_offset[1] {
            return Err(ConfigError::Invalid {
                field: "pit_height",
                reason: "must be below the spawn height",
            });
        }
        if self.label_max_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "label_max_chars",
                reason: "must be greater than zero",
            });
        }
        if self.notes_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "notes_key",
                reason: "cannot be empty",
            });
        }
        Ok(())
    }

    pub fn gravity(&self) -> Vector<Real> {
        vector![0.0, self.gravity_y, 0.0]
    }

    pub fn carried_half_extents(&self) -> Vector<Real> {
        Vector::from(self.carried_half_extents)
    }

    /// Spawn position of the carried body for a floor at `floor_height`.
    pub fn spawn_position(&self, floor_height: f32) -> Vector<Real> {
        let [x, y, z] = self.spawn_offset;
        vector![x, floor_height + y, z]
    }
}
