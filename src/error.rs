//! Error types for the simulation boundary
//!
//! Nothing inside the per-frame core is fatal. Errors only surface where
//! outside input enters: tuning files, spawn parameters, fire rays and
//! asset instantiation.

use thiserror::Error;

use crate::collab::ModelKind;
use crate::sim::EntityId;

/// Errors rejected at the simulation boundary
#[derive(Debug, Error)]
pub enum SimError {
    /// Spawn annulus with min above max, or a negative/non-finite radius
    #[error("invalid spawn ring: min {min} max {max}")]
    InvalidSpawnRing { min: f32, max: f32 },

    /// Fire ray with a zero-length or non-finite direction
    #[error("fire direction must be a finite non-zero vector")]
    InvalidDirection,

    /// Tuning value outside its allowed range
    #[error("invalid tuning: {0}")]
    InvalidTuning(String),

    /// Tuning JSON could not be parsed
    #[error("failed to parse tuning: {0}")]
    TuningParse(#[from] serde_json::Error),

    /// Entity id not present in the registry
    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),
}

/// Failures reported by the asset collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssetError {
    /// The model has not finished loading (or never will)
    #[error("model {0:?} is not available")]
    ModelUnavailable(ModelKind),

    /// Loading failed outright
    #[error("loading {model:?} failed: {reason}")]
    LoadFailed { model: ModelKind, reason: String },
}

/// Result type for simulation boundary operations
pub type SimResult<T> = Result<T, SimError>;
