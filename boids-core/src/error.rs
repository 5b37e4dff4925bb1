//! Error types for the boids engine.

use crate::types::AgentId;
use thiserror::Error;

/// Errors raised by [`crate::spatial::SpatialIndex`].
///
/// These indicate a broken invariant in the caller (an id that was never
/// inserted, or inserted twice), not a condition the simulation recovers from.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IndexError {
    #[error("agent {0} has no entry in the spatial index")]
    UnknownId(AgentId),
    #[error("agent {0} already has an entry in the spatial index")]
    DuplicateId(AgentId),
}

/// Errors raised while loading a [`crate::config::WorldConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Umbrella error for simulation operations.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
