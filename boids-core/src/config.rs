//! Simulation parameters and world setup.
//!
//! [`Params`] holds the live-tunable steering coefficients; the host may
//! change any field between ticks and no range validation is performed.
//! [`WorldConfig`] holds everything fixed at construction time (population
//! size, boundary, obstacle layout, radar resolution).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Live-tunable steering parameters.
///
/// ### Fields
/// - `avoid_factor` - Scale of the separation rule.
/// - `align_factor` - Scale of the alignment rule.
/// - `cohesion_factor` - Scale of the cohesion rule.
/// - `seeking_factor` - Scale of the goal-seeking rule.
/// - `protected_range` - Radius of the separation neighborhood.
/// - `visibility_range` - Radius of the alignment/cohesion neighborhood.
/// - `velocity_limit` - Maximum speed of any boid after a tick.
/// - `nearest_count` - Maximum number of neighbors any rule considers.
/// - `obstacle_detect_range` - Length of the radar rays.
/// - `obstacle_avoid_factor` - Strength of the obstacle-avoidance turn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub avoid_factor: f32,
    pub align_factor: f32,
    pub cohesion_factor: f32,
    pub seeking_factor: f32,
    pub protected_range: f32,
    pub visibility_range: f32,
    pub velocity_limit: f32,
    pub nearest_count: usize,
    pub obstacle_detect_range: f32,
    pub obstacle_avoid_factor: f32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            avoid_factor: 50.0,
            align_factor: 10.0,
            cohesion_factor: 50.0,
            seeking_factor: 3.0,
            protected_range: 3.0,
            visibility_range: 10.0,
            velocity_limit: 30.0,
            nearest_count: 10,
            obstacle_detect_range: 10.0,
            obstacle_avoid_factor: 10_000.0,
        }
    }
}

/// How agents observe each other within a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Agents are stepped one at a time in ascending id order; a boid
    /// stepped later sees the already-updated state of earlier boids.
    #[default]
    Sequential,
    /// All accelerations are computed from the start-of-tick state before
    /// any boid moves, so the outcome does not depend on processing order.
    DoubleBuffered,
}

/// World setup, fixed for the lifetime of a [`crate::simulation::Simulation`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub boid_count: usize,
    /// Half extent of the cubic boundary `[-bound_range, bound_range]^3`.
    pub bound_range: f32,
    pub obstacle_count: usize,
    pub obstacle_radius: f32,
    /// Number of radar directions sampled for obstacle avoidance.
    pub radar_samples: usize,
    /// Cone half-angle of the radar, in quarter turns (`1.0` is a hemisphere).
    pub radar_spread: f32,
    /// Maximum draws when placing a boid outside every obstacle.
    pub respawn_attempts: usize,
    pub start_running: bool,
    pub seeking: bool,
    pub obstacles_enabled: bool,
    pub update_mode: UpdateMode,
    /// Seed for spawning and obstacle layout; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            boid_count: 150,
            bound_range: 20.0,
            obstacle_count: 3,
            obstacle_radius: 3.0,
            radar_samples: 100,
            radar_spread: 1.5,
            respawn_attempts: 64,
            start_running: false,
            seeking: false,
            obstacles_enabled: true,
            update_mode: UpdateMode::Sequential,
            seed: None,
        }
    }
}

impl WorldConfig {
    /// Parses a config from JSON. Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
