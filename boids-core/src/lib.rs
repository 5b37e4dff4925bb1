//! Core 3-D boids flocking simulation library.
//!
//! Main components:
//! - [`spatial`] — dynamic nearest-neighbor index over boid positions.
//! - [`obstacle`] — static obstacles and the boundary box, with ray queries.
//! - [`radar`] — sampled look-ahead directions and heading frames.
//! - [`steering`] — separation, alignment, cohesion, seeking and avoidance rules.
//! - [`steering_buffer`] — per-boid acceleration storage between phases.
//! - [`phases`] — integration and per-tick update passes.
//! - [`simulation`] — the simulation loop and host-facing controls.
//! - [`boid`] — boid state, render transforms and spawning.
//! - [`config`] — live parameters and world setup.
//! - [`error`] — error types.
//! - [`types`] — shared type aliases and IDs.

pub mod boid;
pub mod config;
pub mod error;
pub mod obstacle;
pub mod phases;
pub mod radar;
pub mod simulation;
pub mod spatial;
pub mod steering;
pub mod steering_buffer;
pub mod types;

pub use boid::{Boid, BoidTransform};
pub use config::{Params, UpdateMode, WorldConfig};
pub use error::{ConfigError, IndexError, SimError};
pub use simulation::{RunState, Simulation};
