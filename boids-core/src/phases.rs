//! Integration phases for one simulation tick.
//!
//! A tick runs in one of two shapes:
//!
//! - [`sequential_pass`] — each boid in ascending id order is steered,
//!   integrated and re-indexed before the next one is looked at, so later
//!   boids see the already-moved earlier ones.
//! - [`double_buffered_pass`] — [`steering_phase`] computes every
//!   acceleration from the start-of-tick state into a [`SteeringBuffer`],
//!   [`integration_phase`] moves every boid, and [`sync_index`] brings the
//!   spatial index up to date.
//!
//! Both shapes share [`integrate`], which advances a single boid:
//!
//! 1. `vel += accel * dt`.
//! 2. [`apply_boundary`] — out-of-bounds axes get a small inward velocity.
//! 3. [`limit_velocity`] — speed is clamped to `velocity_limit`.
//! 4. [`prevent_collision`] — the step is shortened to stop short of any
//!    surface it would cross.
//! 5. `pos += vel * dt`.

use glam::Vec3;
use tracing::warn;

use crate::{
    boid::Boid,
    config::Params,
    error::IndexError,
    obstacle::ObstacleField,
    radar::Radar,
    spatial::SpatialIndex,
    steering::{self, FlockView, Modes},
    steering_buffer::SteeringBuffer,
    types::AgentId,
};

/// Inward speed given to a boid on every axis where it is out of bounds.
pub const BOUNDARY_NUDGE: f32 = 0.01;

/// Fraction of the distance to a surface a boid may cover in one step.
pub const COLLISION_MARGIN: f32 = 0.9;

/// Everything a tick reads besides the flock itself.
#[derive(Clone, Copy, Debug)]
pub struct TickEnv<'a> {
    pub field: &'a ObstacleField,
    pub radar: &'a Radar,
    pub params: &'a Params,
    pub modes: Modes,
    pub target: Vec3,
    pub dt: f32,
}

/// Overrides the velocity on every axis where `pos` lies outside
/// `[-bound, bound]` with [`BOUNDARY_NUDGE`] pointing back inside.
///
/// This is a hard set, not an added force; it repeats every tick the boid
/// stays outside.
///
/// ### Parameters
/// - `pos` - Position at the start of the step.
/// - `vel` - Velocity after steering.
/// - `bound` - Half extent of the boundary box.
///
/// ### Returns
/// The velocity with out-of-bounds axes overridden.
pub fn apply_boundary(pos: Vec3, vel: Vec3, bound: f32) -> Vec3 {
    let mut vel = vel;
    for axis in 0..3 {
        if pos[axis] < -bound {
            vel[axis] = BOUNDARY_NUDGE;
        } else if pos[axis] > bound {
            vel[axis] = -BOUNDARY_NUDGE;
        }
    }
    vel
}

/// Rescales `vel` so its length does not exceed `limit`.
///
/// ### Parameters
/// - `vel` - Velocity after steering and the boundary nudge.
/// - `limit` - Maximum speed; a negative limit behaves like zero.
///
/// ### Returns
/// `vel` unchanged if it is already slow enough, otherwise a vector with
/// the same direction and length exactly `limit`. Vectors too long to
/// square in `f32` are measured on a pre-scaled copy.
pub fn limit_velocity(vel: Vec3, limit: f32) -> Vec3 {
    let limit = limit.max(0.0);
    if vel.is_finite() && !vel.length_squared().is_finite() {
        let scale = vel.abs().max_element();
        let scaled = vel / scale;
        if scaled.length() > limit / scale {
            return scaled.normalize_or_zero() * limit;
        }
        return vel;
    }
    vel.clamp_length_max(limit)
}

/// Shortens the step so the boid stops at [`COLLISION_MARGIN`] of the
/// distance to the first surface along its path this tick.
///
/// Without this, a fast boid or a long `dt` could carry a boid straight
/// through a thin obstacle or out of the boundary.
///
/// ### Parameters
/// - `pos` - Position at the start of the step.
/// - `vel` - Speed-limited velocity.
/// - `dt` - Step length in seconds.
/// - `field` - Obstacles and boundary to test against.
///
/// ### Returns
/// `vel` if the path is clear (or `dt`/speed is not positive), otherwise a
/// velocity along the same direction that stops short of the hit.
pub fn prevent_collision(pos: Vec3, vel: Vec3, dt: f32, field: &ObstacleField) -> Vec3 {
    let speed = vel.length();
    if !(dt > 0.0) || !(speed > 0.0) {
        return vel;
    }
    let dir = vel / speed;
    match field.raycast(pos, dir, speed * dt) {
        Some(hit) => dir * (COLLISION_MARGIN * hit / dt),
        None => vel,
    }
}

/// Advances one boid by `dt` under acceleration `accel`.
///
/// If the result is not finite the boid keeps its old position and stops,
/// so a degenerate parameter set can never put NaN into the flock.
///
/// ### Parameters
/// - `boid` - State at the start of the step.
/// - `accel` - Summed steering acceleration.
/// - `dt` - Step length in seconds.
/// - `field` - Obstacles and boundary.
/// - `params` - Live parameters (only `velocity_limit` is read).
///
/// ### Returns
/// The boid's state after the step.
pub fn integrate(boid: Boid, accel: Vec3, dt: f32, field: &ObstacleField, params: &Params) -> Boid {
    let mut vel = boid.vel + accel * dt;
    vel = apply_boundary(boid.pos, vel, field.boundary().half_extent);
    vel = limit_velocity(vel, params.velocity_limit);
    vel = prevent_collision(boid.pos, vel, dt, field);
    let pos = boid.pos + vel * dt;

    if !(pos.is_finite() && vel.is_finite()) {
        warn!(?boid, ?accel, dt, "non-finite integration result, boid halted");
        return Boid::new(boid.pos, Vec3::ZERO);
    }
    Boid::new(pos, vel)
}

fn finite_or_zero(id: AgentId, accel: Vec3) -> Vec3 {
    if accel.is_finite() {
        accel
    } else {
        warn!(id, ?accel, "discarding non-finite steering acceleration");
        Vec3::ZERO
    }
}

/// Steers, integrates and re-indexes each boid in turn.
///
/// ### Parameters
/// - `boids` - The flock, updated in place in ascending id order.
/// - `index` - Spatial index keyed by id; kept in step with `boids`.
/// - `env` - Field, radar, parameters, modes, target and `dt`.
///
/// ### Errors
/// [`IndexError::UnknownId`] if `index` is missing a boid.
pub fn sequential_pass(
    boids: &mut [Boid],
    index: &mut SpatialIndex,
    env: &TickEnv,
) -> Result<(), IndexError> {
    for id in 0..boids.len() {
        let accel = {
            let view = FlockView {
                boids,
                index,
                field: env.field,
                radar: env.radar,
            };
            steering::steer(id, &view, env.params, env.modes, env.target)?
        };

        let next = integrate(
            boids[id],
            finite_or_zero(id, accel),
            env.dt,
            env.field,
            env.params,
        );
        boids[id] = next;
        index.update(id, next.pos)?;
    }
    Ok(())
}

/// Computes every boid's acceleration from the current state into `buf`.
///
/// The buffer is resized and cleared to `boids.len()` first.
///
/// ### Errors
/// [`IndexError::UnknownId`] if `index` is missing a boid.
pub fn steering_phase(
    boids: &[Boid],
    index: &SpatialIndex,
    env: &TickEnv,
    buf: &mut SteeringBuffer,
) -> Result<(), IndexError> {
    buf.ensure_len(boids.len());

    let view = FlockView {
        boids,
        index,
        field: env.field,
        radar: env.radar,
    };
    for id in 0..boids.len() {
        let accel = steering::steer(id, &view, env.params, env.modes, env.target)?;
        buf.set(id, finite_or_zero(id, accel));
    }
    Ok(())
}

/// Moves every boid by the acceleration stored for it in `buf`.
///
/// ### Parameters
/// - `boids` - The flock, updated in place.
/// - `buf` - Accelerations from [`steering_phase`]; must be at least as
///   long as `boids`.
/// - `env` - Field, parameters and `dt` for this tick.
pub fn integration_phase(boids: &mut [Boid], buf: &SteeringBuffer, env: &TickEnv) {
    for (boid, &accel) in boids.iter_mut().zip(buf.as_slice()) {
        *boid = integrate(*boid, accel, env.dt, env.field, env.params);
    }
}

/// Writes every boid's current position into the index.
pub fn sync_index(boids: &[Boid], index: &mut SpatialIndex) -> Result<(), IndexError> {
    for (id, boid) in boids.iter().enumerate() {
        if index.position(id) != Some(boid.pos) {
            index.update(id, boid.pos)?;
        }
    }
    Ok(())
}

/// Order-independent tick: steer all, then move all, then re-index.
///
/// ### Parameters
/// - `boids` - The flock, updated in place.
/// - `index` - Spatial index keyed by id.
/// - `env` - Field, radar, parameters, modes, target and `dt`.
/// - `buf` - Scratch storage for accelerations, reused across ticks.
///
/// ### Errors
/// [`IndexError::UnknownId`] if `index` is missing a boid.
pub fn double_buffered_pass(
    boids: &mut [Boid],
    index: &mut SpatialIndex,
    env: &TickEnv,
    buf: &mut SteeringBuffer,
) -> Result<(), IndexError> {
    steering_phase(boids, index, env, buf)?;
    integration_phase(boids, buf, env);
    sync_index(boids, index)
}
