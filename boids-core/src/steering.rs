//! Steering rules.
//!
//! Every rule is a pure function of one boid's state and what it can see,
//! returning an acceleration. [`steer`] sums the rules that are active for
//! the current [`Modes`].

use glam::Vec3;

use crate::{
    boid::Boid, config::Params, error::IndexError, obstacle::ObstacleField, radar,
    radar::Radar, spatial::SpatialIndex, types::AgentId,
};

/// Added to the forward hit distance so that a boid touching an obstacle
/// still gets a finite avoidance turn.
pub const AVOID_EPSILON: f32 = 0.01;

/// Read-only view of everything a rule may look at.
///
/// `index` must hold an entry for every boid in `boids`, keyed by position
/// in the slice.
#[derive(Clone, Copy, Debug)]
pub struct FlockView<'a> {
    pub boids: &'a [Boid],
    pub index: &'a SpatialIndex,
    pub field: &'a ObstacleField,
    pub radar: &'a Radar,
}

/// Optional rules switched on by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modes {
    pub seeking: bool,
    pub obstacles: bool,
}

/// Pushes away from every neighbor inside `protected_range`.
///
/// ### Parameters
/// - `id` - Boid being steered.
/// - `view` - Flock, index and surroundings.
/// - `params` - Uses `protected_range`, `nearest_count` and `avoid_factor`.
///
/// ### Returns
/// `avoid_factor * Σ (self.pos - neighbor.pos)` over the nearest
/// `nearest_count` neighbors in range, or zero when there are none.
///
/// ### Errors
/// [`IndexError::UnknownId`] if `id` is not in `view.index`.
pub fn separation(id: AgentId, view: &FlockView, params: &Params) -> Result<Vec3, IndexError> {
    let neighbors = view
        .index
        .query(id, params.nearest_count, params.protected_range)?;
    Ok(separation_from(id, &neighbors, view.boids, params))
}

/// Steers toward the mean velocity of neighbors inside `visibility_range`.
///
/// ### Returns
/// `align_factor * mean(neighbor.vel - self.vel)`, or zero without
/// neighbors.
///
/// ### Errors
/// [`IndexError::UnknownId`] if `id` is not in `view.index`.
pub fn alignment(id: AgentId, view: &FlockView, params: &Params) -> Result<Vec3, IndexError> {
    let neighbors = visible_neighbors(id, view, params)?;
    Ok(alignment_from(id, &neighbors, view.boids, params))
}

/// Steers toward the center of neighbors inside `visibility_range`.
///
/// ### Returns
/// `cohesion_factor * mean(neighbor.pos - self.pos)`, or zero without
/// neighbors.
///
/// ### Errors
/// [`IndexError::UnknownId`] if `id` is not in `view.index`.
pub fn cohesion(id: AgentId, view: &FlockView, params: &Params) -> Result<Vec3, IndexError> {
    let neighbors = visible_neighbors(id, view, params)?;
    Ok(cohesion_from(id, &neighbors, view.boids, params))
}

/// Steers toward `target` at full speed.
///
/// A boid sitting exactly on the target has no preferred direction, so
/// the rule only brakes it.
pub fn seek(boid: &Boid, target: Vec3, params: &Params) -> Vec3 {
    let desired = (target - boid.pos)
        .try_normalize()
        .map_or(Vec3::ZERO, |dir| dir * params.velocity_limit);
    (desired - boid.vel) * params.seeking_factor
}

/// Turns away from obstacles and walls detected ahead.
///
/// Radar directions are tried in order after rotating them into the boid's
/// heading frame. If the straight-ahead ray is clear nothing happens;
/// otherwise the first clear direction is returned, scaled so that closer
/// obstacles give sharper turns. When every ray is blocked the rule gives
/// up and returns zero.
pub fn avoid_obstacles(boid: &Boid, field: &ObstacleField, radar: &Radar, params: &Params) -> Vec3 {
    let rotation = radar::heading(boid.vel);
    let range = params.obstacle_detect_range;
    let mut forward_hit = 0.0;

    for (j, local) in radar.directions().iter().enumerate() {
        let dir = rotation * *local;
        match field.raycast(boid.pos, dir, range) {
            None if j == 0 => return Vec3::ZERO,
            None => return dir * (params.obstacle_avoid_factor / (forward_hit + AVOID_EPSILON)),
            Some(dist) if j == 0 => forward_hit = dist,
            Some(_) => {}
        }
    }

    Vec3::ZERO
}

/// Sum of every active rule for boid `id`.
///
/// Alignment and cohesion share one neighbor query.
///
/// ### Parameters
/// - `id` - Boid being steered.
/// - `view` - Flock, index and surroundings.
/// - `params` - Live parameters.
/// - `modes` - Which optional rules (seeking, obstacle avoidance) apply.
/// - `target` - Goal point for seeking.
///
/// ### Errors
/// [`IndexError::UnknownId`] if `id` is not in `view.index`.
pub fn steer(
    id: AgentId,
    view: &FlockView,
    params: &Params,
    modes: Modes,
    target: Vec3,
) -> Result<Vec3, IndexError> {
    let boid = &view.boids[id];

    let close = view
        .index
        .query(id, params.nearest_count, params.protected_range)?;
    let visible = visible_neighbors(id, view, params)?;

    let mut acc = separation_from(id, &close, view.boids, params)
        + alignment_from(id, &visible, view.boids, params)
        + cohesion_from(id, &visible, view.boids, params);

    if modes.seeking {
        acc += seek(boid, target, params);
    }
    if modes.obstacles {
        acc += avoid_obstacles(boid, view.field, view.radar, params);
    }
    Ok(acc)
}

fn visible_neighbors(
    id: AgentId,
    view: &FlockView,
    params: &Params,
) -> Result<Vec<AgentId>, IndexError> {
    view.index
        .query(id, params.nearest_count, params.visibility_range)
}

fn separation_from(id: AgentId, neighbors: &[AgentId], boids: &[Boid], params: &Params) -> Vec3 {
    let me = boids[id].pos;
    let push: Vec3 = neighbors.iter().map(|&j| me - boids[j].pos).sum();
    push * params.avoid_factor
}

fn alignment_from(id: AgentId, neighbors: &[AgentId], boids: &[Boid], params: &Params) -> Vec3 {
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }
    let me = boids[id].vel;
    let total: Vec3 = neighbors.iter().map(|&j| boids[j].vel - me).sum();
    total / neighbors.len() as f32 * params.align_factor
}

fn cohesion_from(id: AgentId, neighbors: &[AgentId], boids: &[Boid], params: &Params) -> Vec3 {
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }
    let me = boids[id].pos;
    let total: Vec3 = neighbors.iter().map(|&j| boids[j].pos - me).sum();
    total / neighbors.len() as f32 * params.cohesion_factor
}
