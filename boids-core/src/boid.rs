use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use tracing::debug;

use crate::{obstacle::ObstacleField, radar};

/// A single flocking agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boid {
    pub pos: Vec3,
    pub vel: Vec3,
}

/// What a renderer needs to place one boid.
///
/// `orientation` is the axis produced by [`radar::orientation`]; a half-turn
/// about it aligns a model pointing along `+Y` with the direction of travel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoidTransform {
    pub position: Vec3,
    pub orientation: Vec3,
}

impl Boid {
    pub fn new(pos: Vec3, vel: Vec3) -> Self {
        Self { pos, vel }
    }

    pub fn transform(&self) -> BoidTransform {
        BoidTransform {
            position: self.pos,
            orientation: radar::orientation(self.vel),
        }
    }
}

/// Uniformly distributed unit vector.
pub fn random_direction(rng: &mut impl Rng) -> Vec3 {
    let u = (rng.random::<f32>() - 0.5) * 2.0;
    let t = rng.random::<f32>() * TAU;
    let f = (1.0 - u * u).max(0.0).sqrt();
    Vec3::new(f * t.cos(), u, f * t.sin())
}

/// Picks a point in the boundary box that lies outside every obstacle.
///
/// At most `attempts` points are drawn (always at least one). When every
/// draw lands inside an obstacle the last one is returned anyway, so dense
/// obstacle layouts may produce overlapping placements instead of stalling.
pub fn spawn_position(field: &ObstacleField, attempts: usize, rng: &mut impl Rng) -> Vec3 {
    let bound = field.boundary().half_extent;
    let mut draw = || {
        Vec3::new(
            rng.random::<f32>() - 0.5,
            rng.random::<f32>() - 0.5,
            rng.random::<f32>() - 0.5,
        ) * (2.0 * bound)
    };

    let mut pos = draw();
    for _ in 1..attempts {
        if !field.contains_point(pos) {
            return pos;
        }
        pos = draw();
    }
    if field.contains_point(pos) {
        debug!(?pos, attempts, "respawn attempts exhausted, accepting overlap");
    }
    pos
}

/// Random heading with a speed of up to half of `velocity_limit`.
pub fn spawn_velocity(velocity_limit: f32, rng: &mut impl Rng) -> Vec3 {
    let speed = rng.random::<f32>() * velocity_limit.max(0.0) * 0.5;
    random_direction(rng) * speed
}

/// Creates `count` boids scattered through `field`.
pub fn spawn_population(
    count: usize,
    field: &ObstacleField,
    velocity_limit: f32,
    attempts: usize,
    rng: &mut impl Rng,
) -> Vec<Boid> {
    (0..count)
        .map(|_| {
            let pos = spawn_position(field, attempts, rng);
            let vel = spawn_velocity(velocity_limit, rng);
            Boid::new(pos, vel)
        })
        .collect()
}
