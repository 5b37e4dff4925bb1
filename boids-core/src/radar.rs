//! Radar directions and heading frames for obstacle avoidance.
//!
//! Directions are expressed in a boid's local frame, where `+Y` is straight
//! ahead. [`heading`] gives the rotation from that local frame into world
//! space for a given velocity.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Quat, Vec3};

/// A fixed set of unit directions spread over a forward cone.
///
/// The directions follow a golden-angle spiral starting exactly on the
/// local forward axis and widening with each index, so iterating them in
/// order tries the most forward headings first.
#[derive(Clone, Debug)]
pub struct Radar {
    directions: Vec<Vec3>,
}

impl Radar {
    /// Builds `samples` directions inside a cone of half-angle
    /// `spread * π / 2` around local `+Y`.
    ///
    /// A `spread` of `1.0` covers the forward hemisphere; values above one
    /// reach behind the boid.
    pub fn new(samples: usize, spread: f32) -> Self {
        let golden = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let cap = 1.0 - (spread * FRAC_PI_2).cos();
        let last = samples.saturating_sub(1).max(1) as f32;

        let directions = (0..samples)
            .map(|i| {
                let t = i as f32 / last;
                let inclination = (1.0 - t * cap).clamp(-1.0, 1.0).acos();
                let azimuth = TAU * golden * i as f32;
                Vec3::new(
                    inclination.sin() * azimuth.cos(),
                    inclination.cos(),
                    inclination.sin() * azimuth.sin(),
                )
            })
            .collect();

        Self { directions }
    }

    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }
}

/// Orientation vector reported to renderers for a boid moving at `vel`.
///
/// This is the velocity direction tilted toward `+Y` by adding the speed
/// to the vertical component, then normalized. A half-turn about this
/// axis carries local `+Y` onto the direction of travel.
///
/// A resting boid reports `+Y`; a boid moving straight down reports `+X`.
pub fn orientation(vel: Vec3) -> Vec3 {
    let speed = vel.length();
    if !(speed > f32::EPSILON) {
        return Vec3::Y;
    }
    (vel + Vec3::Y * speed).try_normalize().unwrap_or(Vec3::X)
}

/// Rotation from a boid's local frame into world space.
pub fn heading(vel: Vec3) -> Quat {
    Quat::from_axis_angle(orientation(vel), PI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn first_direction_is_straight_ahead() {
        let radar = Radar::new(100, 1.5);
        assert_eq!(radar.len(), 100);
        assert_abs_diff_eq!(radar.directions()[0].y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn directions_are_unit_and_inside_the_cone() {
        let spread = 1.5;
        let radar = Radar::new(64, spread);
        let min_cos = (spread * FRAC_PI_2).cos();

        for d in radar.directions() {
            assert_abs_diff_eq!(d.length(), 1.0, epsilon = 1e-5);
            assert!(d.y >= min_cos - 1e-5, "{d:?} outside cone");
        }

        // The last sample sits on the rim of the cone.
        let last = radar.directions()[63];
        assert_abs_diff_eq!(last.y, min_cos, epsilon = 1e-5);
    }

    #[test]
    fn later_directions_are_never_more_forward() {
        let radar = Radar::new(50, 1.0);
        for pair in radar.directions().windows(2) {
            assert!(pair[1].y <= pair[0].y + 1e-6);
        }
    }

    #[test]
    fn tiny_radars_do_not_divide_by_zero() {
        assert!(Radar::new(0, 1.5).is_empty());
        let single = Radar::new(1, 1.5);
        assert_eq!(single.len(), 1);
        assert_abs_diff_eq!(single.directions()[0].y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn heading_carries_forward_onto_velocity() {
        let velocities = [
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, -5.0, 0.0),
            Vec3::new(-1.0, 2.0, 3.0),
            Vec3::new(0.2, -4.0, -0.1),
        ];
        for v in velocities {
            let forward = heading(v) * Vec3::Y;
            let expected = v.normalize();
            assert_abs_diff_eq!(forward.x, expected.x, epsilon = 1e-5);
            assert_abs_diff_eq!(forward.y, expected.y, epsilon = 1e-5);
            assert_abs_diff_eq!(forward.z, expected.z, epsilon = 1e-5);
        }
    }

    #[test]
    fn orientation_tilts_velocity_up() {
        let o = orientation(Vec3::new(2.0, 0.0, 0.0));
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert_abs_diff_eq!(o.x, expected.x, epsilon = 1e-6);
        assert_abs_diff_eq!(o.y, expected.y, epsilon = 1e-6);

        assert_eq!(orientation(Vec3::ZERO), Vec3::Y);
        assert_eq!(orientation(Vec3::new(0.0, -3.0, 0.0)), Vec3::X);
    }
}
