//! Static collision geometry: solid obstacles and the world boundary.
//!
//! Obstacles are vertical capped cylinders standing on the floor of the
//! boundary box. Every ray query takes a unit direction and returns the
//! distance to the nearest surface hit, or `None` when nothing is hit
//! within range. A miss is the common case, not an error.

use glam::Vec3;
use rand::Rng;

use crate::config::WorldConfig;

/// A solid vertical cylinder.
///
/// `center` is the middle of the cylinder's axis, so the cylinder spans
/// `center.y - height / 2 ..= center.y + height / 2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    pub center: Vec3,
    pub radius: f32,
    pub height: f32,
}

impl Obstacle {
    /// ### Parameters
    /// - `center` - Midpoint of the cylinder's vertical axis.
    /// - `radius` - Radius of the round wall.
    /// - `height` - Full height between the two caps.
    pub fn new(center: Vec3, radius: f32, height: f32) -> Self {
        Self {
            center,
            radius,
            height,
        }
    }

    /// Axis-aligned bounding box as `(min, max)` corners.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let half = Vec3::new(self.radius, self.height * 0.5, self.radius);
        (self.center - half, self.center + half)
    }

    /// Bounding-box containment, used when placing boids.
    ///
    /// This is coarser than the cylinder itself: the corners of the box
    /// outside the round wall also count as inside.
    pub fn contains(&self, p: Vec3) -> bool {
        let (min, max) = self.bounds();
        p.cmpge(min).all() && p.cmple(max).all()
    }

    /// Distance along `dir` at which a ray from `origin` enters the cylinder.
    ///
    /// Only the outside surface is hit: a ray starting inside the solid
    /// reports no intersection.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<f32> {
        let rel = origin - self.center;
        let half_height = self.height * 0.5;

        let (mut t_near, mut t_far) = (f32::NEG_INFINITY, f32::INFINITY);

        // Caps.
        if dir.y == 0.0 {
            if rel.y.abs() > half_height {
                return None;
            }
        } else {
            let t0 = (-half_height - rel.y) / dir.y;
            let t1 = (half_height - rel.y) / dir.y;
            t_near = t0.min(t1);
            t_far = t0.max(t1);
        }

        // Round wall, solved in the xz plane.
        let a = dir.x * dir.x + dir.z * dir.z;
        let c = rel.x * rel.x + rel.z * rel.z - self.radius * self.radius;
        if a == 0.0 {
            if c > 0.0 {
                return None;
            }
        } else {
            let half_b = rel.x * dir.x + rel.z * dir.z;
            let disc = half_b * half_b - a * c;
            if disc < 0.0 {
                return None;
            }
            let root = disc.sqrt();
            t_near = t_near.max((-half_b - root) / a);
            t_far = t_far.min((-half_b + root) / a);
        }

        if t_near > t_far || t_near < 0.0 || t_near > max_dist {
            None
        } else {
            Some(t_near)
        }
    }
}

/// The symmetric box `[-half_extent, half_extent]^3` that encloses the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boundary {
    pub half_extent: f32,
}

impl Boundary {
    pub fn new(half_extent: f32) -> Self {
        Self { half_extent }
    }

    /// `true` if `p` lies inside the box or on its surface.
    pub fn contains(&self, p: Vec3) -> bool {
        let h = Vec3::splat(self.half_extent);
        p.cmpge(-h).all() && p.cmple(h).all()
    }

    /// Distance along `dir` at which a ray from `origin` reaches the far
    /// side of the box.
    ///
    /// The box is seen from the inside: a ray starting within it hits the
    /// face it exits through, and a ray from outside that crosses the box
    /// hits the face opposite its entry.
    ///
    /// ### Parameters
    /// - `origin` - Ray start.
    /// - `dir` - Ray direction; unit length gives distances in world units.
    /// - `max_dist` - Hits further than this are ignored.
    ///
    /// ### Returns
    /// `Some(t)` with the far-face distance, or `None` if the ray misses the
    /// box or the far face lies beyond `max_dist`.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<f32> {
        let h = self.half_extent;
        let (mut t_near, mut t_far) = (f32::NEG_INFINITY, f32::INFINITY);

        for axis in 0..3 {
            let (o, d) = (origin[axis], dir[axis]);
            if d == 0.0 {
                if o < -h || o > h {
                    return None;
                }
                continue;
            }
            let t0 = (-h - o) / d;
            let t1 = (h - o) / d;
            t_near = t_near.max(t0.min(t1));
            t_far = t_far.min(t0.max(t1));
        }

        if t_near > t_far || t_far < 0.0 || t_far > max_dist {
            None
        } else {
            Some(t_far)
        }
    }
}

/// Every obstacle plus the boundary, fixed for the lifetime of a run.
#[derive(Clone, Debug)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    boundary: Boundary,
}

impl ObstacleField {
    /// Wraps an explicit obstacle list inside `boundary`.
    pub fn new(boundary: Boundary, obstacles: Vec<Obstacle>) -> Self {
        Self {
            obstacles,
            boundary,
        }
    }

    /// A field with only the boundary box.
    pub fn empty(bound_range: f32) -> Self {
        Self::new(Boundary::new(bound_range), Vec::new())
    }

    /// Scatters `cfg.obstacle_count` pillars across the floor of the box.
    ///
    /// Each pillar has radius `cfg.obstacle_radius`, a random height between
    /// one and two `bound_range`s, and stands on `y = -bound_range` with its
    /// axis kept one radius away from the side walls.
    pub fn generate(cfg: &WorldConfig, rng: &mut impl Rng) -> Self {
        let bound = cfg.bound_range;
        let radius = cfg.obstacle_radius;

        let obstacles = (0..cfg.obstacle_count)
            .map(|_| {
                let height = bound * (1.0 + rng.random::<f32>());
                let x = (2.0 * rng.random::<f32>() - 1.0) * (bound - radius);
                let z = (2.0 * rng.random::<f32>() - 1.0) * (bound - radius);
                Obstacle::new(Vec3::new(x, height * 0.5 - bound, z), radius, height)
            })
            .collect();

        Self::new(Boundary::new(bound), obstacles)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Nearest hit against obstacles only.
    pub fn raycast_obstacles(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<f32> {
        self.obstacles
            .iter()
            .filter_map(|o| o.raycast(origin, dir, max_dist))
            .min_by(f32::total_cmp)
    }

    /// Nearest hit against obstacles and the boundary.
    ///
    /// `dir` is expected to be unit length so that distances are in world units.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<f32> {
        let obstacle_hit = self.raycast_obstacles(origin, dir, max_dist);
        let boundary_hit = self.boundary.raycast(origin, dir, max_dist);
        match (obstacle_hit, boundary_hit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (hit, None) | (None, hit) => hit,
        }
    }

    /// `true` if `p` lies inside any obstacle's bounding box.
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.obstacles.iter().any(|o| o.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{SeedableRng, rngs::StdRng};

    fn pillar() -> Obstacle {
        // Spans x,z in [4, 6] x [-1, 1] and y in [-5, 5].
        Obstacle::new(Vec3::new(5.0, 0.0, 0.0), 1.0, 10.0)
    }

    #[test]
    fn ray_hits_cylinder_wall() {
        let hit = pillar().raycast(Vec3::ZERO, Vec3::X, 100.0).unwrap();
        assert_abs_diff_eq!(hit, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn ray_respects_max_distance_and_misses_to_the_side() {
        assert_eq!(pillar().raycast(Vec3::ZERO, Vec3::X, 3.9), None);
        assert_eq!(pillar().raycast(Vec3::ZERO, Vec3::Z, 100.0), None);
        assert_eq!(pillar().raycast(Vec3::ZERO, -Vec3::X, 100.0), None);
    }

    #[test]
    fn vertical_ray_hits_cap() {
        let origin = Vec3::new(5.0, 8.0, 0.0);
        let hit = pillar().raycast(origin, -Vec3::Y, 100.0).unwrap();
        assert_abs_diff_eq!(hit, 3.0, epsilon = 1e-5);

        // Straight down next to the pillar never touches it.
        let beside = Vec3::new(7.0, 8.0, 0.0);
        assert_eq!(pillar().raycast(beside, -Vec3::Y, 100.0), None);
    }

    #[test]
    fn ray_passing_above_the_top_misses() {
        let origin = Vec3::new(0.0, 6.0, 0.0);
        assert_eq!(pillar().raycast(origin, Vec3::X, 100.0), None);
    }

    #[test]
    fn ray_from_inside_the_solid_reports_nothing() {
        let origin = Vec3::new(5.0, 0.0, 0.0);
        assert_eq!(pillar().raycast(origin, Vec3::X, 100.0), None);
    }

    #[test]
    fn containment_uses_the_bounding_box() {
        let p = pillar();
        assert!(p.contains(Vec3::new(5.0, 0.0, 0.0)));
        // Corner of the box, outside the round wall.
        assert!(p.contains(Vec3::new(5.95, 4.0, 0.95)));
        assert!(!p.contains(Vec3::new(5.0, 5.5, 0.0)));
        assert!(!p.contains(Vec3::new(3.5, 0.0, 0.0)));
    }

    #[test]
    fn boundary_ray_from_inside_hits_exit_face() {
        let b = Boundary::new(10.0);
        let hit = b.raycast(Vec3::new(2.0, 0.0, 0.0), Vec3::X, 100.0).unwrap();
        assert_abs_diff_eq!(hit, 8.0, epsilon = 1e-5);

        assert_eq!(b.raycast(Vec3::new(2.0, 0.0, 0.0), Vec3::X, 7.0), None);
    }

    #[test]
    fn boundary_ray_from_outside() {
        let b = Boundary::new(10.0);
        // Crossing the box: hits the far face.
        let hit = b.raycast(Vec3::new(-15.0, 0.0, 0.0), Vec3::X, 100.0).unwrap();
        assert_abs_diff_eq!(hit, 25.0, epsilon = 1e-5);
        // Pointing away: nothing.
        assert_eq!(b.raycast(Vec3::new(15.0, 0.0, 0.0), Vec3::X, 100.0), None);
        // Parallel to the box but outside its slab: nothing.
        assert_eq!(b.raycast(Vec3::new(0.0, 15.0, 0.0), Vec3::X, 100.0), None);
    }

    #[test]
    fn field_returns_nearest_of_obstacles_and_boundary() {
        let field = ObstacleField::new(Boundary::new(20.0), vec![pillar()]);

        let forward = field.raycast(Vec3::ZERO, Vec3::X, 100.0).unwrap();
        assert_abs_diff_eq!(forward, 4.0, epsilon = 1e-5);

        let backward = field.raycast(Vec3::ZERO, -Vec3::X, 100.0).unwrap();
        assert_abs_diff_eq!(backward, 20.0, epsilon = 1e-5);

        assert_eq!(field.raycast_obstacles(Vec3::ZERO, -Vec3::X, 100.0), None);
        assert_eq!(field.raycast(Vec3::ZERO, -Vec3::X, 10.0), None);
    }

    #[test]
    fn generated_pillars_stand_on_the_floor_inside_the_box() {
        let cfg = WorldConfig {
            obstacle_count: 25,
            ..WorldConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let field = ObstacleField::generate(&cfg, &mut rng);

        assert_eq!(field.obstacles().len(), 25);
        let bound = cfg.bound_range;
        for o in field.obstacles() {
            let (min, max) = o.bounds();
            assert_abs_diff_eq!(min.y, -bound, epsilon = 1e-4);
            assert!(o.height >= bound && o.height <= 2.0 * bound);
            assert!(min.x >= -bound - 1e-4 && max.x <= bound + 1e-4);
            assert!(min.z >= -bound - 1e-4 && max.z <= bound + 1e-4);
            assert!(field.contains_point(o.center));
        }
    }
}
