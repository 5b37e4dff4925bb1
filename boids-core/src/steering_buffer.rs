use crate::types::AgentId;
use glam::Vec3;

/// Per-boid acceleration storage for a double-buffered tick.
///
/// During the steering pass every boid's summed acceleration is written
/// here while the flock is still in its start-of-tick state; the
/// integration pass then reads it back. Keeping the two passes apart is
/// what makes the outcome independent of the order boids are processed in.
///
/// `accel[i]` belongs to boid `i`.
#[derive(Debug, Default)]
pub struct SteeringBuffer {
    accel: Vec<Vec3>,
}

impl SteeringBuffer {
    /// Creates a buffer for `len` boids with every slot zero.
    pub fn with_len(len: usize) -> Self {
        Self {
            accel: vec![Vec3::ZERO; len],
        }
    }

    pub fn len(&self) -> usize {
        self.accel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accel.is_empty()
    }

    /// Resizes the buffer to exactly `len` slots and zeroes every slot,
    /// even if the length was already correct.
    ///
    /// ### Parameters
    /// - `len` - Number of boids in the flock this tick.
    pub fn ensure_len(&mut self, len: usize) {
        if self.accel.len() != len {
            self.accel.resize(len, Vec3::ZERO);
        }
        self.clear();
    }

    /// Zeroes every slot while keeping the length.
    pub fn clear(&mut self) {
        self.accel.fill(Vec3::ZERO);
    }

    /// Stores the acceleration for `id`, replacing any earlier value.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    pub fn set(&mut self, id: AgentId, accel: Vec3) {
        self.accel[id] = accel;
    }

    /// Acceleration stored for `id`, or `Vec3::ZERO` if nothing was set
    /// since the last clear.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    pub fn get(&self, id: AgentId) -> Vec3 {
        self.accel[id]
    }

    /// Accelerations in id order.
    pub fn as_slice(&self) -> &[Vec3] {
        &self.accel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_len_starts_zeroed() {
        let buf = SteeringBuffer::with_len(4);
        assert_eq!(buf.len(), 4);
        assert!(buf.as_slice().iter().all(|&a| a == Vec3::ZERO));
    }

    #[test]
    fn set_overwrites_slot() {
        let mut buf = SteeringBuffer::with_len(3);
        buf.set(1, Vec3::new(1.0, 2.0, 3.0));
        buf.set(1, Vec3::new(0.0, -1.0, 0.0));

        assert_eq!(buf.get(1), Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(buf.get(0), Vec3::ZERO);
    }

    #[test]
    fn ensure_len_clears_when_same_and_resizes_when_different() {
        let mut buf = SteeringBuffer::with_len(2);
        buf.set(0, Vec3::X);

        buf.ensure_len(2);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.get(0), Vec3::ZERO);

        buf.set(1, Vec3::Y);
        buf.ensure_len(5);
        assert_eq!(buf.len(), 5);
        assert!(buf.as_slice().iter().all(|&a| a == Vec3::ZERO));

        buf.ensure_len(0);
        assert!(buf.is_empty());
    }

    #[test]
    #[should_panic]
    fn set_out_of_bounds_panics() {
        let mut buf = SteeringBuffer::with_len(1);
        buf.set(1, Vec3::X);
    }
}
