/// Identifier for a boid in a [`crate::simulation::Simulation`].
///
/// This is an index into the population vector and doubles as the key
/// of the boid's entry in [`crate::spatial::SpatialIndex`]. Ids are stable
/// for the lifetime of a simulation; the population never grows or shrinks.
pub type AgentId = usize;
