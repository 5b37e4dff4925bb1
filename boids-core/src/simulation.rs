//! The simulation loop.
//!
//! [`Simulation`] owns the flock, its spatial index, the obstacle field and
//! all host-controlled state (run/pause, optional rules, target, parameters).
//! The host drives it by calling [`Simulation::tick`] once per frame and
//! reads [`Simulation::transforms`] afterwards. Every setter takes effect on
//! the next tick.

use std::path::Path;

use glam::Vec3;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, trace, warn};

use crate::{
    boid::{self, Boid, BoidTransform},
    config::{Params, UpdateMode, WorldConfig},
    error::SimError,
    obstacle::ObstacleField,
    phases::{self, TickEnv},
    radar::Radar,
    spatial::SpatialIndex,
    steering::Modes,
    steering_buffer::SteeringBuffer,
};

/// Whether [`Simulation::tick`] advances the flock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Paused,
    Running,
}

#[derive(Debug)]
pub struct Simulation {
    cfg: WorldConfig,
    params: Params,
    boids: Vec<Boid>,
    index: SpatialIndex,
    field: ObstacleField,
    radar: Radar,
    buffer: SteeringBuffer,
    state: RunState,
    modes: Modes,
    target: Vec3,
    rng: StdRng,
    ticks: u64,
}

impl Simulation {
    /// Builds a world from `cfg`: random obstacles, then a random flock.
    ///
    /// ### Parameters
    /// - `cfg` - World setup (population, box size, obstacles, seed, modes).
    /// - `params` - Initial live parameters.
    ///
    /// ### Returns
    /// A simulation that is running or paused according to
    /// `cfg.start_running`, with the target at the origin.
    pub fn new(cfg: WorldConfig, params: Params) -> Self {
        let mut rng = seeded_rng(&cfg);
        let field = ObstacleField::generate(&cfg, &mut rng);
        Self::assemble(cfg, params, field, rng, None)
    }

    /// Loads a JSON [`WorldConfig`] from `path` and builds a world from it.
    ///
    /// ### Errors
    /// [`SimError::Config`] if the file cannot be read or parsed.
    pub fn from_config_file(path: impl AsRef<Path>, params: Params) -> Result<Self, SimError> {
        let cfg = WorldConfig::load(path)?;
        Ok(Self::new(cfg, params))
    }

    /// Builds a world around a given obstacle field with a random flock.
    ///
    /// The field's own boundary is used for physics and spawning.
    pub fn with_field(cfg: WorldConfig, params: Params, field: ObstacleField) -> Self {
        let rng = seeded_rng(&cfg);
        Self::assemble(cfg, params, field, rng, None)
    }

    /// Builds a world with a given flock, e.g. for a scripted scenario.
    ///
    /// `cfg.boid_count` is overwritten with `boids.len()`.
    pub fn with_boids(
        cfg: WorldConfig,
        params: Params,
        field: ObstacleField,
        boids: Vec<Boid>,
    ) -> Self {
        let rng = seeded_rng(&cfg);
        Self::assemble(cfg, params, field, rng, Some(boids))
    }

    fn assemble(
        mut cfg: WorldConfig,
        params: Params,
        field: ObstacleField,
        mut rng: StdRng,
        boids: Option<Vec<Boid>>,
    ) -> Self {
        let boids = boids.unwrap_or_else(|| {
            boid::spawn_population(
                cfg.boid_count,
                &field,
                params.velocity_limit,
                cfg.respawn_attempts,
                &mut rng,
            )
        });
        cfg.boid_count = boids.len();

        let index = SpatialIndex::new(&positions(&boids));
        let radar = Radar::new(cfg.radar_samples, cfg.radar_spread);
        let state = if cfg.start_running {
            RunState::Running
        } else {
            RunState::Paused
        };
        let modes = Modes {
            seeking: cfg.seeking,
            obstacles: cfg.obstacles_enabled,
        };

        info!(
            boids = boids.len(),
            obstacles = field.obstacles().len(),
            bound = field.boundary().half_extent,
            mode = ?cfg.update_mode,
            "simulation created"
        );

        Self {
            buffer: SteeringBuffer::with_len(boids.len()),
            cfg,
            params,
            boids,
            index,
            field,
            radar,
            state,
            modes,
            target: Vec3::ZERO,
            rng,
            ticks: 0,
        }
    }

    /// Advances every boid by `dt` seconds.
    ///
    /// Does nothing while paused. A `dt` of zero is a no-op by definition;
    /// negative or non-finite values are ignored with a warning.
    ///
    /// ### Errors
    /// [`SimError::Index`] if the spatial index has lost track of a boid,
    /// which means an internal invariant is broken.
    pub fn tick(&mut self, dt: f32) -> Result<(), SimError> {
        if self.state == RunState::Paused || dt == 0.0 {
            return Ok(());
        }
        if !(dt > 0.0 && dt.is_finite()) {
            warn!(dt, "ignoring tick with invalid elapsed time");
            return Ok(());
        }

        let env = TickEnv {
            field: &self.field,
            radar: &self.radar,
            params: &self.params,
            modes: self.modes,
            target: self.target,
            dt,
        };
        match self.cfg.update_mode {
            UpdateMode::Sequential => {
                phases::sequential_pass(&mut self.boids, &mut self.index, &env)?
            }
            UpdateMode::DoubleBuffered => phases::double_buffered_pass(
                &mut self.boids,
                &mut self.index,
                &env,
                &mut self.buffer,
            )?,
        }

        self.ticks += 1;
        trace!(tick = self.ticks, dt, "tick complete");
        Ok(())
    }

    /// Respawns every boid and rebuilds the spatial index.
    ///
    /// Obstacles stay where they are. Valid whether running or paused.
    pub fn reset(&mut self) {
        self.boids = boid::spawn_population(
            self.boids.len(),
            &self.field,
            self.params.velocity_limit,
            self.cfg.respawn_attempts,
            &mut self.rng,
        );
        self.index.rebuild(&positions(&self.boids));
        self.ticks = 0;
        info!(boids = self.boids.len(), "simulation reset");
    }

    /// Switches between running and paused.
    pub fn toggle_run(&mut self) {
        self.state = match self.state {
            RunState::Paused => RunState::Running,
            RunState::Running => RunState::Paused,
        };
        debug!(state = ?self.state, "run state toggled");
    }

    /// Switches goal seeking on or off; takes effect on the next tick.
    pub fn toggle_seeking(&mut self) {
        self.modes.seeking = !self.modes.seeking;
        debug!(seeking = self.modes.seeking, "goal seeking toggled");
    }

    /// Switches obstacle avoidance on or off.
    ///
    /// Collision prevention against obstacles stays active either way.
    pub fn toggle_obstacles(&mut self) {
        self.modes.obstacles = !self.modes.obstacles;
        debug!(obstacles = self.modes.obstacles, "obstacle avoidance toggled");
    }

    /// Sets the goal-seeking target. Only the latest value is kept.
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn modes(&self) -> Modes {
        self.modes
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Live parameters; changes apply from the next tick, unvalidated.
    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub fn config(&self) -> &WorldConfig {
        &self.cfg
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    /// Position and orientation of every boid, in id order.
    pub fn transforms(&self) -> impl Iterator<Item = BoidTransform> + '_ {
        self.boids.iter().map(Boid::transform)
    }

    pub fn field(&self) -> &ObstacleField {
        &self.field
    }

    pub fn radar(&self) -> &Radar {
        &self.radar
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Ticks completed since creation or the last reset.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}

fn seeded_rng(cfg: &WorldConfig) -> StdRng {
    match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn positions(boids: &[Boid]) -> Vec<Vec3> {
    boids.iter().map(|b| b.pos).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn seeded(seed: u64) -> WorldConfig {
        WorldConfig {
            boid_count: 40,
            seed: Some(seed),
            ..WorldConfig::default()
        }
    }

    #[test]
    fn config_file_errors_surface_as_sim_errors() {
        let err = Simulation::from_config_file("/definitely/not/here/boids.json", Params::default())
            .unwrap_err();
        assert!(matches!(err, SimError::Config(ConfigError::Io(_))));

        let path = std::env::temp_dir().join(format!("boids-sim-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "boid_count": 9, "seed": 3, "obstacle_count": 0 }"#).unwrap();
        let sim = Simulation::from_config_file(&path, Params::default());
        std::fs::remove_file(&path).unwrap();

        let sim = sim.unwrap();
        assert_eq!(sim.boids().len(), 9);
        assert!(sim.field().obstacles().is_empty());
    }

    #[test]
    fn same_seed_gives_same_world() {
        let a = Simulation::new(seeded(4), Params::default());
        let b = Simulation::new(seeded(4), Params::default());

        assert_eq!(a.boids(), b.boids());
        assert_eq!(a.field().obstacles(), b.field().obstacles());
        assert_eq!(a.boids().len(), 40);
        assert_eq!(a.state(), RunState::Paused);
    }

    #[test]
    fn start_running_and_modes_come_from_config() {
        let cfg = WorldConfig {
            start_running: true,
            seeking: true,
            obstacles_enabled: false,
            ..seeded(1)
        };
        let sim = Simulation::new(cfg, Params::default());

        assert!(sim.is_running());
        assert!(sim.modes().seeking);
        assert!(!sim.modes().obstacles);
    }

    #[test]
    fn paused_tick_changes_nothing() {
        let mut sim = Simulation::new(seeded(2), Params::default());
        let before = sim.boids().to_vec();

        sim.tick(0.016).unwrap();

        assert_eq!(sim.boids(), &before[..]);
        assert_eq!(sim.tick_count(), 0);
    }

    #[test]
    fn zero_and_invalid_dt_are_no_ops() {
        let mut sim = Simulation::new(seeded(3), Params::default());
        sim.toggle_run();
        let before = sim.boids().to_vec();

        sim.tick(0.0).unwrap();
        sim.tick(-1.0).unwrap();
        sim.tick(f32::NAN).unwrap();
        sim.tick(f32::INFINITY).unwrap();

        assert_eq!(sim.boids(), &before[..]);
        assert_eq!(sim.tick_count(), 0);
    }

    #[test]
    fn running_tick_moves_boids_and_keeps_index_current() {
        let mut sim = Simulation::new(seeded(5), Params::default());
        sim.toggle_run();
        let before = sim.boids().to_vec();

        sim.tick(0.016).unwrap();

        assert_eq!(sim.tick_count(), 1);
        assert_ne!(sim.boids(), &before[..]);
        for (id, b) in sim.boids().iter().enumerate() {
            assert_eq!(sim.index().position(id), Some(b.pos));
        }
    }

    #[test]
    fn toggles_flip_state() {
        let mut sim = Simulation::new(seeded(6), Params::default());

        sim.toggle_run();
        assert_eq!(sim.state(), RunState::Running);
        sim.toggle_run();
        assert_eq!(sim.state(), RunState::Paused);

        let modes = sim.modes();
        sim.toggle_seeking();
        sim.toggle_obstacles();
        assert_eq!(sim.modes().seeking, !modes.seeking);
        assert_eq!(sim.modes().obstacles, !modes.obstacles);
    }

    #[test]
    fn reset_respawns_without_moving_obstacles() {
        let mut sim = Simulation::new(seeded(7), Params::default());
        sim.toggle_run();
        sim.tick(0.05).unwrap();
        let obstacles = sim.field().obstacles().to_vec();
        let before = sim.boids().to_vec();

        sim.reset();

        assert_eq!(sim.boids().len(), before.len());
        assert_ne!(sim.boids(), &before[..]);
        assert_eq!(sim.field().obstacles(), &obstacles[..]);
        assert_eq!(sim.tick_count(), 0);
        assert!(sim.is_running());
        for (id, b) in sim.boids().iter().enumerate() {
            assert_eq!(sim.index().position(id), Some(b.pos));
            assert!(b.vel.length() <= sim.params().velocity_limit * 0.5 + 1e-4);
        }
    }

    #[test]
    fn target_and_params_are_last_value_wins() {
        let mut sim = Simulation::new(seeded(8), Params::default());

        sim.set_target(Vec3::X);
        sim.set_target(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(sim.target(), Vec3::new(1.0, 2.0, 3.0));

        sim.params_mut().avoid_factor = 1.5;
        assert_eq!(sim.params().avoid_factor, 1.5);

        sim.set_params(Params::default());
        assert_eq!(sim.params(), &Params::default());
    }

    #[test]
    fn with_boids_keeps_the_given_flock() {
        let boids = vec![
            Boid::new(Vec3::ZERO, Vec3::X),
            Boid::new(Vec3::new(1.0, 0.0, 0.0), Vec3::Y),
        ];
        let sim = Simulation::with_boids(
            seeded(9),
            Params::default(),
            ObstacleField::empty(20.0),
            boids.clone(),
        );

        assert_eq!(sim.boids(), &boids[..]);
        assert_eq!(sim.config().boid_count, 2);
        assert_eq!(sim.index().query(0, 5, 2.0).unwrap(), vec![1]);

        let transforms: Vec<BoidTransform> = sim.transforms().collect();
        assert_eq!(transforms.len(), 2);
        assert_eq!(transforms[1].position, boids[1].pos);
        assert_eq!(transforms[1].orientation, Vec3::Y);
    }
}
