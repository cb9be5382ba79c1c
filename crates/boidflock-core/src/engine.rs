//! Simulation engine - main entry point for running the simulation

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agent::SpawnPoint;
use crate::components::FlockId;
use crate::config::{validate_engine_config, AgentParams, ConfigError, EngineConfig, FlockConfig};
use crate::flock::{Flock, WorldView};
use crate::persistence::SaveError;
use crate::systems::{AgentSnapshot, EulerIntegrator, Obstacle, SpatialGrid};

const DEFAULT_CELL_SIZE: f32 = 1.0;

/// Totals for one fixed step across every flock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub tick: u64,
    pub recalculated: usize,
    pub moved_only: usize,
    pub resets: usize,
    pub steering_failures: usize,
    pub collisions: usize,
}

/// Main simulation engine
pub struct SimulationEngine {
    config: EngineConfig,
    flocks: Vec<Flock>,
    integrator: EulerIntegrator,

    // Rebuilt every tick
    grid: SpatialGrid,
    snapshots: Vec<AgentSnapshot>,

    /// Simulation time in seconds since start
    sim_time: f64,
    tick_count: u64,
    /// Scaled frame time not yet consumed by fixed steps
    accumulator: f64,
    time_scale: f32,
}

impl SimulationEngine {
    /// Create an empty simulation
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        if let Some(err) = validate_engine_config(&config).into_iter().next() {
            return Err(err);
        }
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: EngineConfig) -> Self {
        Self {
            time_scale: config.time_scale,
            config,
            flocks: Vec::new(),
            integrator: EulerIntegrator::default(),
            grid: SpatialGrid::new(DEFAULT_CELL_SIZE),
            snapshots: Vec::new(),
            sim_time: 0.0,
            tick_count: 0,
            accumulator: 0.0,
        }
    }

    /// Spawn a flock at `spawn`; its agents are reset at the current time.
    pub fn add_flock(
        &mut self,
        config: FlockConfig,
        params: AgentParams,
        spawn: SpawnPoint,
    ) -> Result<FlockId, ConfigError> {
        let id = FlockId(self.flocks.len() as u32);
        let mut rng = self.stream_rng(u64::from(id.0) | 1 << 32);
        let flock = Flock::new(id, config, params, spawn, self.sim_time, &mut rng)?;
        self.flocks.push(flock);
        Ok(id)
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.integrator.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.integrator.obstacles
    }

    /// Run one fixed step.
    pub fn tick(&mut self) -> TickSummary {
        let dt = self.config.fixed_time_step;
        let mut rng = self.stream_rng(self.tick_count);
        let mut summary = TickSummary {
            tick: self.tick_count,
            ..Default::default()
        };

        // Respawn first so every neighbor read sees the respawned state
        for flock in &mut self.flocks {
            summary.resets += flock.reset_expired(self.sim_time, &mut rng);
        }

        // Publish
        self.snapshots.clear();
        for flock in &self.flocks {
            flock.write_snapshots(&mut self.snapshots);
        }
        self.grid.set_cell_size(self.search_radius());
        self.grid.rebuild_from_snapshots(&self.snapshots);

        // Steer
        let world = WorldView {
            now: self.sim_time,
            dt,
            neighbors: &self.grid,
            snapshots: &self.snapshots,
        };
        for flock in &mut self.flocks {
            let report = flock.on_tick(&world, &mut rng);
            summary.recalculated += report.recalculated.len();
            summary.moved_only += report.moved_only;
            summary.resets += report.resets;
            summary.steering_failures += report.steering_failures;
        }

        // Integrate
        for flock in &mut self.flocks {
            summary.collisions += flock.integrate(&self.integrator, dt);
        }

        self.sim_time += f64::from(dt);
        self.tick_count += 1;
        summary
    }

    /// Advance by a frame delta, running as many fixed steps as fit.
    /// Returns the number of steps run.
    pub fn update(&mut self, delta_seconds: f32) -> u32 {
        let step = f64::from(self.config.fixed_time_step);
        self.accumulator += f64::from(delta_seconds.max(0.0) * self.time_scale);

        let mut steps = 0;
        while self.accumulator >= step && steps < self.config.max_steps_per_update {
            self.tick();
            self.accumulator -= step;
            steps += 1;
        }

        if self.accumulator >= step {
            let dropped = (self.accumulator / step).floor();
            log::warn!(
                "falling behind: dropped {} fixed steps after running {}",
                dropped,
                steps
            );
            self.accumulator %= step;
        }

        steps
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }

    /// Get current time scale
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Get current simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn flock(&self, id: FlockId) -> Option<&Flock> {
        self.flocks.get(id.0 as usize)
    }

    pub fn flock_mut(&mut self, id: FlockId) -> Option<&mut Flock> {
        self.flocks.get_mut(id.0 as usize)
    }

    pub fn flocks(&self) -> &[Flock] {
        &self.flocks
    }

    /// Count agents across all flocks
    pub fn agent_count(&self) -> usize {
        self.flocks.iter().map(Flock::len).sum()
    }

    /// Count agents currently stuck to an obstacle
    pub fn stuck_count(&self) -> usize {
        self.flocks.iter().map(Flock::stuck_count).sum()
    }

    /// Save simulation state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        crate::persistence::save_simulation(
            writer,
            &self.config,
            self.sim_time,
            self.tick_count,
            self.time_scale,
            self.accumulator,
            &self.flocks,
            &self.integrator.obstacles,
        )
    }

    /// Load simulation state from a reader
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = crate::persistence::load_simulation(reader)?;

        self.config = loaded.config;
        self.sim_time = loaded.sim_time;
        self.tick_count = loaded.tick_count;
        self.time_scale = loaded.time_scale;
        self.accumulator = loaded.accumulator;
        self.flocks = loaded.flocks;
        self.integrator = EulerIntegrator::new(loaded.obstacles);

        self.snapshots.clear();
        self.grid.rebuild_from_snapshots(&[]);

        Ok(())
    }

    /// Largest neighbor radius in use, which sizes the grid cells.
    fn search_radius(&self) -> f32 {
        let radius = self
            .flocks
            .iter()
            .flat_map(|f| f.agents())
            .map(|a| a.params().neighbor_search_radius)
            .fold(0.0f32, f32::max);
        if radius > 0.0 {
            radius
        } else {
            DEFAULT_CELL_SIZE
        }
    }

    /// RNG for one stream, derived from the seed so a reloaded engine
    /// continues exactly as the saved one would have.
    fn stream_rng(&self, stream: u64) -> StdRng {
        StdRng::seed_from_u64(self.config.seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::with_valid_config(EngineConfig::default())
    }
}
