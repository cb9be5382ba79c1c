//! Flock - a fixed set of agents sharing a target and a spawn anchor.
//!
//! Each fixed step the flock gives `per_update` agents a full steering
//! recalculation (starting at a rotating cursor) and moves the rest with
//! the direction they already have. See [`crate::systems::schedule_window`].

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, SpawnPoint, SteeringOutcome, TickContext};
use crate::components::{AgentId, Body, FlockId, Vec3};
use crate::config::{
    validate_agent_params, validate_flock_config, AgentParams, ConfigError, FlockConfig,
};
use crate::systems::{schedule_window, AgentSnapshot, Integrator, NeighborQuery};

/// Shared, read-only world state for one tick.
pub struct WorldView<'a> {
    pub now: f64,
    pub dt: f32,
    pub neighbors: &'a dyn NeighborQuery,
    pub snapshots: &'a [AgentSnapshot],
}

/// What a flock did during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Agent indices given a full recalculation, in service order.
    pub recalculated: Vec<usize>,
    pub moved_only: usize,
    pub steering_failures: usize,
    pub resets: usize,
}

/// A group of agents with a shared target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flock {
    id: FlockId,
    config: FlockConfig,
    target: Vec3,
    anchor: Body,
    agents: Vec<Agent>,
    cursor: usize,
    ticks: u64,
}

impl Flock {
    /// Create `config.agent_count` agents from `template`, each reset once
    /// at `spawn`. Fatal configuration errors are returned; a non-coprime
    /// schedule is only logged.
    pub fn new<R: Rng + ?Sized>(
        id: FlockId,
        config: FlockConfig,
        template: AgentParams,
        spawn: SpawnPoint,
        now: f64,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        let errors = validate_flock_config(&config)
            .into_iter()
            .chain(validate_agent_params(&template));

        for err in errors {
            if err.is_fatal() {
                return Err(err);
            }
            log::warn!("flock {}: {}", id.0, err);
        }

        let agents = (0..config.agent_count)
            .map(|i| {
                let mut agent = Agent::new(AgentId::new(id, i as u32), template.clone());
                agent.reset(now, spawn, rng);
                agent
            })
            .collect();

        log::info!(
            "flock {}: spawned {} agents, {} recalculated per tick",
            id.0,
            config.agent_count,
            config.per_update
        );

        Ok(Self {
            id,
            config,
            target: Vec3::ZERO,
            anchor: Body::new(spawn.position, spawn.velocity),
            agents,
            cursor: 0,
            ticks: 0,
        })
    }

    pub fn id(&self) -> FlockId {
        self.id
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Spawn point and seed velocity for reset agents.
    pub fn anchor(&self) -> &Body {
        &self.anchor
    }

    pub fn set_anchor_position(&mut self, position: Vec3) {
        self.anchor.position = position;
    }

    pub fn set_anchor_velocity(&mut self, velocity: Vec3) {
        self.anchor.velocity = velocity;
    }

    pub fn spawn_point(&self) -> SpawnPoint {
        SpawnPoint {
            position: self.anchor.position,
            velocity: self.anchor.velocity,
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, index: usize) -> Option<&Agent> {
        self.agents.get(index)
    }

    pub fn agent_mut(&mut self, index: usize) -> Option<&mut Agent> {
        self.agents.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Index of the first agent recalculated next tick.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn stuck_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_stuck()).count()
    }

    /// Public view of every agent, in index order.
    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(Agent::snapshot).collect()
    }

    /// Append the public view of every agent to `out`.
    pub fn write_snapshots(&self, out: &mut Vec<AgentSnapshot>) {
        out.extend(self.agents.iter().map(Agent::snapshot));
    }

    /// Respawn every agent whose lifecycle has run out. Call before
    /// publishing snapshots so neighbors see the respawned state.
    pub fn reset_expired<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) -> usize {
        let spawn = self.spawn_point();
        let mut resets = 0;
        for agent in &mut self.agents {
            if agent.lifecycle_expired(now) {
                agent.reset(now, spawn, rng);
                resets += 1;
            }
        }
        resets
    }

    /// Run one fixed step: recalculate + move the scheduled window, then
    /// move the remainder. Agents still expired at this point (no prior
    /// [`Flock::reset_expired`]) are reset as they are serviced.
    pub fn on_tick<R: Rng + ?Sized>(&mut self, world: &WorldView<'_>, rng: &mut R) -> TickReport {
        let ctx = TickContext {
            now: world.now,
            dt: world.dt,
            target: self.target,
            spawn: self.spawn_point(),
            neighbors: world.neighbors,
            snapshots: world.snapshots,
        };

        let window = schedule_window(self.cursor, self.config.per_update, self.agents.len());
        let mut report = TickReport {
            moved_only: window.move_only.len(),
            ..Default::default()
        };

        let passes = window
            .recalculate
            .iter()
            .map(|&i| (i, true))
            .chain(window.move_only.iter().map(|&i| (i, false)));

        for (i, recalculate) in passes {
            let update = self.agents[i].update(recalculate, &ctx, rng);
            if update.reset {
                report.resets += 1;
            }
            if update.steering == Some(SteeringOutcome::HeldForward) {
                report.steering_failures += 1;
            }
        }

        report.recalculated = window.recalculate;
        self.cursor = window.next_cursor;
        self.ticks += 1;
        report
    }

    /// Integrate the anchor and every agent body, delivering first contacts
    /// to the agents. Returns the number of new collisions.
    pub fn integrate<I: Integrator + ?Sized>(&mut self, integrator: &I, dt: f32) -> usize {
        // Kinematic anchor: obstacles never stop it
        let acceleration = self.anchor.take_pending_acceleration();
        self.anchor.velocity += acceleration * dt;
        self.anchor.position += self.anchor.velocity * dt;

        let mut collisions = 0;
        for agent in &mut self.agents {
            if let Some(normal) = integrator.integrate(agent.body_mut(), dt) {
                if agent.on_collision(normal) {
                    collisions += 1;
                }
            }
        }
        collisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::{EulerIntegrator, LinearScan, Obstacle};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn flock(agent_count: usize, per_update: usize) -> Flock {
        let mut rng = StdRng::seed_from_u64(3);
        Flock::new(
            FlockId(0),
            FlockConfig {
                agent_count,
                per_update,
            },
            AgentParams::default(),
            SpawnPoint {
                position: Vec3::ZERO,
                velocity: Vec3::X,
            },
            0.0,
            &mut rng,
        )
        .unwrap()
    }

    fn tick(flock: &mut Flock, now: f64, rng: &mut StdRng) -> TickReport {
        let snapshots = flock.snapshots();
        let scan = LinearScan {
            snapshots: &snapshots,
        };
        let world = WorldView {
            now,
            dt: 0.02,
            neighbors: &scan,
            snapshots: &snapshots,
        };
        flock.on_tick(&world, rng)
    }

    #[test]
    fn creation_resets_every_agent_at_anchor() {
        let flock = flock(5, 2);
        assert_eq!(flock.len(), 5);
        for (i, agent) in flock.agents().iter().enumerate() {
            assert_eq!(agent.id(), AgentId::new(FlockId(0), i as u32));
            assert_eq!(agent.position(), Vec3::ZERO);
            assert_eq!(agent.last_reset_time(), Some(0.0));
        }
    }

    #[test]
    fn fatal_config_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = Flock::new(
            FlockId(1),
            FlockConfig {
                agent_count: 0,
                per_update: 0,
            },
            AgentParams::default(),
            SpawnPoint::default(),
            0.0,
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::EmptyFlock);

        let bad_params = AgentParams {
            life_cycle_duration: -1.0,
            ..Default::default()
        };
        let err = Flock::new(
            FlockId(1),
            FlockConfig::default(),
            bad_params,
            SpawnPoint::default(),
            0.0,
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveLifeCycle(-1.0));
    }

    #[test]
    fn non_coprime_flock_is_allowed() {
        let flock = flock(50, 10);
        assert_eq!(flock.len(), 50);
    }

    #[test]
    fn tick_services_every_agent_once() {
        let mut flock = flock(7, 3);
        let mut rng = StdRng::seed_from_u64(9);
        let report = tick(&mut flock, 0.02, &mut rng);

        assert_eq!(report.recalculated, vec![0, 1, 2]);
        assert_eq!(report.moved_only, 4);
        assert_eq!(flock.cursor(), 3);
        for agent in flock.agents() {
            assert_eq!(agent.stats().moves, 1);
        }
        let recalculated: u64 = flock.agents().iter().map(|a| a.stats().recalculations).sum();
        assert_eq!(recalculated, 3);
    }

    #[test]
    fn coprime_schedule_covers_evenly() {
        let mut flock = flock(50, 11);
        let mut rng = StdRng::seed_from_u64(5);
        for t in 1..=50 {
            let report = tick(&mut flock, t as f64 * 0.02, &mut rng);
            let mut seen = report.recalculated.clone();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), 11, "agent serviced twice in tick {}", t);
        }
        for agent in flock.agents() {
            assert_eq!(agent.stats().recalculations, 11);
            assert_eq!(agent.stats().moves, 50);
        }
    }

    #[test]
    fn shared_factor_locks_recalculation_cohorts() {
        let mut flock = flock(50, 10);
        let mut rng = StdRng::seed_from_u64(5);
        let mut starts = Vec::new();
        for t in 1..=50 {
            let report = tick(&mut flock, t as f64 * 0.02, &mut rng);
            starts.push(report.recalculated[0]);
        }
        starts.sort_unstable();
        starts.dedup();
        // Only 5 of 50 window offsets ever occur
        assert_eq!(starts, vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn expired_agents_respawn_at_current_anchor() {
        let mut flock = flock(4, 1);
        flock.set_anchor_position(Vec3::new(10.0, 0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(1);

        let report = tick(&mut flock, 10.0, &mut rng);
        assert_eq!(report.resets, 4);
        for agent in flock.agents() {
            assert_eq!(agent.position(), Vec3::new(10.0, 0.0, 0.0));
        }
    }

    #[test]
    fn reset_expired_only_touches_expired_agents() {
        let mut flock = flock(3, 1);
        let mut rng = StdRng::seed_from_u64(2);
        let spawn = flock.spawn_point();
        flock.agents[1].reset(4.0, spawn, &mut rng);
        flock.set_anchor_position(Vec3::new(0.0, 7.0, 0.0));

        assert_eq!(flock.reset_expired(10.0, &mut rng), 2);
        assert_eq!(flock.agents()[0].position(), Vec3::new(0.0, 7.0, 0.0));
        assert_eq!(flock.agents()[1].last_reset_time(), Some(4.0));
        assert_eq!(flock.agents()[2].last_reset_time(), Some(10.0));

        // Nothing left for the tick to reset
        let report = tick(&mut flock, 10.0, &mut rng);
        assert_eq!(report.resets, 0);
    }

    #[test]
    fn integrate_delivers_collisions_once() {
        let mut flock = flock(3, 1);
        let floor = EulerIntegrator::new(vec![Obstacle::plane(Vec3::new(0.0, 1.0, 0.0), Vec3::Y)]);

        // Every agent starts below the floor plane
        assert_eq!(flock.integrate(&floor, 0.02), 3);
        assert_eq!(flock.stuck_count(), 3);
        assert_eq!(flock.integrate(&floor, 0.02), 0);
        for agent in flock.agents() {
            assert_eq!(agent.forward(), Vec3::Y);
        }
        // The anchor is not stopped by obstacles
        assert!(flock.anchor().position.distance(&Vec3::new(0.04, 0.0, 0.0)) < 1.0e-6);
    }
}
