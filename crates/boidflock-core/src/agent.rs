//! Agent (boid) steering unit.
//!
//! An agent blends five steering behaviors into a desired acceleration
//! direction, weighting each by a curve over its lifecycle fraction:
//!
//! | Behavior | Neighbors considered | Direction |
//! |----------|----------------------|-----------|
//! | Separation | all flocks | normalize(self − weighted mean position) |
//! | Alignment | own flock | weighted mean of neighbor forwards |
//! | Cohesion | own flock, not stuck | (self − summed position) / count |
//! | Target | none | self − flock target |
//! | Random | none | fresh unit-sphere sample |
//!
//! Stuck neighbors count `stuck_separation_factor` / `stuck_alignment_factor`
//! times in the separation and alignment averages. The blended direction is
//! slerped into the stored acceleration direction by `dir_smoothing`.
//!
//! The cohesion and target rows are kept exactly as listed even though
//! cohesion divides the difference by the count instead of subtracting
//! the mean, and target points away from the target.
//!
//! Lifecycle: `Free → (collision) → Stuck → (lifecycle expiry, reset) → Free`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{AgentId, Body, FlockId, Vec3};
use crate::config::AgentParams;
use crate::systems::{
    random_in_unit_sphere, random_on_unit_sphere, AgentSnapshot, CategoryMask, NeighborQuery,
};

/// Where reset agents respawn: the owning flock's anchor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnPoint {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Everything an agent reads during one tick.
pub struct TickContext<'a> {
    /// Simulation time in seconds.
    pub now: f64,
    /// Fixed step length in seconds.
    pub dt: f32,
    /// The owning flock's target.
    pub target: Vec3,
    pub spawn: SpawnPoint,
    pub neighbors: &'a dyn NeighborQuery,
    /// Table the neighbor query indexes into.
    pub snapshots: &'a [AgentSnapshot],
}

/// Raw direction of each behavior before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BehaviorDirections {
    pub separation: Vec3,
    pub alignment: Vec3,
    pub cohesion: Vec3,
    pub target: Vec3,
    pub random: Vec3,
}

/// Result of a steering recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringOutcome {
    /// Weighted blend of `behaviors` contributing behaviors.
    Blended { behaviors: u8 },
    /// Nothing contributed; the current forward was held.
    HeldForward,
    /// Stuck agents do not steer.
    SkippedStuck,
}

/// What one scheduled update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentUpdate {
    pub reset: bool,
    pub steering: Option<SteeringOutcome>,
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStats {
    pub recalculations: u64,
    pub moves: u64,
    pub resets: u64,
    pub steering_failures: u64,
    pub collisions: u64,
}

/// One flocking agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    id: AgentId,
    params: AgentParams,
    body: Body,
    accel_dir: Vec3,
    stuck: bool,
    stuck_normal: Vec3,
    /// `None` until the first reset.
    last_reset_time: Option<f64>,
    stats: AgentStats,
}

impl Agent {
    /// A fresh agent. Its lifecycle phase is undefined until [`Agent::reset`].
    pub fn new(id: AgentId, params: AgentParams) -> Self {
        Self {
            id,
            params,
            body: Body::default(),
            accel_dir: Vec3::ZERO,
            stuck: false,
            stuck_normal: Vec3::ZERO,
            last_reset_time: None,
            stats: AgentStats::default(),
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn flock(&self) -> FlockId {
        self.id.flock
    }

    pub fn params(&self) -> &AgentParams {
        &self.params
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.body.velocity
    }

    /// Smoothed acceleration direction from the last recalculation.
    pub fn accel_dir(&self) -> Vec3 {
        self.accel_dir
    }

    /// Seed the heading the next recalculation smooths from.
    pub fn set_accel_dir(&mut self, accel_dir: Vec3) {
        self.accel_dir = accel_dir;
    }

    pub fn is_stuck(&self) -> bool {
        self.stuck
    }

    /// Contact normal; only meaningful while stuck.
    pub fn stuck_normal(&self) -> Vec3 {
        self.stuck_normal
    }

    pub fn last_reset_time(&self) -> Option<f64> {
        self.last_reset_time
    }

    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    /// Contact normal while stuck, otherwise the normalized velocity.
    pub fn forward(&self) -> Vec3 {
        if self.stuck {
            self.stuck_normal
        } else {
            self.body.velocity.normalize()
        }
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            position: self.body.position,
            forward: self.forward(),
            stuck: self.stuck,
            category: CategoryMask::AGENT,
        }
    }

    /// Seconds since the last reset (infinite before the first one).
    pub fn age(&self, now: f64) -> f64 {
        match self.last_reset_time {
            Some(t) => now - t,
            None => f64::INFINITY,
        }
    }

    /// Age divided by the lifecycle duration; in [0, 1) between resets.
    pub fn life_fraction(&self, now: f64) -> f32 {
        (self.age(now) / f64::from(self.params.life_cycle_duration)) as f32
    }

    pub fn lifecycle_expired(&self, now: f64) -> bool {
        self.age(now) >= f64::from(self.params.life_cycle_duration)
    }

    /// Respawn at the flock anchor with a jittered copy of its velocity and
    /// clear the stuck state.
    pub fn reset<R: Rng + ?Sized>(&mut self, now: f64, spawn: SpawnPoint, rng: &mut R) {
        self.last_reset_time = Some(now);

        let jitter = random_in_unit_sphere(rng) * self.params.initial_velocity_random_factor;
        self.body = Body::new(spawn.position, spawn.velocity + jitter);

        self.stuck = false;
        self.stuck_normal = Vec3::ZERO;
        self.stats.resets += 1;

        log::debug!("{}: reset at t={:.3}", self.id, now);
    }

    /// Scheduled per-tick entry point: reset on lifecycle expiry, recalculate
    /// steering if asked (and not stuck), then move.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        recalculate: bool,
        ctx: &TickContext<'_>,
        rng: &mut R,
    ) -> AgentUpdate {
        let reset = self.lifecycle_expired(ctx.now);
        if reset {
            self.reset(ctx.now, ctx.spawn, rng);
        }

        let steering = (recalculate && !self.stuck).then(|| self.calculate_accel(ctx, rng));

        self.move_agent(ctx.dt);

        AgentUpdate { reset, steering }
    }

    /// Recompute the smoothed acceleration direction.
    pub fn calculate_accel<R: Rng + ?Sized>(
        &mut self,
        ctx: &TickContext<'_>,
        rng: &mut R,
    ) -> SteeringOutcome {
        if self.stuck {
            return SteeringOutcome::SkippedStuck;
        }
        self.stats.recalculations += 1;

        let mut found = Vec::new();
        ctx.neighbors.query(
            self.body.position,
            self.params.neighbor_search_radius,
            self.params.neighbor_filter,
            &mut found,
        );
        let neighbors: Vec<&AgentSnapshot> = found
            .iter()
            .filter_map(|&i| ctx.snapshots.get(i))
            .filter(|s| s.id != self.id)
            .collect();

        let directions = BehaviorDirections {
            separation: self.separation_direction(&neighbors),
            alignment: self.alignment_direction(&neighbors),
            cohesion: self.cohesion_direction(&neighbors),
            target: self.body.position - ctx.target,
            random: random_on_unit_sphere(rng),
        };

        let (direction, outcome) = match self.blend(&directions, self.life_fraction(ctx.now)) {
            Some((direction, behaviors)) => (direction, SteeringOutcome::Blended { behaviors }),
            None => {
                log::error!(
                    "{}: failed to calculate steering direction, holding forward",
                    self.id
                );
                self.stats.steering_failures += 1;
                (self.forward(), SteeringOutcome::HeldForward)
            }
        };

        self.accel_dir = self.accel_dir.slerp(&direction, self.params.dir_smoothing);
        outcome
    }

    /// Push along `accel_dir`, harder when turning than when cruising.
    pub fn move_agent(&mut self, dt: f32) {
        let alignment = self.forward().dot(&self.accel_dir).clamp(0.0, 1.0);
        let blend = self
            .params
            .acceleration_remap
            .evaluate(alignment)
            .clamp(0.0, 1.0);
        let accel_factor = self.params.max_acceleration
            + (self.params.min_acceleration - self.params.max_acceleration) * blend;

        self.body.apply_acceleration(self.accel_dir * accel_factor * dt);
        self.stats.moves += 1;
    }

    /// Obstacle contact: become stuck, stop, freeze, remember the normal.
    /// Returns `false` if already stuck.
    pub fn on_collision(&mut self, normal: Vec3) -> bool {
        if self.stuck {
            return false;
        }

        self.stuck = true;
        self.body.freeze();
        self.stuck_normal = normal.normalize();
        self.stats.collisions += 1;

        log::debug!("{}: stuck at {:?}", self.id, self.body.position);
        true
    }

    /// Weighted blend of the non-zero behaviors with positive weight at
    /// `life_fraction`. `None` when nothing contributes.
    pub fn blend(&self, directions: &BehaviorDirections, life_fraction: f32) -> Option<(Vec3, u8)> {
        let weights = &self.params.weights;
        let candidates = [
            (&weights.separation, directions.separation),
            (&weights.alignment, directions.alignment),
            (&weights.cohesion, directions.cohesion),
            (&weights.target, directions.target),
            (&weights.random, directions.random),
        ];

        let mut divisor = 0.0;
        let mut workspace = Vec3::ZERO;
        let mut behaviors = 0u8;

        for (curve, direction) in candidates {
            let factor = curve.evaluate(life_fraction);
            if factor > 0.0 && !direction.is_zero() {
                divisor += factor;
                workspace += direction * factor;
                behaviors += 1;
            }
        }

        (divisor > 0.0).then(|| (workspace / divisor, behaviors))
    }

    /// Away from the weighted centre of all neighbors, any flock.
    pub fn separation_direction(&self, neighbors: &[&AgentSnapshot]) -> Vec3 {
        let mut divisor = 0.0;
        let mut workspace = Vec3::ZERO;

        for n in neighbors {
            let weight = if n.stuck {
                self.params.stuck_separation_factor
            } else {
                1.0
            };
            divisor += weight;
            workspace += n.position * weight;
        }

        if divisor > 0.0 {
            (self.body.position - workspace / divisor).normalize()
        } else {
            Vec3::ZERO
        }
    }

    /// Weighted mean forward of same-flock neighbors (not normalized).
    pub fn alignment_direction(&self, neighbors: &[&AgentSnapshot]) -> Vec3 {
        let mut divisor = 0.0;
        let mut workspace = Vec3::ZERO;

        for n in neighbors.iter().filter(|n| n.id.flock == self.id.flock) {
            let weight = if n.stuck {
                self.params.stuck_alignment_factor
            } else {
                1.0
            };
            divisor += weight;
            workspace += n.forward * weight;
        }

        if divisor > 0.0 {
            workspace / divisor
        } else {
            Vec3::ZERO
        }
    }

    /// `(self − Σ positions) / count` over free same-flock neighbors.
    pub fn cohesion_direction(&self, neighbors: &[&AgentSnapshot]) -> Vec3 {
        let mut divisor = 0.0;
        let mut workspace = Vec3::ZERO;

        for n in neighbors
            .iter()
            .filter(|n| n.id.flock == self.id.flock && !n.stuck)
        {
            divisor += 1.0;
            workspace += n.position;
        }

        if divisor > 0.0 {
            (self.body.position - workspace) / divisor
        } else {
            Vec3::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Curve;
    use crate::config::LifecycleWeights;
    use crate::systems::LinearScan;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn agent_at(flock: u32, index: u32, position: Vec3, params: AgentParams) -> Agent {
        let mut agent = Agent::new(AgentId::new(FlockId(flock), index), params);
        agent.reset(
            0.0,
            SpawnPoint {
                position,
                velocity: Vec3::X,
            },
            &mut rng(),
        );
        agent
    }

    fn no_jitter() -> AgentParams {
        AgentParams {
            initial_velocity_random_factor: 0.0,
            ..Default::default()
        }
    }

    fn snapshot(flock: u32, index: u32, position: Vec3, stuck: bool) -> AgentSnapshot {
        AgentSnapshot {
            id: AgentId::new(FlockId(flock), index),
            position,
            forward: Vec3::X,
            stuck,
            category: CategoryMask::AGENT,
        }
    }

    fn ctx<'a>(
        scan: &'a LinearScan<'a>,
        snapshots: &'a [AgentSnapshot],
        now: f64,
    ) -> TickContext<'a> {
        TickContext {
            now,
            dt: 0.02,
            target: Vec3::new(0.0, 0.0, 100.0),
            spawn: SpawnPoint::default(),
            neighbors: scan,
            snapshots,
        }
    }

    #[test]
    fn forward_is_normalized_velocity_or_contact_normal() {
        let mut agent = agent_at(0, 0, Vec3::ZERO, no_jitter());
        agent.body_mut().velocity = Vec3::new(0.0, 3.0, 4.0);
        assert!((agent.forward().length() - 1.0).abs() < 1.0e-6);

        agent.on_collision(Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(agent.forward(), Vec3::Y);
        assert_eq!(agent.velocity(), Vec3::ZERO);
    }

    #[test]
    fn reset_places_agent_at_spawn_and_unsticks() {
        let mut agent = agent_at(0, 0, Vec3::ZERO, AgentParams::default());
        agent.on_collision(Vec3::Y);
        assert!(agent.is_stuck());
        assert!(agent.body().is_frozen());

        let spawn = SpawnPoint {
            position: Vec3::new(5.0, 6.0, 7.0),
            velocity: Vec3::new(1.0, 0.0, 0.0),
        };
        agent.reset(3.0, spawn, &mut rng());

        assert_eq!(agent.position(), spawn.position);
        assert!(!agent.is_stuck());
        assert!(!agent.body().is_frozen());
        assert_eq!(agent.last_reset_time(), Some(3.0));
        // Jitter is bounded by the random factor
        assert!(agent.velocity().distance(&spawn.velocity) <= 0.25 + 1.0e-6);
    }

    #[test]
    fn second_collision_is_ignored() {
        let mut agent = agent_at(0, 0, Vec3::ZERO, no_jitter());
        assert!(agent.on_collision(Vec3::Y));
        assert!(!agent.on_collision(Vec3::X));
        assert_eq!(agent.stuck_normal(), Vec3::Y);
        assert_eq!(agent.stats().collisions, 1);
    }

    #[test]
    fn separation_with_no_neighbors_is_zero() {
        let agent = agent_at(0, 0, Vec3::ZERO, no_jitter());
        assert_eq!(agent.separation_direction(&[]), Vec3::ZERO);
        assert_eq!(agent.alignment_direction(&[]), Vec3::ZERO);
        assert_eq!(agent.cohesion_direction(&[]), Vec3::ZERO);
    }

    #[test]
    fn stuck_neighbor_counts_one_and_a_half_times_in_separation() {
        // Three agents in one flock; the one at x = 4 is stuck.
        let agent = agent_at(0, 0, Vec3::ZERO, no_jitter());
        let free = snapshot(0, 1, Vec3::new(0.0, 2.0, 0.0), false);
        let stuck = snapshot(0, 2, Vec3::new(4.0, 0.0, 0.0), true);

        let direction = agent.separation_direction(&[&free, &stuck]);

        // Weighted mean = (1.0 * (0,2,0) + 1.5 * (4,0,0)) / 2.5 = (2.4, 0.8, 0)
        let expected = (Vec3::ZERO - Vec3::new(2.4, 0.8, 0.0)).normalize();
        assert!(direction.distance(&expected) < 1.0e-5);

        // An unweighted mean would point elsewhere
        let unweighted = (Vec3::ZERO - Vec3::new(2.0, 1.0, 0.0)).normalize();
        assert!(direction.distance(&unweighted) > 1.0e-2);
    }

    #[test]
    fn separation_includes_other_flocks_alignment_does_not() {
        let agent = agent_at(0, 0, Vec3::ZERO, no_jitter());
        let mut other = snapshot(1, 0, Vec3::new(1.0, 0.0, 0.0), false);
        other.forward = Vec3::Y;

        assert_eq!(agent.separation_direction(&[&other]), -Vec3::X);
        assert_eq!(agent.alignment_direction(&[&other]), Vec3::ZERO);
        assert_eq!(agent.cohesion_direction(&[&other]), Vec3::ZERO);
    }

    #[test]
    fn alignment_weights_stuck_forwards() {
        let agent = agent_at(0, 0, Vec3::ZERO, no_jitter());
        let mut a = snapshot(0, 1, Vec3::X, false);
        a.forward = Vec3::X;
        let mut b = snapshot(0, 2, Vec3::Y, true);
        b.forward = Vec3::Y;

        let direction = agent.alignment_direction(&[&a, &b]);
        // (1 * X + 1.5 * Y) / 2.5, deliberately not normalized
        assert!(direction.distance(&Vec3::new(0.4, 0.6, 0.0)) < 1.0e-6);
    }

    #[test]
    fn cohesion_divides_difference_by_count() {
        // Kept as (self - sum) / n rather than mean - self.
        let agent = agent_at(0, 0, Vec3::new(1.0, 0.0, 0.0), no_jitter());
        let a = snapshot(0, 1, Vec3::new(3.0, 0.0, 0.0), false);
        let b = snapshot(0, 2, Vec3::new(5.0, 0.0, 0.0), false);
        let stuck = snapshot(0, 3, Vec3::new(100.0, 0.0, 0.0), true);

        let direction = agent.cohesion_direction(&[&a, &b, &stuck]);
        assert_eq!(direction, Vec3::new((1.0 - 8.0) / 2.0, 0.0, 0.0));
    }

    #[test]
    fn target_direction_points_away_from_target() {
        let mut params = no_jitter();
        params.dir_smoothing = 1.0;
        params.weights = LifecycleWeights::zero();
        params.weights.target = Curve::constant(1.0);

        let mut agent = agent_at(0, 0, Vec3::ZERO, params);
        let snapshots = [agent.snapshot()];
        let scan = LinearScan {
            snapshots: &snapshots,
        };
        let outcome = agent.calculate_accel(&ctx(&scan, &snapshots, 1.0), &mut rng());

        assert_eq!(outcome, SteeringOutcome::Blended { behaviors: 1 });
        // Target is at +z; self − target is -z (and unnormalized).
        assert_eq!(agent.accel_dir(), Vec3::new(0.0, 0.0, -100.0));
    }

    #[test]
    fn all_zero_weights_hold_forward() {
        let mut params = no_jitter();
        params.dir_smoothing = 1.0;
        params.weights = LifecycleWeights::zero();

        let mut agent = agent_at(0, 0, Vec3::ZERO, params);
        agent.body_mut().velocity = Vec3::new(0.0, 0.0, 2.0);
        let snapshots = [agent.snapshot()];
        let scan = LinearScan {
            snapshots: &snapshots,
        };

        let outcome = agent.calculate_accel(&ctx(&scan, &snapshots, 1.0), &mut rng());

        assert_eq!(outcome, SteeringOutcome::HeldForward);
        assert_eq!(agent.accel_dir(), Vec3::Z);
        assert_eq!(agent.stats().steering_failures, 1);
    }

    #[test]
    fn smoothing_zero_keeps_and_one_snaps() {
        let mut params = no_jitter();
        params.weights = LifecycleWeights::zero();
        params.weights.target = Curve::constant(1.0);

        // Heading +x while the target pulls along -z
        params.dir_smoothing = 0.0;
        let mut frozen = agent_at(0, 0, Vec3::ZERO, params.clone());
        frozen.set_accel_dir(Vec3::X);
        let snapshots = [frozen.snapshot()];
        let scan = LinearScan {
            snapshots: &snapshots,
        };
        for t in 1..5 {
            let outcome = frozen.calculate_accel(&ctx(&scan, &snapshots, t as f64), &mut rng());
            assert_eq!(outcome, SteeringOutcome::Blended { behaviors: 1 });
            assert_eq!(frozen.accel_dir(), Vec3::X);
        }

        params.dir_smoothing = 1.0;
        let mut snappy = agent_at(0, 0, Vec3::ZERO, params);
        snappy.set_accel_dir(Vec3::X);
        snappy.calculate_accel(&ctx(&scan, &snapshots, 1.0), &mut rng());
        assert_eq!(snappy.accel_dir(), Vec3::new(0.0, 0.0, -100.0));
    }

    #[test]
    fn blend_follows_lifecycle_curves() {
        let mut params = no_jitter();
        params.weights = LifecycleWeights::zero();
        params.weights.separation = Curve::linear(0.0, 1.0, 1.0, 0.0);
        params.weights.target = Curve::linear(0.0, 0.0, 1.0, 1.0);
        let agent = agent_at(0, 0, Vec3::ZERO, params);

        let directions = BehaviorDirections {
            separation: Vec3::X,
            target: Vec3::Y,
            ..Default::default()
        };

        let (early, n) = agent.blend(&directions, 0.0).unwrap();
        assert_eq!((early, n), (Vec3::X, 1));
        let (mid, n) = agent.blend(&directions, 0.5).unwrap();
        assert_eq!(n, 2);
        assert!(mid.distance(&Vec3::new(0.5, 0.5, 0.0)) < 1.0e-6);
        let (late, _) = agent.blend(&directions, 1.0).unwrap();
        assert_eq!(late, Vec3::Y);
    }

    #[test]
    fn blend_skips_zero_directions() {
        let mut params = no_jitter();
        params.weights = LifecycleWeights::zero();
        params.weights.cohesion = Curve::constant(5.0);
        let agent = agent_at(0, 0, Vec3::ZERO, params);
        assert_eq!(agent.blend(&BehaviorDirections::default(), 0.5), None);
    }

    #[test]
    fn stuck_agent_does_not_recalculate() {
        let mut agent = agent_at(0, 0, Vec3::ZERO, AgentParams::default());
        agent.on_collision(Vec3::Y);
        let before = agent.accel_dir();
        let snapshots = [agent.snapshot()];
        let scan = LinearScan {
            snapshots: &snapshots,
        };
        let update = agent.update(true, &ctx(&scan, &snapshots, 1.0), &mut rng());
        assert_eq!(update.steering, None);
        assert_eq!(agent.accel_dir(), before);
        assert_eq!(agent.stats().recalculations, 0);
        assert_eq!(
            agent.calculate_accel(&ctx(&scan, &snapshots, 1.0), &mut rng()),
            SteeringOutcome::SkippedStuck
        );
    }

    #[test]
    fn move_rewards_turning_over_cruising() {
        let mut params = no_jitter();
        params.dir_smoothing = 1.0;
        params.weights = LifecycleWeights::zero();
        params.weights.separation = Curve::constant(1.0);

        // Heading +x, desired +x: cruising gets min acceleration
        let mut cruising = agent_at(0, 0, Vec3::ZERO, params.clone());
        cruising.accel_dir = Vec3::X;
        cruising.move_agent(1.0);
        assert!((cruising.body().pending_acceleration.length() - 0.15).abs() < 1.0e-6);

        // Heading +x, desired +y: turning gets max acceleration
        let mut turning = agent_at(0, 0, Vec3::ZERO, params);
        turning.accel_dir = Vec3::Y;
        turning.move_agent(1.0);
        assert!((turning.body().pending_acceleration.length() - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn move_scales_by_time_step() {
        let mut agent = agent_at(0, 0, Vec3::ZERO, no_jitter());
        agent.accel_dir = Vec3::Y;
        agent.move_agent(0.02);
        assert!((agent.body().pending_acceleration.y - 0.02).abs() < 1.0e-7);
    }

    #[test]
    fn update_resets_expired_agents() {
        let mut agent = agent_at(0, 0, Vec3::new(9.0, 9.0, 9.0), no_jitter());
        let snapshots = [agent.snapshot()];
        let scan = LinearScan {
            snapshots: &snapshots,
        };

        let early = agent.update(false, &ctx(&scan, &snapshots, 9.9), &mut rng());
        assert!(!early.reset);

        let late = agent.update(false, &ctx(&scan, &snapshots, 10.0), &mut rng());
        assert!(late.reset);
        assert_eq!(agent.position(), Vec3::ZERO);
        assert_eq!(agent.last_reset_time(), Some(10.0));
    }

    #[test]
    fn never_reset_agent_is_expired() {
        let agent = Agent::new(AgentId::new(FlockId(0), 0), AgentParams::default());
        assert!(agent.lifecycle_expired(0.0));
        assert_eq!(agent.last_reset_time(), None);
    }
}
