//! Boidflock Headless Simulation Harness
//!
//! Validates steering, scheduling and persistence without any rendering.
//! Runs entirely in-process against the core library.
//!
//! Usage:
//!   cargo run -p boidflock-simtest
//!   cargo run -p boidflock-simtest -- --verbose
//!   cargo run -p boidflock-simtest -- --scenario path/to/scenario.json

use boidflock_core::agent::{Agent, SpawnPoint, SteeringOutcome, TickContext};
use boidflock_core::components::{AgentId, FlockId, Vec3};
use boidflock_core::config::{
    validate_agent_params, validate_engine_config, validate_flock_config, AgentParams,
    EngineConfig, FlockConfig, LifecycleWeights,
};
use boidflock_core::engine::SimulationEngine;
use boidflock_core::systems::{
    coverage, cycle_period, gcd, window_starts_visited, AgentSnapshot, CategoryMask, LinearScan,
    Obstacle,
};
use log::{LevelFilter, Metadata, Record};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

// ── Default scenario ────────────────────────────────────────────────────
const DEFAULT_SCENARIO_JSON: &str = include_str!("../../../data/default_scenario.json");

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    name: String,
    ticks: u32,
    #[serde(default)]
    engine: EngineConfig,
    #[serde(default)]
    obstacles: Vec<Obstacle>,
    flocks: Vec<ScenarioFlock>,
}

#[derive(Debug, Deserialize)]
struct ScenarioFlock {
    config: FlockConfig,
    #[serde(default)]
    spawn: SpawnPoint,
    #[serde(default)]
    target: Vec3,
    #[serde(default)]
    params: AgentParams,
}

// ── Logging ─────────────────────────────────────────────────────────────

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let scenario_path = args
        .iter()
        .position(|a| a == "--scenario")
        .and_then(|i| args.get(i + 1));

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        });
    }

    println!("=== Boidflock Simulation Harness ===\n");

    let scenario_json = match scenario_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("cannot read scenario {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => DEFAULT_SCENARIO_JSON.to_string(),
    };

    let mut results = Vec::new();

    // 1. Scenario parsing and validation
    let scenario = validate_scenario(&scenario_json, &mut results);

    // 2. Recalculation schedule sweep
    results.extend(validate_schedule(verbose));

    // 3. Steering behaviors
    results.extend(validate_steering(verbose));

    // 4. Stuck state and lifecycle
    results.extend(validate_lifecycle(verbose));

    // 5. Full scenario run and persistence
    if let Some(scenario) = scenario {
        results.extend(run_scenario(&scenario, verbose));
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Scenario ─────────────────────────────────────────────────────────

fn validate_scenario(json: &str, results: &mut Vec<TestResult>) -> Option<Scenario> {
    println!("--- Scenario ---");

    let scenario: Scenario = match serde_json::from_str(json) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult {
                name: "scenario_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return None;
        }
    };

    results.push(TestResult {
        name: "scenario_not_empty".into(),
        passed: !scenario.flocks.is_empty() && scenario.ticks > 0,
        detail: format!(
            "'{}': {} flocks, {} ticks",
            scenario.name,
            scenario.flocks.len(),
            scenario.ticks
        ),
    });

    let engine_errors = validate_engine_config(&scenario.engine);
    results.push(TestResult {
        name: "scenario_engine_config".into(),
        passed: engine_errors.is_empty(),
        detail: describe_errors(&engine_errors),
    });

    for (i, flock) in scenario.flocks.iter().enumerate() {
        let mut errors = validate_flock_config(&flock.config);
        errors.extend(validate_agent_params(&flock.params));

        // Non-coprime schedules run, but we want to hear about them
        results.push(TestResult {
            name: format!("scenario_flock_{}_config", i),
            passed: errors.is_empty(),
            detail: format!(
                "{} agents / {} per tick: {}",
                flock.config.agent_count,
                flock.config.per_update,
                describe_errors(&errors)
            ),
        });
    }

    Some(scenario)
}

fn describe_errors<E: std::fmt::Display>(errors: &[E]) -> String {
    if errors.is_empty() {
        "ok".into()
    } else {
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ── 2. Schedule ─────────────────────────────────────────────────────────

fn validate_schedule(verbose: bool) -> Vec<TestResult> {
    println!("--- Recalculation Schedule ---");
    let mut results = Vec::new();

    // One full cycle gives every agent exactly per_update recalculations
    let cases = [(50, 11), (50, 7), (24, 7), (97, 13), (50, 10), (48, 12)];
    for &(count, per_update) in &cases {
        let counts = coverage(count, per_update, count);
        let even = counts.iter().all(|&n| n as usize == per_update);
        results.push(TestResult {
            name: format!("schedule_cycle_{}_{}", count, per_update),
            passed: even,
            detail: format!(
                "{} agents, {} per tick: min {} max {} recalculations",
                count,
                per_update,
                counts.iter().min().copied().unwrap_or(0),
                counts.iter().max().copied().unwrap_or(0)
            ),
        });
    }

    // Window offsets: all of them when coprime, count/gcd otherwise
    for &(count, per_update) in &cases {
        let visited = window_starts_visited(count, per_update);
        let expected = count / gcd(count, per_update);
        results.push(TestResult {
            name: format!("schedule_offsets_{}_{}", count, per_update),
            passed: visited == expected && cycle_period(count, per_update) == expected,
            detail: format!("{} of {} window offsets used", visited, count),
        });
    }

    // Within one tick no agent is serviced twice; across a partial cycle
    // the spread is at most one
    let partial = coverage(50, 11, 17);
    let spread =
        partial.iter().max().copied().unwrap_or(0) - partial.iter().min().copied().unwrap_or(0);
    results.push(TestResult {
        name: "schedule_partial_cycle_spread".into(),
        passed: spread <= 1 && partial.iter().sum::<u32>() == 17 * 11,
        detail: format!("spread {} after 17 ticks", spread),
    });

    if verbose {
        println!("  Window offsets visited per 50-agent flock:");
        for per_update in [5, 10, 11, 13, 25] {
            println!(
                "    per_update {:2}: {:2} offsets, period {:2}",
                per_update,
                window_starts_visited(50, per_update),
                cycle_period(50, per_update)
            );
        }
    }

    results
}

// ── 3. Steering ─────────────────────────────────────────────────────────

fn test_agent(index: u32, position: Vec3, params: AgentParams) -> Agent {
    let mut agent = Agent::new(AgentId::new(FlockId(0), index), params);
    let mut rng = StdRng::seed_from_u64(u64::from(index));
    agent.reset(
        0.0,
        SpawnPoint {
            position,
            velocity: Vec3::X,
        },
        &mut rng,
    );
    agent
}

fn quiet_params() -> AgentParams {
    AgentParams {
        initial_velocity_random_factor: 0.0,
        dir_smoothing: 1.0,
        ..Default::default()
    }
}

fn validate_steering(_verbose: bool) -> Vec<TestResult> {
    println!("--- Steering ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(7);

    // Separation with no neighbors
    let lone = test_agent(0, Vec3::ZERO, quiet_params());
    let separation = lone.separation_direction(&[]);
    results.push(TestResult {
        name: "steering_separation_no_neighbors".into(),
        passed: separation == Vec3::ZERO,
        detail: format!("{:?}", separation),
    });

    // Stuck neighbor weighted 1.5x
    let free = AgentSnapshot {
        id: AgentId::new(FlockId(0), 1),
        position: Vec3::new(0.0, 2.0, 0.0),
        forward: Vec3::X,
        stuck: false,
        category: CategoryMask::AGENT,
    };
    let stuck = AgentSnapshot {
        id: AgentId::new(FlockId(0), 2),
        position: Vec3::new(4.0, 0.0, 0.0),
        stuck: true,
        ..free
    };
    let weighted = lone.separation_direction(&[&free, &stuck]);
    let expected = (Vec3::ZERO - Vec3::new(2.4, 0.8, 0.0)).normalize();
    results.push(TestResult {
        name: "steering_stuck_separation_weight".into(),
        passed: weighted.distance(&expected) < 1.0e-5,
        detail: format!("got {:?}, expected {:?}", weighted, expected),
    });

    // Zero weights hold forward
    let mut params = quiet_params();
    params.weights = LifecycleWeights::zero();
    let mut held = test_agent(3, Vec3::ZERO, params);
    let snapshots = [held.snapshot()];
    let scan = LinearScan {
        snapshots: &snapshots,
    };
    let ctx = TickContext {
        now: 1.0,
        dt: 0.02,
        target: Vec3::new(0.0, 0.0, 50.0),
        spawn: SpawnPoint::default(),
        neighbors: &scan,
        snapshots: &snapshots,
    };
    let outcome = held.calculate_accel(&ctx, &mut rng);
    results.push(TestResult {
        name: "steering_zero_weights_hold_forward".into(),
        passed: outcome == SteeringOutcome::HeldForward
            && held.accel_dir() == held.forward()
            && held.stats().steering_failures == 1,
        detail: format!("{:?} -> {:?}", outcome, held.accel_dir()),
    });

    // Smoothing 0 keeps the stored direction (+x, while the target pulls along -z)
    let mut params = quiet_params();
    params.dir_smoothing = 0.0;
    let mut frozen = test_agent(4, Vec3::ZERO, params);
    frozen.set_accel_dir(Vec3::X);
    frozen.calculate_accel(&ctx, &mut rng);
    results.push(TestResult {
        name: "steering_smoothing_zero".into(),
        passed: frozen.accel_dir() == Vec3::X,
        detail: format!("{:?}", frozen.accel_dir()),
    });

    // Forward is unit length while free
    let mut moving = test_agent(5, Vec3::ZERO, AgentParams::default());
    moving.body_mut().velocity = Vec3::new(3.0, -4.0, 12.0);
    let length = moving.forward().length();
    results.push(TestResult {
        name: "steering_forward_unit".into(),
        passed: (length - 1.0).abs() < 1.0e-5,
        detail: format!("|forward| = {:.6}", length),
    });

    results
}

// ── 4. Lifecycle ────────────────────────────────────────────────────────

fn validate_lifecycle(_verbose: bool) -> Vec<TestResult> {
    println!("--- Lifecycle ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(11);

    let mut agent = test_agent(0, Vec3::new(0.0, 3.0, 0.0), AgentParams::default());
    agent.on_collision(Vec3::new(0.0, 5.0, 0.0));
    results.push(TestResult {
        name: "lifecycle_collision_freezes".into(),
        passed: agent.is_stuck()
            && agent.body().is_frozen()
            && agent.velocity() == Vec3::ZERO
            && agent.forward() == Vec3::Y,
        detail: format!("stuck={} forward={:?}", agent.is_stuck(), agent.forward()),
    });

    let spawn = SpawnPoint {
        position: Vec3::new(1.0, 2.0, 3.0),
        velocity: Vec3::Z,
    };
    let duration = f64::from(agent.params().life_cycle_duration);
    let expired_early = agent.lifecycle_expired(duration - 0.01);
    let expired = agent.lifecycle_expired(duration);
    agent.reset(duration, spawn, &mut rng);
    results.push(TestResult {
        name: "lifecycle_reset_frees".into(),
        passed: !expired_early
            && expired
            && !agent.is_stuck()
            && !agent.body().is_frozen()
            && agent.position() == spawn.position,
        detail: format!("respawned at {:?}", agent.position()),
    });

    results
}

// ── 5. Scenario run ─────────────────────────────────────────────────────

fn build_engine(scenario: &Scenario) -> Result<SimulationEngine, String> {
    let mut engine = SimulationEngine::new(scenario.engine.clone()).map_err(|e| e.to_string())?;
    for obstacle in &scenario.obstacles {
        engine.add_obstacle(*obstacle);
    }
    for flock in &scenario.flocks {
        let id = engine
            .add_flock(flock.config, flock.params.clone(), flock.spawn)
            .map_err(|e| e.to_string())?;
        if let Some(f) = engine.flock_mut(id) {
            f.set_target(flock.target);
        }
    }
    Ok(engine)
}

fn positions(engine: &SimulationEngine) -> Vec<Vec3> {
    engine
        .flocks()
        .iter()
        .flat_map(|f| f.agents())
        .map(|a| a.position())
        .collect()
}

fn run_scenario(scenario: &Scenario, verbose: bool) -> Vec<TestResult> {
    println!("--- Scenario Run ---");
    let mut results = Vec::new();

    let mut engine = match build_engine(scenario) {
        Ok(e) => e,
        Err(e) => {
            results.push(TestResult {
                name: "run_build_engine".into(),
                passed: false,
                detail: e,
            });
            return results;
        }
    };

    let half = scenario.ticks / 2;
    let mut collisions = 0;
    let mut resets = 0;
    let mut failures = 0;
    let start = std::time::Instant::now();
    for _ in 0..half {
        let summary = engine.tick();
        collisions += summary.collisions;
        resets += summary.resets;
        failures += summary.steering_failures;
    }

    // Persistence mid-run: the reloaded engine must continue identically
    let mut save_buffer = Vec::new();
    let saved = engine.save(&mut save_buffer);
    let mut reloaded = SimulationEngine::default();
    let loaded = saved.is_ok() && reloaded.load(&save_buffer[..]).is_ok();
    results.push(TestResult {
        name: "run_save_load".into(),
        passed: loaded && positions(&reloaded) == positions(&engine),
        detail: format!("{} bytes at tick {}", save_buffer.len(), engine.tick_count()),
    });

    for _ in half..scenario.ticks {
        let summary = engine.tick();
        collisions += summary.collisions;
        resets += summary.resets;
        failures += summary.steering_failures;
        if loaded {
            reloaded.tick();
        }
    }
    let elapsed = start.elapsed();

    results.push(TestResult {
        name: "run_reload_deterministic".into(),
        passed: loaded && positions(&reloaded) == positions(&engine),
        detail: format!("{} agents compared", engine.agent_count()),
    });

    let finite = positions(&engine).iter().all(Vec3::is_finite);
    results.push(TestResult {
        name: "run_positions_finite".into(),
        passed: finite,
        detail: format!(
            "{} ticks in {:.1} ms",
            scenario.ticks,
            elapsed.as_secs_f64() * 1000.0
        ),
    });

    // Every agent must be serviced every tick
    let expected_moves = u64::from(scenario.ticks);
    let all_moved = engine
        .flocks()
        .iter()
        .flat_map(|f| f.agents())
        .all(|a| a.stats().moves == expected_moves);
    results.push(TestResult {
        name: "run_every_agent_moved".into(),
        passed: all_moved,
        detail: format!("{} moves each", expected_moves),
    });

    // Stuck agents can only outnumber free ones briefly; resets recycle them
    let lifecycle_ticks = scenario
        .flocks
        .iter()
        .map(|f| f.params.life_cycle_duration / scenario.engine.fixed_time_step)
        .fold(f32::INFINITY, f32::min);
    if (scenario.ticks as f32) > lifecycle_ticks {
        results.push(TestResult {
            name: "run_agents_recycled".into(),
            passed: resets > 0,
            detail: format!("{} resets, {} collisions", resets, collisions),
        });
    }

    results.push(TestResult {
        name: "run_no_steering_fallbacks".into(),
        passed: failures == 0,
        detail: format!("{} steering fallbacks", failures),
    });

    if verbose {
        println!("  Per-flock state after {} ticks:", scenario.ticks);
        for flock in engine.flocks() {
            let recalcs: u64 = flock.agents().iter().map(|a| a.stats().recalculations).sum();
            println!(
                "    flock {}: {} agents, {} stuck, {} recalculations, cursor {}",
                flock.id().0,
                flock.len(),
                flock.stuck_count(),
                recalcs,
                flock.cursor()
            );
        }
    }

    log::debug!("final sim time {:.2}s", engine.sim_time());

    results
}
