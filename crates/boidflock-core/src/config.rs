//! Tunable parameters for agents, flocks and the engine.
//!
//! Every config type derives serde and has a `Default`, so a scenario can
//! be loaded from JSON with any subset of fields present. Validation
//! returns every problem found rather than stopping at the first one;
//! [`ConfigError::is_fatal`] tells hard errors apart from legal but
//! known-bad settings.
//!
//! ```
//! use boidflock_core::config::{validate_flock_config, ConfigError, FlockConfig};
//!
//! let config = FlockConfig { agent_count: 50, per_update: 10 };
//! let errors = validate_flock_config(&config);
//! assert_eq!(errors.len(), 1);
//! assert!(!errors[0].is_fatal());
//! assert!(matches!(errors[0], ConfigError::NonCoprimeSchedule { .. }));
//! ```

use serde::{Deserialize, Serialize};

use crate::components::Curve;
use crate::systems::{gcd, CategoryMask};

/// Lifecycle weight curves, one per steering behavior.
///
/// Each curve maps the lifecycle fraction (time since reset divided by
/// the lifecycle duration) to a blend weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleWeights {
    pub separation: Curve,
    pub alignment: Curve,
    pub cohesion: Curve,
    pub target: Curve,
    pub random: Curve,
}

impl Default for LifecycleWeights {
    fn default() -> Self {
        Self {
            separation: Curve::constant(1.0),
            alignment: Curve::constant(0.6),
            cohesion: Curve::constant(0.4),
            target: Curve::linear(0.0, 0.2, 1.0, 1.0),
            random: Curve::linear(0.0, 0.5, 1.0, 0.0),
        }
    }
}

impl LifecycleWeights {
    /// All five weights zero everywhere.
    pub fn zero() -> Self {
        Self {
            separation: Curve::constant(0.0),
            alignment: Curve::constant(0.0),
            cohesion: Curve::constant(0.0),
            target: Curve::constant(0.0),
            random: Curve::constant(0.0),
        }
    }
}

/// Per-agent tunables. A flock clones one template into every agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentParams {
    /// Slerp factor toward the newly computed direction (0 = keep, 1 = snap).
    pub dir_smoothing: f32,
    /// Scale of the random component added to the flock velocity on reset.
    pub initial_velocity_random_factor: f32,
    /// Weight of stuck neighbors in the separation average.
    pub stuck_separation_factor: f32,
    /// Weight of stuck neighbors in the alignment average.
    pub stuck_alignment_factor: f32,
    pub max_acceleration: f32,
    pub min_acceleration: f32,
    /// Maps clamp01(dot(forward, accel_dir)) to the max → min acceleration blend.
    pub acceleration_remap: Curve,
    pub neighbor_search_radius: f32,
    /// Categories returned by neighbor queries.
    pub neighbor_filter: CategoryMask,
    /// Seconds between lifecycle resets.
    pub life_cycle_duration: f32,
    pub weights: LifecycleWeights,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            dir_smoothing: 0.2,
            initial_velocity_random_factor: 0.25,
            stuck_separation_factor: 1.5,
            stuck_alignment_factor: 1.5,
            max_acceleration: 1.0,
            min_acceleration: 0.15,
            acceleration_remap: Curve::linear(0.0, 0.0, 1.0, 1.0),
            neighbor_search_radius: 15.0,
            neighbor_filter: CategoryMask::AGENT,
            life_cycle_duration: 10.0,
            weights: LifecycleWeights::default(),
        }
    }
}

/// Flock size and recalculation budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    /// Number of agents, fixed for the flock's lifetime.
    pub agent_count: usize,
    /// Agents given a full steering recalculation per tick. Should be
    /// coprime with `agent_count`.
    pub per_update: usize,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            agent_count: 50,
            per_update: 11,
        }
    }
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds per fixed simulation step.
    pub fixed_time_step: f32,
    /// Seed for the engine RNG.
    pub seed: u64,
    /// Scale applied to frame deltas passed to `update`.
    pub time_scale: f32,
    /// Cap on fixed steps run by a single `update` call.
    pub max_steps_per_update: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_time_step: 0.02,
            seed: 0x5eed_b01d,
            time_scale: 1.0,
            max_steps_per_update: 8,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        match validate_engine_config(&config).into_iter().find(ConfigError::is_fatal) {
            Some(err) => Err(err),
            None => Ok(config),
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A flock must own at least one agent.
    EmptyFlock,
    /// `per_update` must be in `1..=agent_count`.
    PerUpdateOutOfRange { per_update: usize, agent_count: usize },
    /// `per_update` and `agent_count` share a factor; legal but biased.
    NonCoprimeSchedule {
        per_update: usize,
        agent_count: usize,
        common_factor: usize,
    },
    /// Lifecycle duration must be positive and finite.
    NonPositiveLifeCycle(f32),
    /// Fixed time step must be positive and finite.
    NonPositiveTimeStep(f32),
    /// Neighbor search radius must be non-negative and finite.
    NegativeRadius(f32),
    /// Acceleration bounds must be finite, non-negative, and min <= max.
    AccelerationRange { min: f32, max: f32 },
    /// Direction smoothing must be in [0, 1].
    SmoothingOutOfRange(f32),
    /// Stuck weighting factors must be non-negative.
    NegativeStuckFactor(f32),
    /// Time scale must be non-negative and finite.
    InvalidTimeScale(f32),
    /// JSON could not be parsed.
    Json(String),
}

impl ConfigError {
    /// Whether construction must be refused. Non-coprime schedules are
    /// allowed and only logged.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ConfigError::NonCoprimeSchedule { .. })
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e.to_string())
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyFlock => write!(f, "flock has no agents"),
            ConfigError::PerUpdateOutOfRange {
                per_update,
                agent_count,
            } => write!(
                f,
                "per_update {} must be between 1 and agent_count {}",
                per_update, agent_count
            ),
            ConfigError::NonCoprimeSchedule {
                per_update,
                agent_count,
                common_factor,
            } => write!(
                f,
                "per_update {} and agent_count {} share factor {}; schedule windows repeat",
                per_update, agent_count, common_factor
            ),
            ConfigError::NonPositiveLifeCycle(v) => {
                write!(f, "life_cycle_duration must be positive, got {}", v)
            }
            ConfigError::NonPositiveTimeStep(v) => {
                write!(f, "fixed_time_step must be positive, got {}", v)
            }
            ConfigError::NegativeRadius(v) => {
                write!(f, "neighbor_search_radius must be non-negative, got {}", v)
            }
            ConfigError::AccelerationRange { min, max } => {
                write!(f, "invalid acceleration range min {} max {}", min, max)
            }
            ConfigError::SmoothingOutOfRange(v) => {
                write!(f, "dir_smoothing must be in [0, 1], got {}", v)
            }
            ConfigError::NegativeStuckFactor(v) => {
                write!(f, "stuck factors must be non-negative, got {}", v)
            }
            ConfigError::InvalidTimeScale(v) => {
                write!(f, "time_scale must be non-negative, got {}", v)
            }
            ConfigError::Json(e) => write!(f, "config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validate a flock configuration, returning all errors found.
pub fn validate_flock_config(config: &FlockConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.agent_count == 0 {
        errors.push(ConfigError::EmptyFlock);
        return errors;
    }
    if config.per_update == 0 || config.per_update > config.agent_count {
        errors.push(ConfigError::PerUpdateOutOfRange {
            per_update: config.per_update,
            agent_count: config.agent_count,
        });
        return errors;
    }

    let common_factor = gcd(config.per_update, config.agent_count);
    if common_factor != 1 {
        errors.push(ConfigError::NonCoprimeSchedule {
            per_update: config.per_update,
            agent_count: config.agent_count,
            common_factor,
        });
    }

    errors
}

/// Validate agent parameters, returning all errors found.
pub fn validate_agent_params(params: &AgentParams) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if !(params.life_cycle_duration.is_finite() && params.life_cycle_duration > 0.0) {
        errors.push(ConfigError::NonPositiveLifeCycle(params.life_cycle_duration));
    }
    if !(params.neighbor_search_radius.is_finite() && params.neighbor_search_radius >= 0.0) {
        errors.push(ConfigError::NegativeRadius(params.neighbor_search_radius));
    }

    let (min, max) = (params.min_acceleration, params.max_acceleration);
    if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
        errors.push(ConfigError::AccelerationRange { min, max });
    }

    if !(0.0..=1.0).contains(&params.dir_smoothing) {
        errors.push(ConfigError::SmoothingOutOfRange(params.dir_smoothing));
    }

    for factor in [params.stuck_separation_factor, params.stuck_alignment_factor] {
        if !(factor.is_finite() && factor >= 0.0) {
            errors.push(ConfigError::NegativeStuckFactor(factor));
        }
    }

    errors
}

/// Validate engine settings, returning all errors found.
pub fn validate_engine_config(config: &EngineConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if !(config.fixed_time_step.is_finite() && config.fixed_time_step > 0.0) {
        errors.push(ConfigError::NonPositiveTimeStep(config.fixed_time_step));
    }
    if !(config.time_scale.is_finite() && config.time_scale >= 0.0) {
        errors.push(ConfigError::InvalidTimeScale(config.time_scale));
    }

    errors
}
