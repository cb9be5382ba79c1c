//! Boidflock Core - Staggered Flocking Simulation
//!
//! Groups of agents (boids) steer by blending separation, alignment,
//! cohesion, target-seeking and random wander, with each behavior weighted
//! by a curve over the agent's lifecycle. Agents that hit an obstacle stick
//! to it until their lifecycle expires and they respawn at the flock
//! anchor.
//!
//! # Architecture
//!
//! - **Components**: plain data (`Vec3`, `Curve`, `Body`, ids)
//! - **Systems**: collaborators and pure logic (spatial grid, integrator,
//!   recalculation schedule, sampling)
//! - **Agent / Flock**: the steering unit and the scheduler that decides
//!   which agents recalculate each tick
//! - **Engine**: owns the flocks, the fixed-step clock and the shared grid
//!
//! # Example
//!
//! ```rust,no_run
//! use boidflock_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
//! let flock = engine
//!     .add_flock(FlockConfig::default(), AgentParams::default(), SpawnPoint::default())
//!     .unwrap();
//! engine.flock_mut(flock).unwrap().set_target(Vec3::new(0.0, 20.0, 50.0));
//!
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//! }
//! ```

pub mod agent;
pub mod components;
pub mod config;
pub mod engine;
pub mod flock;
pub mod persistence;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::agent::{Agent, SpawnPoint, SteeringOutcome};
    pub use crate::components::*;
    pub use crate::config::{AgentParams, EngineConfig, FlockConfig, LifecycleWeights};
    pub use crate::engine::SimulationEngine;
    pub use crate::flock::Flock;
    pub use crate::systems::Obstacle;
}
