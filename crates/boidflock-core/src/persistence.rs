//! Save/Load functionality for persisting simulation state
//!
//! Uses bincode for efficient binary serialization of the entire simulation.
//! Flocks carry their agents, bodies and schedule cursors; the spatial grid
//! and snapshot table are rebuilt on the next tick. Random streams are
//! derived from the seed and tick count, so a loaded engine continues
//! exactly where the saved one left off.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::config::EngineConfig;
use crate::flock::Flock;
use crate::systems::Obstacle;

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the simulation state
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub config: EngineConfig,
    /// Simulation time in seconds
    pub sim_time: f64,
    pub tick_count: u64,
    pub time_scale: f32,
    pub accumulator: f64,
    pub flocks: Vec<Flock>,
    pub obstacles: Vec<Obstacle>,
}

/// Save the complete simulation to a writer
#[allow(clippy::too_many_arguments)]
pub fn save_simulation<W: Write>(
    writer: W,
    config: &EngineConfig,
    sim_time: f64,
    tick_count: u64,
    time_scale: f32,
    accumulator: f64,
    flocks: &[Flock],
    obstacles: &[Obstacle],
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        config: config.clone(),
        sim_time,
        tick_count,
        time_scale,
        accumulator,
        flocks: flocks.to_vec(),
        obstacles: obstacles.to_vec(),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a simulation from a reader
pub fn load_simulation<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    log::debug!(
        "loaded save at t={:.3} ({} flocks)",
        save_data.sim_time,
        save_data.flocks.len()
    );
    Ok(save_data)
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Save version mismatch: expected {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for SaveError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::SpawnPoint;
    use crate::components::Vec3;
    use crate::config::{AgentParams, FlockConfig};
    use crate::engine::SimulationEngine;

    fn populated_engine() -> SimulationEngine {
        let mut engine = SimulationEngine::default();
        engine.add_obstacle(Obstacle::plane(Vec3::ZERO, Vec3::Y));
        engine
            .add_flock(
                FlockConfig {
                    agent_count: 20,
                    per_update: 7,
                },
                AgentParams::default(),
                SpawnPoint {
                    position: Vec3::new(0.0, 5.0, 0.0),
                    velocity: Vec3::new(1.0, -1.0, 0.0),
                },
            )
            .unwrap();
        engine
    }

    fn positions(engine: &SimulationEngine) -> Vec<Vec3> {
        engine
            .flocks()
            .iter()
            .flat_map(|f| f.agents())
            .map(|a| a.position())
            .collect()
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut engine = populated_engine();
        for _ in 0..25 {
            engine.tick();
        }

        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).expect("Save failed");

        let mut loaded = SimulationEngine::default();
        loaded.load(&save_buffer[..]).expect("Load failed");

        assert_eq!(loaded.sim_time(), engine.sim_time());
        assert_eq!(loaded.tick_count(), engine.tick_count());
        assert_eq!(loaded.agent_count(), 20);
        assert_eq!(loaded.obstacles(), engine.obstacles());
        assert_eq!(loaded.flocks()[0].cursor(), engine.flocks()[0].cursor());
        assert_eq!(positions(&loaded), positions(&engine));
    }

    #[test]
    fn test_loaded_engine_continues_identically() {
        let mut engine = populated_engine();
        for _ in 0..10 {
            engine.tick();
        }
        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).unwrap();

        let mut loaded = SimulationEngine::default();
        loaded.load(&save_buffer[..]).unwrap();

        for _ in 0..40 {
            engine.tick();
            loaded.tick();
        }
        assert_eq!(positions(&loaded), positions(&engine));
        assert_eq!(loaded.stuck_count(), engine.stuck_count());
    }

    #[test]
    fn test_version_mismatch() {
        let engine = populated_engine();
        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).unwrap();

        // Version is the leading little-endian u32
        save_buffer[0] = 99;
        let err = load_simulation(&save_buffer[..]).err().unwrap();
        assert!(matches!(
            err,
            SaveError::VersionMismatch {
                expected: SAVE_VERSION,
                found: 99
            }
        ));
    }

    #[test]
    fn test_truncated_save() {
        let engine = populated_engine();
        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).unwrap();
        save_buffer.truncate(save_buffer.len() / 2);

        let mut loaded = SimulationEngine::default();
        assert!(matches!(
            loaded.load(&save_buffer[..]),
            Err(SaveError::Bincode(_))
        ));
    }
}
