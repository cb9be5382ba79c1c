//! Rigid-body state owned by agents and flock anchors.
//!
//! Bodies are plain data. Forces requested during a tick accumulate in
//! `pending_acceleration` and are consumed by an
//! [`Integrator`](crate::systems::Integrator) at the end of the tick.

use serde::{Deserialize, Serialize};

use super::Vec3;

/// Movement constraint on a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Constraint {
    /// Free to move.
    #[default]
    None,
    /// Position is frozen; the integrator neither moves nor accelerates it.
    FreezePosition,
}

/// Point-mass rigid body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Acceleration accumulated since the last integration step.
    pub pending_acceleration: Vec3,
    pub constraint: Constraint,
}

impl Body {
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            pending_acceleration: Vec3::ZERO,
            constraint: Constraint::None,
        }
    }

    /// Add an acceleration-mode force (mass independent). The integrator
    /// applies it as `velocity += acceleration * dt`.
    pub fn apply_acceleration(&mut self, acceleration: Vec3) {
        self.pending_acceleration += acceleration;
    }

    /// Zero velocity and freeze in place.
    pub fn freeze(&mut self) {
        self.velocity = Vec3::ZERO;
        self.pending_acceleration = Vec3::ZERO;
        self.constraint = Constraint::FreezePosition;
    }

    pub fn set_constraint(&mut self, constraint: Constraint) {
        self.constraint = constraint;
    }

    pub fn is_frozen(&self) -> bool {
        self.constraint == Constraint::FreezePosition
    }

    /// Take and clear the accumulated acceleration.
    pub fn take_pending_acceleration(&mut self) -> Vec3 {
        std::mem::take(&mut self.pending_acceleration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accelerations_accumulate_until_taken() {
        let mut body = Body::new(Vec3::ZERO, Vec3::ZERO);
        body.apply_acceleration(Vec3::X);
        body.apply_acceleration(Vec3::Y * 2.0);
        assert_eq!(body.take_pending_acceleration(), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(body.pending_acceleration, Vec3::ZERO);
    }

    #[test]
    fn freeze_clears_motion() {
        let mut body = Body::new(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0));
        body.apply_acceleration(Vec3::Z);
        body.freeze();
        assert!(body.is_frozen());
        assert_eq!(body.velocity, Vec3::ZERO);
        assert_eq!(body.pending_acceleration, Vec3::ZERO);
    }
}
