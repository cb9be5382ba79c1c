//! Rigid-body integration and obstacle contacts.
//!
//! The steering core only needs something that consumes the acceleration
//! requested on a [`Body`] and reports the first obstacle contact. The
//! [`EulerIntegrator`] here is that minimal collaborator: point masses,
//! semi-implicit Euler, static plane and sphere obstacles.

use serde::{Deserialize, Serialize};

use crate::components::{Body, Vec3};

/// Rigid-body integrator collaborator.
pub trait Integrator {
    /// Advance `body` by `dt`, consuming its pending acceleration. Returns
    /// the contact normal if the body touched an obstacle during the step.
    fn integrate(&self, body: &mut Body, dt: f32) -> Option<Vec3>;
}

/// Static obstacle surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Obstacle {
    /// Half-space boundary; the free side is where `normal` points.
    Plane { point: Vec3, normal: Vec3 },
    /// Solid ball.
    Sphere { center: Vec3, radius: f32 },
}

/// Surface normal and penetration depth of a contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub normal: Vec3,
    pub depth: f32,
}

impl Obstacle {
    pub fn plane(point: Vec3, normal: Vec3) -> Self {
        Obstacle::Plane {
            point,
            normal: normal.normalize(),
        }
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Obstacle::Sphere {
            center,
            radius: radius.max(0.0),
        }
    }

    /// Contact at `position`, if it lies inside the obstacle.
    pub fn contact(&self, position: Vec3) -> Option<Contact> {
        match *self {
            Obstacle::Plane { point, normal } => {
                let normal = normal.normalize();
                if normal.is_zero() {
                    return None;
                }
                let distance = (position - point).dot(&normal);
                (distance < 0.0).then_some(Contact {
                    normal,
                    depth: -distance,
                })
            }
            Obstacle::Sphere { center, radius } => {
                let offset = position - center;
                let distance = offset.length();
                if distance >= radius {
                    return None;
                }
                let normal = if distance > 0.0 {
                    offset / distance
                } else {
                    Vec3::Y
                };
                Some(Contact {
                    normal,
                    depth: radius - distance,
                })
            }
        }
    }
}

/// Semi-implicit Euler over point masses with static obstacles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EulerIntegrator {
    pub obstacles: Vec<Obstacle>,
}

impl EulerIntegrator {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    /// First obstacle (in insertion order) containing `position`.
    pub fn first_contact(&self, position: Vec3) -> Option<Contact> {
        self.obstacles.iter().find_map(|o| o.contact(position))
    }
}

impl Integrator for EulerIntegrator {
    fn integrate(&self, body: &mut Body, dt: f32) -> Option<Vec3> {
        let acceleration = body.take_pending_acceleration();
        if body.is_frozen() {
            body.velocity = Vec3::ZERO;
            return None;
        }

        body.velocity += acceleration * dt;
        body.position += body.velocity * dt;

        let contact = self.first_contact(body.position)?;
        // Resolve onto the surface; the collision callback decides what else happens
        body.position += contact.normal * contact.depth;
        Some(contact.normal)
    }
}
