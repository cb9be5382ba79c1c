//! Common components used across agents, flocks and collaborators.

use serde::{Deserialize, Serialize};

/// Squared length below which a vector is treated as zero.
const ZERO_EPSILON_SQ: f32 = 1.0e-10;

/// 3D vector used for positions, velocities and directions
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const X: Self = Self { x: 1.0, y: 0.0, z: 0.0 };
    pub const Y: Self = Self { x: 0.0, y: 1.0, z: 0.0 };
    pub const Z: Self = Self { x: 0.0, y: 0.0, z: 1.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn length_squared(&self) -> f32 {
        self.dot(self)
    }

    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Exact comparison against the zero vector.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Unit vector in the same direction, or zero for (near) zero vectors.
    pub fn normalize(&self) -> Self {
        let len_sq = self.length_squared();
        if len_sq > ZERO_EPSILON_SQ {
            *self / len_sq.sqrt()
        } else {
            Self::ZERO
        }
    }

    /// Linear interpolation, `t` clamped to [0, 1].
    pub fn lerp(&self, to: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        *self + (*to - *self) * t
    }

    /// Spherical interpolation, `t` clamped to [0, 1].
    ///
    /// Vectors are treated as directions: the direction is rotated by the
    /// fraction `t` of the angle between them while the magnitude is
    /// linearly interpolated. Falls back to [`Vec3::lerp`] when either side
    /// is zero.
    pub fn slerp(&self, to: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        if t <= 0.0 {
            return *self;
        }
        if t >= 1.0 {
            return *to;
        }

        let from_len = self.length();
        let to_len = to.length();
        if from_len * from_len <= ZERO_EPSILON_SQ || to_len * to_len <= ZERO_EPSILON_SQ {
            return self.lerp(to, t);
        }

        let from_dir = *self / from_len;
        let to_dir = *to / to_len;
        let cos_theta = from_dir.dot(&to_dir).clamp(-1.0, 1.0);
        let magnitude = from_len + (to_len - from_len) * t;

        let mut axis = from_dir.cross(&to_dir);
        if axis.length_squared() <= ZERO_EPSILON_SQ {
            if cos_theta > 0.0 {
                return from_dir * magnitude;
            }
            // Opposite directions: any perpendicular axis works.
            axis = from_dir.any_perpendicular();
        }

        let angle = cos_theta.acos() * t;
        from_dir.rotate_around(&axis.normalize(), angle) * magnitude
    }

    /// Rotate around a unit axis (Rodrigues' formula).
    pub fn rotate_around(&self, axis: &Self, angle_radians: f32) -> Self {
        let (sin, cos) = angle_radians.sin_cos();
        *self * cos + axis.cross(self) * sin + *axis * (axis.dot(self) * (1.0 - cos))
    }

    fn any_perpendicular(&self) -> Self {
        let reference = if self.x.abs() < 0.9 { Self::X } else { Self::Y };
        self.cross(&reference).normalize()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl std::ops::Div<f32> for Vec3 {
    type Output = Self;
    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

/// Identifies a flock within a [`crate::engine::SimulationEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlockId(pub u32);

/// Identifies an agent: its owning flock plus its slot in that flock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId {
    pub flock: FlockId,
    pub index: u32,
}

impl AgentId {
    pub fn new(flock: FlockId, index: u32) -> Self {
        Self { flock, index }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "flock {} / agent {}", self.flock.0, self.index)
    }
}
