//! Random direction sampling.

use rand::Rng;
use rand_distr::{Distribution, UnitBall, UnitSphere};

use crate::components::Vec3;

/// Uniform sample inside the unit ball.
pub fn random_in_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let [x, y, z]: [f32; 3] = UnitBall.sample(rng);
    Vec3::new(x, y, z)
}

/// Uniform sample on the unit sphere surface.
pub fn random_on_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let [x, y, z]: [f32; 3] = UnitSphere.sample(rng);
    Vec3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn inside_samples_stay_in_ball() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(random_in_unit_sphere(&mut rng).length() <= 1.0 + 1.0e-6);
        }
    }

    #[test]
    fn surface_samples_are_unit_and_spread() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut mean = Vec3::ZERO;
        for _ in 0..2000 {
            let v = random_on_unit_sphere(&mut rng);
            assert!((v.length() - 1.0).abs() < 1.0e-5);
            mean += v;
        }
        // Uniform directions average out near the origin
        assert!((mean / 2000.0).length() < 0.1);
    }
}
