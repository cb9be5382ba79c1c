//! Keyframed scalar curves.
//!
//! Lifecycle weights and the acceleration remap are authored as curves
//! mapping a normalized input in [0, 1] to a scalar. A curve is a list of
//! keyframes evaluated with cubic Hermite interpolation between neighbouring
//! keys; outside the key range it clamps to the first/last value.
//!
//! ```
//! use boidflock_core::components::Curve;
//!
//! let ramp = Curve::linear(0.0, 0.0, 1.0, 2.0);
//! assert!((ramp.evaluate(0.5) - 1.0).abs() < 1e-6);
//! assert_eq!(ramp.evaluate(3.0), 2.0);
//! ```

use serde::{Deserialize, Serialize};

/// A single curve key. Tangents are slopes (value per unit time).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Scalar curve over keyframes, always kept sorted by time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct Curve {
    keys: Vec<Keyframe>,
}

impl Curve {
    /// Build a curve from keys in any order. Non-finite keys are dropped.
    pub fn from_keys(mut keys: Vec<Keyframe>) -> Self {
        keys.retain(|k| k.time.is_finite() && k.value.is_finite());
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// Flat curve returning `value` everywhere.
    pub fn constant(value: f32) -> Self {
        Self::from_keys(vec![Keyframe::new(0.0, value)])
    }

    /// Straight line between two keys; tangents match the slope so the
    /// Hermite evaluation is exactly linear.
    pub fn linear(time_start: f32, value_start: f32, time_end: f32, value_end: f32) -> Self {
        let span = time_end - time_start;
        let slope = if span.abs() > f32::EPSILON {
            (value_end - value_start) / span
        } else {
            0.0
        };
        Self::from_keys(vec![
            Keyframe::with_tangents(time_start, value_start, 0.0, slope),
            Keyframe::with_tangents(time_end, value_end, slope, 0.0),
        ])
    }

    /// Smooth step between two keys (zero tangents at both ends).
    pub fn ease_in_out(time_start: f32, value_start: f32, time_end: f32, value_end: f32) -> Self {
        Self::from_keys(vec![
            Keyframe::new(time_start, value_start),
            Keyframe::new(time_end, value_end),
        ])
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Evaluate the curve at `time`. An empty curve evaluates to 0.
    pub fn evaluate(&self, time: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };

        if time.is_nan() || time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        // First key strictly after `time`; guaranteed in 1..len by the clamps above
        let upper = self.keys.partition_point(|k| k.time <= time);
        let k0 = &self.keys[upper - 1];
        let k1 = &self.keys[upper];
        hermite(k0, k1, time)
    }
}

impl From<Vec<Keyframe>> for Curve {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::from_keys(keys)
    }
}

impl From<Curve> for Vec<Keyframe> {
    fn from(curve: Curve) -> Self {
        curve.keys
    }
}

fn hermite(k0: &Keyframe, k1: &Keyframe, time: f32) -> f32 {
    let span = k1.time - k0.time;
    if span <= f32::EPSILON {
        return k1.value;
    }

    let s = (time - k0.time) / span;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * k0.value + h10 * span * k0.out_tangent + h01 * k1.value + h11 * span * k1.in_tangent
}
