//! Response curves that map a raw utility score onto a comparable scale.

/// A scalar response curve.
///
/// Utility nodes pass each branch's raw score through its curve before
/// comparing branches, so differently-scaled considerations ("distance in
/// metres", "ammo fraction") can compete on one axis.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResponseCurve {
    /// `y = x`
    Identity,

    /// `y = slope * x + intercept`
    Linear { slope: f32, intercept: f32 },

    /// `y = scale * x^exponent`.  Negative `x` is clamped to 0 first.
    Power { exponent: f32, scale: f32 },

    /// `y = 1 / (1 + e^(-steepness * (x - midpoint)))`
    Logistic { steepness: f32, midpoint: f32 },

    /// `y = high` when `x >= threshold`, else `low`.
    Step { threshold: f32, low: f32, high: f32 },

    /// Piecewise-linear through `(x, y)` keys ordered by `x` (unordered keys
    /// are sorted at evaluation); clamped to the first/last key outside
    /// their range.  An empty key list yields `0.0`, a NaN input NaN.
    Keyframes(Vec<(f32, f32)>),
}

impl Default for ResponseCurve {
    fn default() -> Self {
        ResponseCurve::Identity
    }
}

impl ResponseCurve {
    /// Build a keyframe curve, sorting keys by `x`.
    pub fn keyframes(mut keys: Vec<(f32, f32)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        ResponseCurve::Keyframes(keys)
    }

    /// Map `x` through the curve.
    pub fn evaluate(&self, x: f32) -> f32 {
        match self {
            ResponseCurve::Identity => x,
            ResponseCurve::Linear { slope, intercept } => slope * x + intercept,
            ResponseCurve::Power { exponent, scale } => scale * x.max(0.0).powf(*exponent),
            ResponseCurve::Logistic { steepness, midpoint } => {
                1.0 / (1.0 + (-steepness * (x - midpoint)).exp())
            }
            ResponseCurve::Step { threshold, low, high } => {
                if x >= *threshold { *high } else { *low }
            }
            ResponseCurve::Keyframes(keys) => evaluate_keys(keys, x),
        }
    }
}

fn evaluate_keys(keys: &[(f32, f32)], x: f32) -> f32 {
    if x.is_nan() {
        return f32::NAN;
    }
    if !keys.is_sorted_by(|a, b| a.0 <= b.0) {
        // Keys built without `keyframes()` (e.g. deserialized) may be unordered.
        let mut sorted = keys.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        return interpolate(&sorted, x);
    }
    interpolate(keys, x)
}

fn interpolate(keys: &[(f32, f32)], x: f32) -> f32 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return 0.0;
    };
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }
    // First key strictly right of x; guaranteed to exist and be > 0.
    let hi = keys.partition_point(|k| k.0 <= x);
    let (x0, y0) = keys[hi - 1];
    let (x1, y1) = keys[hi];
    let span = x1 - x0;
    if span <= f32::EPSILON {
        return y1;
    }
    y0 + (y1 - y0) * (x - x0) / span
}
