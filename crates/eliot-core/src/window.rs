//! Closed `[min, max]` sampling windows for probabilities and cooldowns.

use crate::rng::{PERCENT_MAX, RandomSource};
use crate::{CoreError, CoreResult};

/// A closed interval a value is sampled from uniformly.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    pub min: f32,
    pub max: f32,
}

impl Window {
    /// Probability window that never gates.
    pub const ALWAYS: Window = Window { min: PERCENT_MAX, max: PERCENT_MAX };

    /// Cooldown window that never gates.
    pub const NO_COOLDOWN: Window = Window { min: 0.0, max: 0.0 };

    #[inline]
    pub const fn new(min: f32, max: f32) -> Self {
        Window { min, max }
    }

    /// A degenerate window that always samples `value`.
    #[inline]
    pub const fn exactly(value: f32) -> Self {
        Window { min: value, max: value }
    }

    /// `true` for the `[100, 100]` probability window.
    #[inline]
    pub fn is_always(&self) -> bool {
        self.min == PERCENT_MAX && self.max == PERCENT_MAX
    }

    /// `true` for the `[0, 0]` cooldown window.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.min == 0.0 && self.max == 0.0
    }

    #[inline]
    pub fn sample<R: RandomSource + ?Sized>(&self, rng: &mut R) -> f32 {
        rng.range(self.min, self.max)
    }

    /// Accept only `0 <= min <= max <= 100`.
    pub fn validate_percent(&self) -> CoreResult<()> {
        self.validate("probability", PERCENT_MAX)
    }

    /// Accept only `0 <= min <= max` (finite).
    pub fn validate_duration(&self) -> CoreResult<()> {
        self.validate("cooldown", f32::MAX)
    }

    fn validate(&self, what: &'static str, upper: f32) -> CoreResult<()> {
        let ok = self.min.is_finite()
            && self.max.is_finite()
            && self.min >= 0.0
            && self.min <= self.max
            && self.max <= upper;
        if ok {
            Ok(())
        } else {
            Err(CoreError::InvalidWindow { what, min: self.min, max: self.max })
        }
    }
}
