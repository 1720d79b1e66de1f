//! Random sources for transition probability and cooldown sampling.
//!
//! # Determinism strategy
//!
//! The graph draws every random number through the [`RandomSource`] trait,
//! so tests and replays can inject a scripted sequence while production
//! hosts use [`GraphRng`], a seeded `SmallRng`.  Each graph owns its own
//! source; several agents running the same authored graph get independent
//! streams by seeding with [`GraphRng::for_agent`].

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Upper bound of the percentage scale used by probability windows.
pub const PERCENT_MAX: f32 = 100.0;

/// A uniform random source.
pub trait RandomSource {
    /// A value uniformly distributed in the closed interval `[lo, hi]`.
    ///
    /// Implementations return `lo` when `hi <= lo`.
    fn range(&mut self, lo: f32, hi: f32) -> f32;
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    #[inline]
    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        (**self).range(lo, hi)
    }
}

/// `true` with probability `percent` / 100.
///
/// Draws once in `[0, 100]` and passes iff the draw is `<= percent`.
#[inline]
pub fn true_with_probability<R: RandomSource + ?Sized>(rng: &mut R, percent: f32) -> bool {
    rng.range(0.0, PERCENT_MAX) <= percent
}

// ── GraphRng ──────────────────────────────────────────────────────────────────

/// Seeded, deterministic random source for one graph instance.
pub struct GraphRng(SmallRng);

impl GraphRng {
    pub fn new(seed: u64) -> Self {
        GraphRng(SmallRng::seed_from_u64(seed))
    }

    /// Seed from a shared global seed and a per-agent index, so agents never
    /// share RNG state and adding agents does not disturb existing streams.
    pub fn for_agent(global_seed: u64, agent: u64) -> Self {
        Self::new(global_seed ^ agent.wrapping_mul(MIXING_CONSTANT))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }
}

impl RandomSource for GraphRng {
    #[inline]
    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        // Non-finite bounds would panic inside `gen_range`.
        if !lo.is_finite() || !hi.is_finite() || hi <= lo {
            return lo;
        }
        self.0.gen_range(lo..=hi)
    }
}
