//! Time sources for transition cooldowns.
//!
//! # Design
//!
//! The graph only ever asks "what time is it now?", in seconds, when a
//! cooldown-gated transition is evaluated.  Hosts pick the source:
//!
//! | Type          | Use                                                     |
//! |---------------|---------------------------------------------------------|
//! | [`StepClock`] | fixed-step game or simulation loops (`advance()` per frame) |
//! | [`ManualClock`] | tests and replays that set the time explicitly        |
//! | [`SystemClock`] | real-time hosts with a variable frame rate            |
//!
//! `StepClock` and `ManualClock` are cheap shared handles: clone one, hand a
//! copy to the graph, and keep the other to drive time from the host.
//! Step counting is integer-exact, so a `StepClock` never drifts no matter
//! how many frames have elapsed.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

/// A source of "current time" in seconds.
pub trait Clock {
    /// Seconds elapsed since an arbitrary, fixed origin.  Must never decrease.
    fn now(&self) -> f64;
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    #[inline]
    fn now(&self) -> f64 {
        (**self).now()
    }
}

// ── Step ──────────────────────────────────────────────────────────────────────

/// An absolute host step counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step(pub u64);

impl Step {
    pub const ZERO: Step = Step(0);

    /// Return the step `n` after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Step {
        Step(self.0 + n)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// ── StepClock ─────────────────────────────────────────────────────────────────

/// Fixed-step clock: `now = step * step_secs`.
///
/// Clones share the same step counter.
#[derive(Clone, Debug)]
pub struct StepClock {
    step_secs: f64,
    current:   Rc<Cell<Step>>,
}

impl StepClock {
    /// Create a clock at step 0 where one step lasts `step_secs` seconds.
    pub fn new(step_secs: f64) -> Self {
        Self {
            step_secs,
            current: Rc::new(Cell::new(Step::ZERO)),
        }
    }

    /// Advance by one step.
    #[inline]
    pub fn advance(&self) {
        self.current.set(self.current.get().offset(1));
    }

    /// Advance by `n` steps.
    #[inline]
    pub fn advance_by(&self, n: u64) {
        self.current.set(self.current.get().offset(n));
    }

    #[inline]
    pub fn current_step(&self) -> Step {
        self.current.get()
    }

    #[inline]
    pub fn step_secs(&self) -> f64 {
        self.step_secs
    }

    /// How many steps span `secs` seconds? (rounds up)
    pub fn steps_for_secs(&self, secs: f64) -> u64 {
        if self.step_secs <= 0.0 {
            return 0;
        }
        (secs / self.step_secs).ceil().max(0.0) as u64
    }
}

impl Clock for StepClock {
    #[inline]
    fn now(&self) -> f64 {
        self.current.get().0 as f64 * self.step_secs
    }
}

impl fmt::Display for StepClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.3}s)", self.current_step(), self.now())
    }
}

// ── ManualClock ───────────────────────────────────────────────────────────────

/// A clock whose time is set explicitly.  Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Rc<Cell<f64>>);

impl ManualClock {
    pub fn new(start_secs: f64) -> Self {
        ManualClock(Rc::new(Cell::new(start_secs)))
    }

    /// Jump to `secs`.  Moving backwards is the caller's responsibility.
    #[inline]
    pub fn set(&self, secs: f64) {
        self.0.set(secs);
    }

    #[inline]
    pub fn advance(&self, secs: f64) {
        self.0.set(self.0.get() + secs);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> f64 {
        self.0.get()
    }
}

// ── SystemClock ───────────────────────────────────────────────────────────────

/// Monotonic wall-clock time measured from construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}
