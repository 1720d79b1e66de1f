//! Gated, optionally guarded edges between nodes.
//!
//! # Gates
//!
//! A transition is *eligible* on a tick when both gates pass:
//!
//! | Gate        | Skipped when          | Passes when                                       |
//! |-------------|-----------------------|---------------------------------------------------|
//! | cooldown    | window is `[0, 0]`    | never fired, or `now - last_fire >= sample`       |
//! | probability | window is `[100,100]` | `draw(0,100) <= threshold`, `threshold = draw(min,max)` |
//!
//! The cooldown sample is redrawn exactly once each time the transition
//! fires, never per tick.

use eliot_core::{NodeId, RandomSource, Window, true_with_probability};

use crate::{Callback, Status};

/// A directed edge `start → end`.
pub struct Transition<C> {
    label:           Option<String>,
    start:           NodeId,
    end:             NodeId,
    probability:     Window,
    cooldown:        Window,
    last_fire:       Option<f64>,
    cooldown_sample: f32,
    reverse:         bool,
    terminate_group: bool,
    capture_control: bool,
    guard:           Option<Callback<C, bool>>,
    pub(crate) active:                  bool,
    pub(crate) single_iteration_active: bool,
    pub(crate) status:                  Status,
}

impl<C> Transition<C> {
    pub(crate) fn from_def(start: NodeId, end: NodeId, def: TransitionDef<C>) -> Self {
        Self {
            label: def.label,
            start,
            end,
            probability: def.probability,
            cooldown: def.cooldown,
            last_fire: None,
            cooldown_sample: 0.0,
            reverse: def.reverse,
            terminate_group: def.terminate_group,
            capture_control: def.capture_control,
            guard: def.guard,
            active: false,
            single_iteration_active: false,
            status: Status::Normal,
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    pub fn probability(&self) -> Window {
        self.probability
    }

    pub fn cooldown(&self) -> Window {
        self.cooldown
    }

    /// Time of the last firing, if any.
    pub fn last_fire(&self) -> Option<f64> {
        self.last_fire
    }

    /// Cooldown duration drawn at the last firing.
    pub fn cooldown_sample(&self) -> f32 {
        self.cooldown_sample
    }

    pub fn is_reversed(&self) -> bool {
        self.reverse
    }

    pub fn terminates_group(&self) -> bool {
        self.terminate_group
    }

    pub fn captures_control(&self) -> bool {
        self.capture_control
    }

    pub fn has_guard(&self) -> bool {
        self.guard.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_single_iteration_active(&self) -> bool {
        self.single_iteration_active
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the cooldown gate would let the transition through at `now`.
    /// Does not consume anything.
    pub fn cooldown_ready(&self, now: f64) -> bool {
        if self.cooldown.is_zero() {
            return true;
        }
        match self.last_fire {
            None => true,
            Some(last) => now - last >= f64::from(self.cooldown_sample),
        }
    }

    /// Evaluate the guard with `reverse` applied.  `None` when unguarded.
    pub(crate) fn evaluate_guard(&self, ctx: &mut C) -> Option<crate::CallbackResult<bool>> {
        let guard = self.guard.as_ref()?;
        Some(guard.invoke(ctx).map(|v| v != self.reverse))
    }

    /// Roll both gates for this tick.  On success the transition is
    /// considered fired: the cooldown is restarted from `now` with a fresh
    /// sample.
    pub(crate) fn roll_gates(&mut self, now: f64, rng: &mut dyn RandomSource) -> bool {
        if !self.cooldown_ready(now) {
            return false;
        }
        if !self.probability.is_always() {
            let threshold = self.probability.sample(rng);
            if !true_with_probability(rng, threshold) {
                return false;
            }
        }
        if !self.cooldown.is_zero() {
            self.cooldown_sample = self.cooldown.sample(rng);
            self.last_fire = Some(now);
        }
        true
    }
}

// ── TransitionDef ─────────────────────────────────────────────────────────────

/// Authoring description of a transition, consumed by
/// [`GraphBuilder::connect`][crate::GraphBuilder::connect].
///
/// The default never gates: probability `[100, 100]`, cooldown `[0, 0]`,
/// no guard, no flags.
pub struct TransitionDef<C> {
    pub(crate) label:           Option<String>,
    pub(crate) probability:     Window,
    pub(crate) cooldown:        Window,
    pub(crate) reverse:         bool,
    pub(crate) terminate_group: bool,
    pub(crate) capture_control: bool,
    pub(crate) guard:           Option<Callback<C, bool>>,
}

impl<C> Default for TransitionDef<C> {
    fn default() -> Self {
        Self {
            label:           None,
            probability:     Window::ALWAYS,
            cooldown:        Window::NO_COOLDOWN,
            reverse:         false,
            terminate_group: false,
            capture_control: false,
            guard:           None,
        }
    }
}

impl<C> TransitionDef<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Percent window, `0 <= min <= max <= 100`.
    pub fn probability(mut self, min: f32, max: f32) -> Self {
        self.probability = Window::new(min, max);
        self
    }

    /// Seconds window, `0 <= min <= max`.
    pub fn cooldown(mut self, min: f32, max: f32) -> Self {
        self.cooldown = Window::new(min, max);
        self
    }

    pub fn guard(mut self, guard: Callback<C, bool>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Negate the guard.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Stop evaluating sibling transitions after this one propagates.
    pub fn terminate_group(mut self, terminate: bool) -> Self {
        self.terminate_group = terminate;
        self
    }

    /// Hand control to the start node whenever this transition is ticked.
    pub fn capture_control(mut self, capture: bool) -> Self {
        self.capture_control = capture;
        self
    }
}
