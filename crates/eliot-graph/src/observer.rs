//! Graph observer trait, the logging sink for status changes and control
//! switches.

use eliot_core::{NodeId, TransitionId};

use crate::CallbackError;

/// The graph element a report is about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ComponentRef {
    Node(NodeId),
    Transition(TransitionId),
}

/// Callbacks invoked by [`BehaviourCore`][crate::BehaviourCore] at key
/// points of a tick.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: failure counter
///
/// ```rust,ignore
/// struct FailureCounter(usize);
///
/// impl GraphObserver for FailureCounter {
///     fn on_callback_failed(&mut self, _: ComponentRef, _: &str, _: &CallbackError) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait GraphObserver {
    /// Called before the active component is ticked.
    fn on_tick_start(&mut self, _active: NodeId) {}

    /// Called after the tick; `active` is the active component at that point.
    fn on_tick_end(&mut self, _active: NodeId) {}

    fn on_active_changed(&mut self, _from: NodeId, _to: NodeId) {}

    fn on_reset(&mut self, _entry: NodeId) {}

    /// A bound callback failed; the component's status has been demoted.
    fn on_callback_failed(
        &mut self,
        _component: ComponentRef,
        _label:     &str,
        _error:     &CallbackError,
    ) {
    }

    /// Descent into `node` was refused because the walk reached `limit`.
    fn on_depth_exceeded(&mut self, _node: NodeId, _limit: usize) {}
}

/// A [`GraphObserver`] that does nothing.
pub struct NoopObserver;

impl GraphObserver for NoopObserver {}

/// The default observer: forwards every report to `tracing`.
///
/// | Event                             | Level   |
/// |-----------------------------------|---------|
/// | `ComponentNotFound`               | `warn`  |
/// | other callback failures           | `error` |
/// | depth cap hit                     | `warn`  |
/// | active component change, reset    | `debug` |
/// | tick boundaries                   | `trace` |
#[derive(Default)]
pub struct TracingObserver;

impl GraphObserver for TracingObserver {
    fn on_tick_start(&mut self, active: NodeId) {
        tracing::trace!(%active, "tick start");
    }

    fn on_tick_end(&mut self, active: NodeId) {
        tracing::trace!(%active, "tick end");
    }

    fn on_active_changed(&mut self, from: NodeId, to: NodeId) {
        tracing::debug!(%from, %to, "active component changed");
    }

    fn on_reset(&mut self, entry: NodeId) {
        tracing::debug!(%entry, "graph reset");
    }

    fn on_callback_failed(&mut self, component: ComponentRef, label: &str, error: &CallbackError) {
        match error {
            CallbackError::ComponentNotFound(_) => {
                tracing::warn!(?component, label, %error, "callback dependency missing");
            }
            CallbackError::Unexpected(_) => {
                tracing::error!(?component, label, %error, "callback failed");
            }
        }
    }

    fn on_depth_exceeded(&mut self, node: NodeId, limit: usize) {
        tracing::warn!(%node, limit, "tick depth limit reached; descent stopped");
    }
}
