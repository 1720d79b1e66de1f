//! The `BehaviourCore` driver and the per-node tick semantics.

use eliot_core::{Clock, GraphConfig, NodeId, RandomSource, TransitionId};

use crate::{
    CallbackError, CallbackResult, ComponentRef, GraphError, GraphObserver, GraphResult, Node,
    NodeKind, Port, ResumeQueue, Status, Transition,
};

#[cfg(feature = "fx-hash")]
pub(crate) type LabelIndex<T> = rustc_hash::FxHashMap<String, Vec<T>>;
#[cfg(not(feature = "fx-hash"))]
pub(crate) type LabelIndex<T> = std::collections::HashMap<String, Vec<T>>;

/// Owns a behaviour graph and drives it one tick at a time.
///
/// `BehaviourCore<C>` holds every node and transition in flat arenas and
/// walks the graph depth-first from the *active component* on each
/// [`tick`](Self::tick):
///
/// 1. **Resume**: scheduled hand-offs whose time has come take control.
/// 2. **Walk**: the active component runs its own logic, then ticks its
///    outgoing transitions, each of which may tick its end node, and so on.
/// 3. **Boundary**: every single-iteration flag raised during the walk is
///    cleared so the next tick may revisit the same path, including nodes
///    visited after control moved elsewhere mid-walk.
///
/// `C` is the host context handed to every callback and hook.
///
/// Create via [`GraphBuilder`][crate::GraphBuilder].
pub struct BehaviourCore<C> {
    pub(crate) nodes:            Vec<Node<C>>,
    pub(crate) transitions:      Vec<Transition<C>>,
    pub(crate) entry:            NodeId,
    pub(crate) active:           NodeId,
    pub(crate) node_index:       LabelIndex<NodeId>,
    pub(crate) transition_index: LabelIndex<TransitionId>,
    pub(crate) clock:            Box<dyn Clock>,
    pub(crate) rng:              Box<dyn RandomSource>,
    pub(crate) observer:         Box<dyn GraphObserver>,
    pub(crate) on_reset:         Option<Box<dyn FnMut()>>,
    pub(crate) resume:           ResumeQueue,
    pub(crate) config:           GraphConfig,
    /// Nesting of node ticks in the walk currently in progress.
    pub(crate) depth:            usize,
    /// Elements whose single-iteration flag was raised this tick.
    pub(crate) visited_nodes:    Vec<NodeId>,
    pub(crate) visited_edges:    Vec<TransitionId>,
}

impl<C> BehaviourCore<C> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run one tick starting at the active component.
    ///
    /// Callback failures never escape: they demote the failing component's
    /// [`Status`] and are reported to the observer.
    pub fn tick(&mut self, ctx: &mut C) {
        // A walk that unwound out of a panicking host callback never reached
        // its boundary sweep; drop whatever flags it left behind.
        self.end_iteration();

        let now = self.clock.now();
        for node in self.resume.drain_due(now) {
            self.switch_active(node);
        }

        let active = self.active;
        self.observer.on_tick_start(active);
        self.depth = 0;
        self.tick_node(active, ctx);

        self.end_iteration();
        self.observer.on_tick_end(self.active);
    }

    /// Hand control back to Entry and fire the reset hook.
    pub fn reset(&mut self) {
        let entry = self.entry;
        self.switch_active(entry);
        if let Some(hook) = self.on_reset.as_mut() {
            hook();
        }
        self.observer.on_reset(entry);
    }

    /// Make `node` the active component, relaxing the previous one first.
    /// No-op if `node` is already active.
    pub fn set_active_component(&mut self, node: NodeId) -> GraphResult<()> {
        self.check_node(node)?;
        self.switch_active(node);
        Ok(())
    }

    /// Schedule `node` to take control at the first tick where the clock
    /// reads `at` or later.
    pub fn resume_at(&mut self, node: NodeId, at: f64) -> GraphResult<()> {
        self.check_node(node)?;
        if !at.is_finite() {
            return Err(GraphError::InvalidResumeTime(at));
        }
        self.resume.push(at, node);
        Ok(())
    }

    /// Drop every scheduled hand-off to `node`.
    pub fn cancel_resumes(&mut self, node: NodeId) -> usize {
        self.resume.cancel(node)
    }

    pub fn pending_resumes(&self) -> &ResumeQueue {
        &self.resume
    }

    /// Clear a node's cross-tick `active` flag and cascade along its active
    /// outgoing transitions.  No-op if the node is already inactive.
    pub fn relax(&mut self, node: NodeId) -> GraphResult<()> {
        self.check_node(node)?;
        self.relax_node(node);
        Ok(())
    }

    /// Like [`relax`](Self::relax) for the per-tick re-entry flag.
    pub fn relax_single_iteration(&mut self, node: NodeId) -> GraphResult<()> {
        self.check_node(node)?;
        self.relax_node_single_iteration(node);
        Ok(())
    }

    pub fn relax_transition(&mut self, transition: TransitionId) -> GraphResult<()> {
        self.check_transition(transition)?;
        self.relax_edge(transition);
        Ok(())
    }

    pub fn relax_transition_single_iteration(&mut self, transition: TransitionId) -> GraphResult<()> {
        self.check_transition(transition)?;
        self.relax_edge_single_iteration(transition);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn active_component(&self) -> NodeId {
        self.active
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Current time as seen by transition cooldowns.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<C>> {
        self.nodes.get(id.index())
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition<C>> {
        self.transitions.get(id.index())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// First node labelled `label`, in authoring order.
    pub fn get_node(&self, label: &str) -> Option<NodeId> {
        self.get_nodes(label).first().copied()
    }

    /// Every node labelled `label`; labels need not be unique.
    pub fn get_nodes(&self, label: &str) -> &[NodeId] {
        self.node_index.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_transition(&self, label: &str) -> Option<TransitionId> {
        self.get_transitions(label).first().copied()
    }

    pub fn get_transitions(&self, label: &str) -> &[TransitionId] {
        self.transition_index.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    // ── Control switching ─────────────────────────────────────────────────

    fn switch_active(&mut self, node: NodeId) {
        let previous = self.active;
        if previous == node {
            return;
        }
        self.relax_node_single_iteration(previous);
        self.relax_node(previous);
        self.active = node;
        self.observer.on_active_changed(previous, node);
    }

    /// Take the active-component slot for `node` mid-walk.  Switching relaxes
    /// the old path, which may include `node` itself, so it is marked again.
    fn claim_control(&mut self, node: NodeId) {
        self.switch_active(node);
        self.mark(node);
    }

    // ── Node ticks ────────────────────────────────────────────────────────

    fn tick_node(&mut self, id: NodeId, ctx: &mut C) {
        let limit = self.config.max_tick_depth;
        if self.depth >= limit {
            self.observer.on_depth_exceeded(id, limit);
            return;
        }
        self.depth += 1;
        match self.nodes[id.index()].kind() {
            NodeKind::Entry => self.tick_entry(id, ctx),
            NodeKind::Action => self.tick_action(id, ctx),
            NodeKind::Condition => self.tick_condition(id, ctx),
            NodeKind::Loop => self.tick_loop(id, ctx),
            NodeKind::Utility => self.tick_utility(id, ctx),
        }
        self.depth -= 1;
    }

    fn tick_entry(&mut self, id: NodeId, ctx: &mut C) {
        self.run_pre_tick(id, ctx);
        self.mark(id);
        self.fan_out(id, Port::Out, ctx);
        self.run_post_tick(id, ctx);
    }

    fn tick_action(&mut self, id: NodeId, ctx: &mut C) {
        if !self.enter(id, ctx) {
            return;
        }
        self.begin_evaluation(id);
        let result = self.nodes[id.index()].invoke_action(ctx);
        self.settle(ComponentRef::Node(id), result);
        self.fan_out(id, Port::Out, ctx);
        self.leave(id, ctx);
    }

    fn tick_condition(&mut self, id: NodeId, ctx: &mut C) {
        if !self.enter(id, ctx) {
            return;
        }
        self.begin_evaluation(id);
        let result = self.nodes[id.index()].invoke_guard(ctx);
        let verdict = self.settle(ComponentRef::Node(id), result).unwrap_or(false);
        let (taken, skipped) = if verdict { (Port::If, Port::Else) } else { (Port::Else, Port::If) };
        self.relax_port(id, skipped);
        self.fan_out(id, taken, ctx);
        self.leave(id, ctx);
    }

    fn tick_loop(&mut self, id: NodeId, ctx: &mut C) {
        if !self.enter(id, ctx) {
            return;
        }
        self.begin_evaluation(id);
        let result = self.nodes[id.index()].invoke_guard(ctx);
        let holds = self.settle(ComponentRef::Node(id), result).unwrap_or(false);
        if holds {
            self.claim_control(id);
            self.relax_port(id, Port::End);
            self.fan_out(id, Port::While, ctx);
        } else {
            let entry = self.entry;
            self.switch_active(entry);
            self.relax_port(id, Port::While);
            self.fan_out(id, Port::End, ctx);
        }
        self.leave(id, ctx);
    }

    fn tick_utility(&mut self, id: NodeId, ctx: &mut C) {
        if !self.enter(id, ctx) {
            return;
        }
        self.begin_evaluation(id);
        let branches = self.nodes[id.index()].branch_count();
        let mut best: Option<(usize, f32)> = None;
        for k in 0..branches {
            let Some(result) = self.nodes[id.index()].score_branch(k, ctx) else {
                continue;
            };
            let Some(score) = self.settle(ComponentRef::Node(id), result) else {
                continue;
            };
            if score.is_nan() {
                continue;
            }
            // Strictly greater: ties keep the earliest branch.
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((k, score));
            }
        }
        let winner = best.map(|(k, _)| k);
        for k in 0..branches {
            if Some(k) != winner {
                self.relax_port(id, Port::Branch(k));
            }
        }
        if let Some(k) = winner {
            self.fan_out(id, Port::Branch(k), ctx);
        }
        self.leave(id, ctx);
    }

    /// Shared prologue of every callback-carrying node.  Returns `false`
    /// when the node was already visited this tick and is not the active
    /// component, which is what stops cycles from recursing forever.
    fn enter(&mut self, id: NodeId, ctx: &mut C) -> bool {
        let is_active_component = self.active == id;
        if !is_active_component && self.nodes[id.index()].single_iteration_active {
            return false;
        }
        self.mark(id);
        self.run_pre_tick(id, ctx);
        if self.nodes[id.index()].capture_control {
            self.claim_control(id);
        }
        true
    }

    /// Shared epilogue: the active component frees itself for the next tick.
    fn leave(&mut self, id: NodeId, ctx: &mut C) {
        if self.active == id {
            self.relax_node_single_iteration(id);
        }
        self.run_post_tick(id, ctx);
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Tick every transition on `port` in order until one terminates the
    /// group.  The wiring is immutable while ticking, so indexing by
    /// position is stable.
    fn fan_out(&mut self, id: NodeId, port: Port, ctx: &mut C) {
        let mut k = 0;
        while let Some(t) = self.nodes[id.index()].transitions(port).get(k).copied() {
            if !self.tick_transition(t, ctx) {
                break;
            }
            k += 1;
        }
    }

    /// Returns `true` when sibling transitions should still be evaluated.
    fn tick_transition(&mut self, t: TransitionId, ctx: &mut C) -> bool {
        let (start, capture) = {
            let tr = &self.transitions[t.index()];
            (tr.start(), tr.captures_control())
        };
        if capture {
            self.switch_active(start);
        }

        let now = self.clock.now();
        let tr = &mut self.transitions[t.index()];
        if !tr.roll_gates(now, &mut *self.rng) {
            return true;
        }
        tr.active = true;
        tr.single_iteration_active = true;
        self.visited_edges.push(t);

        let passes = match tr.evaluate_guard(ctx) {
            None => true,
            Some(result) => {
                tr.status = Status::Normal;
                self.settle(ComponentRef::Transition(t), result).unwrap_or(false)
            }
        };
        if !passes {
            return true;
        }

        let (end, terminate) = {
            let tr = &self.transitions[t.index()];
            (tr.end(), tr.terminates_group())
        };
        self.tick_node(end, ctx);
        !terminate
    }

    // ── Relaxation ────────────────────────────────────────────────────────

    /// Fully relax every transition on `port` (single-iteration, then full).
    fn relax_port(&mut self, id: NodeId, port: Port) {
        let mut k = 0;
        while let Some(t) = self.nodes[id.index()].transitions(port).get(k).copied() {
            self.relax_edge_single_iteration(t);
            self.relax_edge(t);
            k += 1;
        }
    }

    fn relax_node(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        if !node.active {
            return;
        }
        node.active = false;
        let mut k = 0;
        while let Some(t) = self.nodes[id.index()].outgoing.get(k).copied() {
            self.relax_edge(t);
            k += 1;
        }
    }

    fn relax_node_single_iteration(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        if !node.single_iteration_active {
            return;
        }
        node.single_iteration_active = false;
        let mut k = 0;
        while let Some(t) = self.nodes[id.index()].outgoing.get(k).copied() {
            self.relax_edge_single_iteration(t);
            k += 1;
        }
    }

    fn relax_edge(&mut self, t: TransitionId) {
        let tr = &mut self.transitions[t.index()];
        if !tr.active {
            return;
        }
        tr.active = false;
        let end = tr.end();
        self.relax_node(end);
    }

    fn relax_edge_single_iteration(&mut self, t: TransitionId) {
        let tr = &mut self.transitions[t.index()];
        if !tr.single_iteration_active {
            return;
        }
        tr.single_iteration_active = false;
        let end = tr.end();
        self.relax_node_single_iteration(end);
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn mark(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        node.active = true;
        node.single_iteration_active = true;
        self.visited_nodes.push(id);
    }

    /// Tick boundary: drop every per-tick re-entry flag raised by the walk.
    fn end_iteration(&mut self) {
        for id in self.visited_nodes.drain(..) {
            self.nodes[id.index()].single_iteration_active = false;
        }
        for t in self.visited_edges.drain(..) {
            self.transitions[t.index()].single_iteration_active = false;
        }
    }

    fn begin_evaluation(&mut self, id: NodeId) {
        self.nodes[id.index()].status = Status::Normal;
    }

    fn run_pre_tick(&self, id: NodeId, ctx: &mut C) {
        if let Some(hook) = &self.nodes[id.index()].pre_tick {
            hook(ctx);
        }
    }

    fn run_post_tick(&self, id: NodeId, ctx: &mut C) {
        if let Some(hook) = &self.nodes[id.index()].post_tick {
            hook(ctx);
        }
    }

    /// Apply the fail-soft policy to a callback result: demote the
    /// component's status and report failures, pass values through.
    fn settle<T>(&mut self, component: ComponentRef, result: CallbackResult<T>) -> Option<T> {
        let error = match result {
            Ok(value) => return Some(value),
            Err(error) => error,
        };
        let status = match error {
            CallbackError::ComponentNotFound(_) => Status::Warning,
            CallbackError::Unexpected(_) => Status::Error,
        };
        let label = match component {
            ComponentRef::Node(id) => {
                let node = &mut self.nodes[id.index()];
                node.demote(status);
                node.label()
            }
            ComponentRef::Transition(id) => {
                let tr = &mut self.transitions[id.index()];
                tr.status = tr.status.max(status);
                tr.label().unwrap_or("")
            }
        };
        self.observer.on_callback_failed(component, label, &error);
        None
    }

    fn check_node(&self, id: NodeId) -> GraphResult<()> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(id))
        }
    }

    fn check_transition(&self, id: TransitionId) -> GraphResult<()> {
        if id.index() < self.transitions.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownTransition(id))
        }
    }
}
