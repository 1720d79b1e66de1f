//! Node types and their authoring definitions.

use eliot_core::{ResponseCurve, TransitionId};

use crate::{ActivationMode, Callback};

/// Host hook run before or after a node's own logic.
pub type Hook<C> = Box<dyn Fn(&mut C)>;

/// Diagnostic health of a component, ordered by severity.
///
/// Reflects the most severe callback failure of the component's latest
/// evaluation.  It is observable only; it never changes how the graph walks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    #[default]
    Normal,
    /// A callback reported a missing dependency.
    Warning,
    /// A callback failed unexpectedly.
    Error,
}

/// Node type tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Entry,
    Action,
    Condition,
    Loop,
    Utility,
}

/// A named outgoing transition list of a node.
///
/// | Kind        | Ports                 |
/// |-------------|-----------------------|
/// | `Entry`     | `Out`                 |
/// | `Action`    | `Out`                 |
/// | `Condition` | `If`, `Else`          |
/// | `Loop`      | `While`, `End`        |
/// | `Utility`   | `Branch(0..n)`        |
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Port {
    Out,
    If,
    Else,
    While,
    End,
    Branch(usize),
}

// ── Utility branches ──────────────────────────────────────────────────────────

/// One scored option of a Utility node.
pub(crate) struct UtilityBranch<C> {
    pub(crate) scorer:      Callback<C, f32>,
    pub(crate) curve:       ResponseCurve,
    pub(crate) transitions: Vec<TransitionId>,
}

impl<C> UtilityBranch<C> {
    pub(crate) fn new(scorer: Callback<C, f32>, curve: ResponseCurve) -> Self {
        Self { scorer, curve, transitions: Vec::new() }
    }
}

// ── Behaviour payload ─────────────────────────────────────────────────────────

pub(crate) enum Behaviour<C> {
    Entry {
        out: Vec<TransitionId>,
    },
    Action {
        callback: Callback<C, ()>,
        out:      Vec<TransitionId>,
    },
    Condition {
        callback:   Callback<C, bool>,
        reverse:    bool,
        when_true:  Vec<TransitionId>,
        when_false: Vec<TransitionId>,
    },
    Loop {
        callback: Callback<C, bool>,
        reverse:  bool,
        body:     Vec<TransitionId>,
        end:      Vec<TransitionId>,
    },
    Utility {
        branches: Vec<UtilityBranch<C>>,
    },
}

impl<C> Behaviour<C> {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Behaviour::Entry { .. } => NodeKind::Entry,
            Behaviour::Action { .. } => NodeKind::Action,
            Behaviour::Condition { .. } => NodeKind::Condition,
            Behaviour::Loop { .. } => NodeKind::Loop,
            Behaviour::Utility { .. } => NodeKind::Utility,
        }
    }

    fn port(&self, port: Port) -> Option<&Vec<TransitionId>> {
        match (self, port) {
            (Behaviour::Entry { out } | Behaviour::Action { out, .. }, Port::Out) => Some(out),
            (Behaviour::Condition { when_true, .. }, Port::If) => Some(when_true),
            (Behaviour::Condition { when_false, .. }, Port::Else) => Some(when_false),
            (Behaviour::Loop { body, .. }, Port::While) => Some(body),
            (Behaviour::Loop { end, .. }, Port::End) => Some(end),
            (Behaviour::Utility { branches }, Port::Branch(k)) => branches.get(k).map(|b| &b.transitions),
            _ => None,
        }
    }

    fn port_mut(&mut self, port: Port) -> Option<&mut Vec<TransitionId>> {
        match (self, port) {
            (Behaviour::Entry { out } | Behaviour::Action { out, .. }, Port::Out) => Some(out),
            (Behaviour::Condition { when_true, .. }, Port::If) => Some(when_true),
            (Behaviour::Condition { when_false, .. }, Port::Else) => Some(when_false),
            (Behaviour::Loop { body, .. }, Port::While) => Some(body),
            (Behaviour::Loop { end, .. }, Port::End) => Some(end),
            (Behaviour::Utility { branches }, Port::Branch(k)) => {
                branches.get_mut(k).map(|b| &mut b.transitions)
            }
            _ => None,
        }
    }
}

// ── Node ──────────────────────────────────────────────────────────────────────

/// A vertex of the behaviour graph.
///
/// Nodes are owned by the graph and addressed by [`NodeId`][eliot_core::NodeId];
/// hosts read them through [`BehaviourCore::node`][crate::BehaviourCore::node].
pub struct Node<C> {
    label: String,
    pub(crate) active:                  bool,
    pub(crate) single_iteration_active: bool,
    pub(crate) status:                  Status,
    pub(crate) capture_control:         bool,
    pub(crate) pre_tick:                Option<Hook<C>>,
    pub(crate) post_tick:               Option<Hook<C>>,
    pub(crate) behaviour:               Behaviour<C>,
    /// Every outgoing transition across all ports, in wiring order.
    pub(crate) outgoing:                Vec<TransitionId>,
}

impl<C> Node<C> {
    pub(crate) fn entry() -> Self {
        Self::with_behaviour("Entry".to_string(), Behaviour::Entry { out: Vec::new() })
    }

    fn with_behaviour(label: String, behaviour: Behaviour<C>) -> Self {
        Self {
            label,
            active: false,
            single_iteration_active: false,
            status: Status::Normal,
            capture_control: false,
            pre_tick: None,
            post_tick: None,
            behaviour,
            outgoing: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> NodeKind {
        self.behaviour.kind()
    }

    /// Active across ticks until relaxed.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Already visited during the current tick.
    pub fn is_single_iteration_active(&self) -> bool {
        self.single_iteration_active
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn captures_control(&self) -> bool {
        self.capture_control
    }

    /// `None` for Entry and Utility nodes, which have no single binding.
    pub fn activation_mode(&self) -> Option<ActivationMode> {
        match &self.behaviour {
            Behaviour::Action { callback, .. } => Some(callback.mode()),
            Behaviour::Condition { callback, .. } | Behaviour::Loop { callback, .. } => {
                Some(callback.mode())
            }
            Behaviour::Entry { .. } | Behaviour::Utility { .. } => None,
        }
    }

    /// Whether a Condition/Loop negates its guard.
    pub fn is_reversed(&self) -> bool {
        match &self.behaviour {
            Behaviour::Condition { reverse, .. } | Behaviour::Loop { reverse, .. } => *reverse,
            _ => false,
        }
    }

    /// Transitions wired to `port`; empty when the node has no such port.
    pub fn transitions(&self, port: Port) -> &[TransitionId] {
        self.behaviour.port(port).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn outgoing(&self) -> &[TransitionId] {
        &self.outgoing
    }

    /// Number of Utility branches; 0 for other kinds.
    pub fn branch_count(&self) -> usize {
        match &self.behaviour {
            Behaviour::Utility { branches } => branches.len(),
            _ => 0,
        }
    }

    pub(crate) fn port_mut(&mut self, port: Port) -> Option<&mut Vec<TransitionId>> {
        self.behaviour.port_mut(port)
    }

    pub(crate) fn branches_mut(&mut self) -> Option<&mut Vec<UtilityBranch<C>>> {
        match &mut self.behaviour {
            Behaviour::Utility { branches } => Some(branches),
            _ => None,
        }
    }

    /// Run the node's action callback.  No-op for non-Action nodes.
    pub(crate) fn invoke_action(&self, ctx: &mut C) -> crate::CallbackResult<()> {
        match &self.behaviour {
            Behaviour::Action { callback, .. } => callback.invoke(ctx),
            _ => Ok(()),
        }
    }

    /// Evaluate a Condition/Loop guard with `reverse` applied.
    pub(crate) fn invoke_guard(&self, ctx: &mut C) -> crate::CallbackResult<bool> {
        match &self.behaviour {
            Behaviour::Condition { callback, reverse, .. }
            | Behaviour::Loop { callback, reverse, .. } => {
                callback.invoke(ctx).map(|v| v != *reverse)
            }
            _ => Ok(false),
        }
    }

    /// Curved score of Utility branch `k`.  `None` if there is no such branch.
    pub(crate) fn score_branch(&self, k: usize, ctx: &mut C) -> Option<crate::CallbackResult<f32>> {
        let Behaviour::Utility { branches } = &self.behaviour else {
            return None;
        };
        let branch = branches.get(k)?;
        Some(branch.scorer.invoke(ctx).map(|raw| branch.curve.evaluate(raw)))
    }

    pub(crate) fn demote(&mut self, status: Status) {
        self.status = self.status.max(status);
    }
}

// ── NodeDef ───────────────────────────────────────────────────────────────────

/// Authoring description of a non-Entry node, consumed by
/// [`GraphBuilder::add`][crate::GraphBuilder::add].
///
/// ```rust,ignore
/// let shoot = builder.add(
///     NodeDef::action("shoot", Callback::no_args(|w: &mut World| w.fire()))
///         .capture_control(true)
///         .pre_tick(|w| w.aim()),
/// )?;
/// ```
pub struct NodeDef<C> {
    pub(crate) label:           String,
    pub(crate) capture_control: bool,
    pub(crate) pre_tick:        Option<Hook<C>>,
    pub(crate) post_tick:       Option<Hook<C>>,
    pub(crate) behaviour:       Behaviour<C>,
    /// First builder option that does not apply to this kind.
    pub(crate) mismatch:        Option<&'static str>,
}

impl<C> NodeDef<C> {
    fn new(label: impl Into<String>, behaviour: Behaviour<C>) -> Self {
        Self {
            label: label.into(),
            capture_control: false,
            pre_tick: None,
            post_tick: None,
            behaviour,
            mismatch: None,
        }
    }

    pub fn action(label: impl Into<String>, callback: Callback<C, ()>) -> Self {
        Self::new(label, Behaviour::Action { callback, out: Vec::new() })
    }

    pub fn condition(label: impl Into<String>, callback: Callback<C, bool>) -> Self {
        Self::new(
            label,
            Behaviour::Condition {
                callback,
                reverse: false,
                when_true: Vec::new(),
                when_false: Vec::new(),
            },
        )
    }

    /// A Loop: holds control while `callback` is true.
    pub fn repeat_while(label: impl Into<String>, callback: Callback<C, bool>) -> Self {
        Self::new(
            label,
            Behaviour::Loop {
                callback,
                reverse: false,
                body: Vec::new(),
                end: Vec::new(),
            },
        )
    }

    /// A Utility node with no branches yet; add them with [`branch`](Self::branch).
    pub fn utility(label: impl Into<String>) -> Self {
        Self::new(label, Behaviour::Utility { branches: Vec::new() })
    }

    /// Append a scored branch.  Only Utility nodes take branches;
    /// [`GraphBuilder::add`][crate::GraphBuilder::add] rejects any other kind.
    pub fn branch(mut self, scorer: Callback<C, f32>, curve: ResponseCurve) -> Self {
        match &mut self.behaviour {
            Behaviour::Utility { branches } => branches.push(UtilityBranch::new(scorer, curve)),
            _ => self.reject("branch"),
        }
        self
    }

    pub fn capture_control(mut self, capture: bool) -> Self {
        self.capture_control = capture;
        self
    }

    /// Negate the guard of a Condition or Loop.  Rejected at
    /// [`GraphBuilder::add`][crate::GraphBuilder::add] for other kinds.
    pub fn reverse(mut self, reverse: bool) -> Self {
        match &mut self.behaviour {
            Behaviour::Condition { reverse: r, .. } | Behaviour::Loop { reverse: r, .. } => {
                *r = reverse;
            }
            _ => self.reject("reverse"),
        }
        self
    }

    pub fn pre_tick(mut self, hook: impl Fn(&mut C) + 'static) -> Self {
        self.pre_tick = Some(Box::new(hook));
        self
    }

    pub fn post_tick(mut self, hook: impl Fn(&mut C) + 'static) -> Self {
        self.post_tick = Some(Box::new(hook));
        self
    }

    fn reject(&mut self, option: &'static str) {
        self.mismatch.get_or_insert(option);
    }

    pub(crate) fn into_node(self) -> Node<C> {
        let mut node = Node::with_behaviour(self.label, self.behaviour);
        node.capture_control = self.capture_control;
        node.pre_tick = self.pre_tick;
        node.post_tick = self.post_tick;
        node
    }
}
