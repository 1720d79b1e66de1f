//! Builder for constructing a [`BehaviourCore`].

use eliot_core::{
    Clock, GraphConfig, GraphRng, NodeId, RandomSource, ResponseCurve, SystemClock, TransitionId,
};

use crate::graph::LabelIndex;
use crate::node::UtilityBranch;
use crate::{
    BehaviourCore, Callback, GraphError, GraphObserver, GraphResult, Node, NodeDef, NodeKind,
    Port, ResumeQueue, TracingObserver, Transition, TransitionDef,
};

/// Builder for [`BehaviourCore<C>`].
///
/// The Entry node exists from the start ([`entry`](Self::entry)); add the
/// rest with [`add`](Self::add) and wire them with [`connect`](Self::connect).
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default                               |
/// |----------------------|---------------------------------------|
/// | `.config(c)`         | `GraphConfig::default()`              |
/// | `.clock(c)`          | `SystemClock::new()`                  |
/// | `.rng(r)`            | `GraphRng::new(config.seed)`          |
/// | `.observer(o)`       | `TracingObserver`                     |
/// | `.on_reset(f)`       | none                                  |
///
/// # Example
///
/// ```rust,ignore
/// let mut b = GraphBuilder::new().config(config).clock(clock.clone());
/// let entry = b.entry();
/// let seen = b.add(NodeDef::condition("enemy seen", Callback::no_args(World::sees_enemy)))?;
/// let fire = b.add(NodeDef::action("fire", Callback::no_args(World::fire)))?;
/// b.link(entry, seen)?;
/// b.connect(seen, Port::If, fire, TransitionDef::new().cooldown(0.5, 1.0))?;
/// let mut graph = b.build()?;
/// graph.tick(&mut world);
/// ```
pub struct GraphBuilder<C> {
    nodes:       Vec<Node<C>>,
    transitions: Vec<Transition<C>>,
    config:      GraphConfig,
    clock:       Option<Box<dyn Clock>>,
    rng:         Option<Box<dyn RandomSource>>,
    observer:    Option<Box<dyn GraphObserver>>,
    on_reset:    Option<Box<dyn FnMut()>>,
}

impl<C> Default for GraphBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> GraphBuilder<C> {
    /// Create a builder holding only the Entry node.
    pub fn new() -> Self {
        Self {
            nodes:       vec![Node::entry()],
            transitions: Vec::new(),
            config:      GraphConfig::default(),
            clock:       None,
            rng:         None,
            observer:    None,
            on_reset:    None,
        }
    }

    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Replace the seeded default random source.
    pub fn rng(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn observer(mut self, observer: impl GraphObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Hook fired by [`BehaviourCore::reset`].
    pub fn on_reset(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_reset = Some(Box::new(hook));
        self
    }

    // ── Authoring ─────────────────────────────────────────────────────────

    /// The graph's Entry node.
    pub fn entry(&self) -> NodeId {
        NodeId(0)
    }

    /// Add a node and return its id.  Fails if the definition used an
    /// option its kind does not support.
    pub fn add(&mut self, def: NodeDef<C>) -> GraphResult<NodeId> {
        if let Some(option) = def.mismatch {
            return Err(GraphError::OptionMismatch {
                label: def.label,
                kind: def.behaviour.kind(),
                option,
            });
        }
        let id = NodeId::try_from(self.nodes.len()).map_err(|_| GraphError::Capacity("nodes"))?;
        self.nodes.push(def.into_node());
        Ok(id)
    }

    /// Append a scored branch to a Utility node; returns its port.
    pub fn add_branch(
        &mut self,
        node:   NodeId,
        scorer: Callback<C, f32>,
        curve:  ResponseCurve,
    ) -> GraphResult<Port> {
        let kind = self.node_ref(node)?.kind();
        let branches = self.nodes[node.index()]
            .branches_mut()
            .ok_or(GraphError::PortMismatch { node, kind, port: Port::Branch(0) })?;
        branches.push(UtilityBranch::new(scorer, curve));
        Ok(Port::Branch(branches.len() - 1))
    }

    /// Set a node's pre-tick hook (the only way to hook the Entry node).
    pub fn pre_tick(&mut self, node: NodeId, hook: impl Fn(&mut C) + 'static) -> GraphResult<()> {
        self.node_ref(node)?;
        self.nodes[node.index()].pre_tick = Some(Box::new(hook));
        Ok(())
    }

    pub fn post_tick(&mut self, node: NodeId, hook: impl Fn(&mut C) + 'static) -> GraphResult<()> {
        self.node_ref(node)?;
        self.nodes[node.index()].post_tick = Some(Box::new(hook));
        Ok(())
    }

    /// Wire `from --port--> to`.  Transitions on one port are evaluated in
    /// the order they were connected.
    pub fn connect(
        &mut self,
        from: NodeId,
        port: Port,
        to:   NodeId,
        def:  TransitionDef<C>,
    ) -> GraphResult<TransitionId> {
        self.node_ref(to)?;
        let kind = self.node_ref(from)?.kind();
        def.probability.validate_percent()?;
        def.cooldown.validate_duration()?;

        let id = TransitionId::try_from(self.transitions.len())
            .map_err(|_| GraphError::Capacity("transitions"))?;
        let source = &mut self.nodes[from.index()];
        source
            .port_mut(port)
            .ok_or(GraphError::PortMismatch { node: from, kind, port })?
            .push(id);
        source.outgoing.push(id);
        self.transitions.push(Transition::from_def(from, to, def));
        Ok(id)
    }

    /// Wire `from --Out--> to` with an ungated transition.
    pub fn link(&mut self, from: NodeId, to: NodeId) -> GraphResult<TransitionId> {
        self.connect(from, Port::Out, to, TransitionDef::new())
    }

    /// Validate and produce the runnable graph, with Entry active.
    pub fn build(self) -> GraphResult<BehaviourCore<C>> {
        self.config.validate()?;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.kind() == NodeKind::Utility && node.branch_count() == 0 {
                return Err(GraphError::EmptyUtility {
                    node:  NodeId(i as u32),
                    label: node.label().to_string(),
                });
            }
        }

        let mut node_index = LabelIndex::<NodeId>::default();
        for (i, node) in self.nodes.iter().enumerate() {
            node_index.entry(node.label().to_string()).or_default().push(NodeId(i as u32));
        }
        let mut transition_index = LabelIndex::<TransitionId>::default();
        for (i, tr) in self.transitions.iter().enumerate() {
            if let Some(label) = tr.label() {
                transition_index.entry(label.to_string()).or_default().push(TransitionId(i as u32));
            }
        }

        let entry = self.entry();
        let rng: Box<dyn RandomSource> = match self.rng {
            Some(rng) => rng,
            None => Box::new(GraphRng::new(self.config.seed)),
        };
        let clock: Box<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Box::new(SystemClock::new()),
        };
        let observer: Box<dyn GraphObserver> = match self.observer {
            Some(observer) => observer,
            None => Box::new(TracingObserver),
        };
        Ok(BehaviourCore {
            nodes: self.nodes,
            transitions: self.transitions,
            entry,
            active: entry,
            node_index,
            transition_index,
            clock,
            rng,
            observer,
            on_reset: self.on_reset,
            resume: ResumeQueue::new(),
            config: self.config,
            depth: 0,
            visited_nodes: Vec::new(),
            visited_edges: Vec::new(),
        })
    }

    fn node_ref(&self, id: NodeId) -> GraphResult<&Node<C>> {
        self.nodes.get(id.index()).ok_or(GraphError::UnknownNode(id))
    }
}
