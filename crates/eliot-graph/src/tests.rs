//! Unit tests for eliot-graph.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use eliot_core::{GraphConfig, ManualClock, NodeId, RandomSource, ResponseCurve};

use crate::{
    BehaviourCore, Callback, CallbackError, ComponentRef, GraphBuilder, GraphObserver, NodeDef,
    NoopObserver, Port, Status, TransitionDef,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct World {
    hits:   Vec<&'static str>,
    flag:   bool,
    limit:  u32,
    ticks:  u32,
    scores: Vec<f32>,
    args:   Vec<String>,
}

impl World {
    fn count(&self, label: &str) -> usize {
        self.hits.iter().filter(|h| **h == label).count()
    }
}

/// Action that records its label every time it runs.
fn counter(label: &'static str) -> NodeDef<World> {
    NodeDef::action(
        label,
        Callback::no_args(move |w: &mut World| {
            w.hits.push(label);
            Ok(())
        }),
    )
}

fn failing(label: &'static str, error: CallbackError) -> NodeDef<World> {
    NodeDef::action(label, Callback::no_args(move |_w: &mut World| Err(error.clone())))
}

fn flag_guard() -> Callback<World, bool> {
    Callback::no_args(|w: &mut World| Ok(w.flag))
}

fn score(k: i32) -> Callback<World, f32> {
    Callback::with_int(|w: &mut World, k: i32| Ok(w.scores[k as usize]), k)
}

fn builder(clock: &ManualClock) -> GraphBuilder<World> {
    GraphBuilder::new().clock(clock.clone()).observer(NoopObserver)
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Failed(ComponentRef, CallbackError),
    Depth(NodeId, usize),
    Active(NodeId, NodeId),
    Reset,
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<Event>>>);

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }
}

impl GraphObserver for Recorder {
    fn on_active_changed(&mut self, from: NodeId, to: NodeId) {
        self.0.borrow_mut().push(Event::Active(from, to));
    }

    fn on_reset(&mut self, _entry: NodeId) {
        self.0.borrow_mut().push(Event::Reset);
    }

    fn on_callback_failed(&mut self, component: ComponentRef, _label: &str, error: &CallbackError) {
        self.0.borrow_mut().push(Event::Failed(component, error.clone()));
    }

    fn on_depth_exceeded(&mut self, node: NodeId, limit: usize) {
        self.0.borrow_mut().push(Event::Depth(node, limit));
    }
}

/// Replays fixed values (ignoring bounds) and counts draws; `lo` once empty.
struct Script {
    values: VecDeque<f32>,
    calls:  Rc<Cell<usize>>,
}

impl Script {
    fn new(values: &[f32]) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (Self { values: values.iter().copied().collect(), calls: calls.clone() }, calls)
    }
}

impl RandomSource for Script {
    fn range(&mut self, lo: f32, _hi: f32) -> f32 {
        self.calls.set(self.calls.get() + 1);
        self.values.pop_front().unwrap_or(lo)
    }
}

// ── Entry / Action ────────────────────────────────────────────────────────────

#[cfg(test)]
mod action_tests {
    use super::*;

    #[test]
    fn single_tick_invokes_action_once() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let a = b.add(counter("a")).unwrap();
        b.link(entry, a).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        graph.tick(&mut world);

        assert_eq!(world.count("a"), 1);
        let node = graph.node(a).unwrap();
        assert_eq!(node.status(), Status::Normal);
        assert!(node.is_active());
        assert!(!node.is_single_iteration_active());
        assert_eq!(graph.active_component(), entry);
    }

    #[test]
    fn action_reruns_every_tick() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let a = b.add(counter("a")).unwrap();
        b.link(entry, a).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        for _ in 0..3 {
            graph.tick(&mut world);
        }
        assert_eq!(world.count("a"), 3);
    }

    #[test]
    fn hooks_wrap_callback_and_children() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let a = b
            .add(
                counter("a")
                    .pre_tick(|w: &mut World| w.hits.push("pre"))
                    .post_tick(|w: &mut World| w.hits.push("post")),
            )
            .unwrap();
        let child = b.add(counter("child")).unwrap();
        b.link(entry, a).unwrap();
        b.link(a, child).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["pre", "a", "child", "post"]);
    }

    #[test]
    fn failing_action_does_not_stop_siblings() {
        let clock = ManualClock::new(0.0);
        let recorder = Recorder::default();
        let mut b = builder(&clock).observer(recorder.clone());
        let entry = b.entry();
        let broken = b.add(failing("broken", CallbackError::unexpected("boom"))).unwrap();
        let ok = b.add(counter("ok")).unwrap();
        b.link(entry, broken).unwrap();
        b.link(entry, ok).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        graph.tick(&mut world);

        assert_eq!(world.count("ok"), 1);
        assert_eq!(graph.node(broken).unwrap().status(), Status::Error);
        assert_eq!(graph.node(entry).unwrap().status(), Status::Normal);
        assert_eq!(
            recorder.events(),
            vec![Event::Failed(ComponentRef::Node(broken), CallbackError::unexpected("boom"))],
        );
    }

    #[test]
    fn missing_component_is_a_warning() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let a = b.add(failing("a", CallbackError::component_not_found("Rigidbody"))).unwrap();
        b.link(entry, a).unwrap();
        let mut graph = b.build().unwrap();

        graph.tick(&mut World::default());
        assert_eq!(graph.node(a).unwrap().status(), Status::Warning);
    }

    #[test]
    fn status_recovers_after_successful_call() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let a = b
            .add(NodeDef::action(
                "flaky",
                Callback::no_args(|w: &mut World| {
                    if w.flag { Ok(()) } else { Err(CallbackError::unexpected("not ready")) }
                }),
            ))
            .unwrap();
        b.link(entry, a).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        graph.tick(&mut world);
        assert_eq!(graph.node(a).unwrap().status(), Status::Error);

        world.flag = true;
        graph.tick(&mut world);
        assert_eq!(graph.node(a).unwrap().status(), Status::Normal);
    }

    #[test]
    fn cycle_runs_each_node_once_per_tick() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let a = b.add(counter("a")).unwrap();
        let c = b.add(counter("c")).unwrap();
        b.link(entry, a).unwrap();
        b.link(a, c).unwrap();
        b.link(c, a).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        graph.tick(&mut world);
        assert_eq!((world.count("a"), world.count("c")), (1, 1));
        graph.tick(&mut world);
        assert_eq!((world.count("a"), world.count("c")), (2, 2));
    }

    #[test]
    fn capture_control_resumes_at_action() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        b.pre_tick(entry, |w: &mut World| w.hits.push("entry")).unwrap();
        let a = b.add(counter("a").capture_control(true)).unwrap();
        let child = b.add(counter("child")).unwrap();
        b.link(entry, a).unwrap();
        b.link(a, child).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        graph.tick(&mut world);
        assert_eq!(graph.active_component(), a);
        graph.tick(&mut world);

        assert_eq!(world.count("entry"), 1);
        assert_eq!(world.count("a"), 2);
        assert_eq!(world.count("child"), 2);
    }

    #[test]
    fn depth_cap_stops_runaway_self_loop() {
        let clock = ManualClock::new(0.0);
        let recorder = Recorder::default();
        let mut b = builder(&clock)
            .observer(recorder.clone())
            .config(GraphConfig { seed: 0, max_tick_depth: 8 });
        let entry = b.entry();
        let a = b.add(counter("a").capture_control(true)).unwrap();
        b.link(entry, a).unwrap();
        b.link(a, a).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        graph.tick(&mut world);

        assert_eq!(world.count("a"), 7);
        let depth_events: Vec<_> = recorder
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Depth(..)))
            .collect();
        assert_eq!(depth_events, vec![Event::Depth(a, 8)]);
    }
}

// ── Condition ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod condition_tests {
    use super::*;

    fn branching(reverse: bool) -> (BehaviourCore<World>, eliot_core::TransitionId, eliot_core::TransitionId) {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let cond = b.add(NodeDef::condition("flag?", flag_guard()).reverse(reverse)).unwrap();
        let yes = b.add(counter("yes")).unwrap();
        let no = b.add(counter("no")).unwrap();
        b.link(entry, cond).unwrap();
        let t_if = b.connect(cond, Port::If, yes, TransitionDef::new()).unwrap();
        let t_else = b.connect(cond, Port::Else, no, TransitionDef::new()).unwrap();
        (b.build().unwrap(), t_if, t_else)
    }

    #[test]
    fn takes_exactly_one_branch() {
        let (mut graph, _, _) = branching(false);
        let mut world = World { flag: true, ..World::default() };
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["yes"]);

        world.flag = false;
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["yes", "no"]);
    }

    #[test]
    fn untaken_branch_is_fully_relaxed() {
        let (mut graph, t_if, t_else) = branching(false);
        let mut world = World { flag: true, ..World::default() };
        graph.tick(&mut world);
        assert!(graph.transition(t_if).unwrap().is_active());

        world.flag = false;
        graph.tick(&mut world);
        let untaken = graph.transition(t_if).unwrap();
        assert!(!untaken.is_active());
        assert!(!untaken.is_single_iteration_active());
        assert!(!graph.node(untaken.end()).unwrap().is_active());
        assert!(graph.transition(t_else).unwrap().is_active());

        world.flag = true;
        graph.tick(&mut world);
        let untaken = graph.transition(t_else).unwrap();
        assert!(!untaken.is_active());
        assert!(!untaken.is_single_iteration_active());
    }

    #[test]
    fn reverse_negates_guard() {
        let (mut graph, _, _) = branching(true);
        let mut world = World { flag: true, ..World::default() };
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["no"]);
    }

    #[test]
    fn failed_guard_takes_else_branch() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let cond = b
            .add(
                NodeDef::condition(
                    "broken?",
                    Callback::no_args(|_w: &mut World| Err(CallbackError::unexpected("nan"))),
                )
                .reverse(true),
            )
            .unwrap();
        let yes = b.add(counter("yes")).unwrap();
        let no = b.add(counter("no")).unwrap();
        b.link(entry, cond).unwrap();
        b.connect(cond, Port::If, yes, TransitionDef::new()).unwrap();
        b.connect(cond, Port::Else, no, TransitionDef::new()).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["no"]);
        assert_eq!(graph.node(cond).unwrap().status(), Status::Error);
    }
}

// ── Loop ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loop_tests {
    use super::*;

    #[test]
    fn loop_holds_control_while_guard_is_true() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let lp = b
            .add(NodeDef::repeat_while(
                "under limit",
                Callback::no_args(|w: &mut World| Ok(w.ticks < w.limit)),
            ))
            .unwrap();
        let work = b
            .add(NodeDef::action(
                "work",
                Callback::no_args(|w: &mut World| {
                    w.ticks += 1;
                    w.hits.push("work");
                    Ok(())
                }),
            ))
            .unwrap();
        let done = b.add(counter("done")).unwrap();
        b.link(entry, lp).unwrap();
        b.connect(lp, Port::While, work, TransitionDef::new()).unwrap();
        let t_end = b.connect(lp, Port::End, done, TransitionDef::new()).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World { limit: 3, ..World::default() };
        for expected in 1..=3 {
            graph.tick(&mut world);
            assert_eq!(graph.active_component(), lp);
            assert_eq!(world.count("work"), expected);
            assert!(!graph.transition(t_end).unwrap().is_active());
        }

        graph.tick(&mut world);
        assert_eq!(graph.active_component(), entry);
        assert_eq!(world.count("work"), 3);
        assert_eq!(world.count("done"), 1);
    }

    #[test]
    fn false_loop_from_entry_falls_through() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let lp = b.add(NodeDef::repeat_while("flag", flag_guard())).unwrap();
        let body = b.add(counter("body")).unwrap();
        let done = b.add(counter("done")).unwrap();
        b.link(entry, lp).unwrap();
        b.connect(lp, Port::While, body, TransitionDef::new()).unwrap();
        b.connect(lp, Port::End, done, TransitionDef::new()).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        graph.tick(&mut world);
        graph.tick(&mut world);
        assert_eq!(graph.active_component(), entry);
        assert_eq!(world.count("done"), 2);
        assert_eq!(world.count("body"), 0);
    }
}

// ── Utility ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod utility_tests {
    use super::*;
    use crate::GraphError;

    fn three_way(curve: ResponseCurve) -> (BehaviourCore<World>, Vec<eliot_core::TransitionId>, NodeId) {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let u = b
            .add(
                NodeDef::utility("pick")
                    .branch(score(0), curve.clone())
                    .branch(score(1), curve.clone())
                    .branch(score(2), curve),
            )
            .unwrap();
        b.link(entry, u).unwrap();
        let mut edges = Vec::new();
        for (k, label) in ["b0", "b1", "b2"].into_iter().enumerate() {
            let target = b.add(counter(label)).unwrap();
            edges.push(b.connect(u, Port::Branch(k), target, TransitionDef::new()).unwrap());
        }
        (b.build().unwrap(), edges, u)
    }

    #[test]
    fn highest_score_wins_and_others_relax() {
        let (mut graph, edges, _) = three_way(ResponseCurve::Identity);
        let mut world = World { scores: vec![5.0, 1.0, 1.0], ..World::default() };
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["b0"]);
        assert!(graph.transition(edges[0]).unwrap().is_active());

        world.scores = vec![1.0, 3.0, 2.0];
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["b0", "b1"]);
        assert!(!graph.transition(edges[0]).unwrap().is_active());
        assert!(graph.transition(edges[1]).unwrap().is_active());
        assert!(!graph.transition(edges[2]).unwrap().is_active());
    }

    #[test]
    fn ties_keep_earliest_branch() {
        let (mut graph, _, _) = three_way(ResponseCurve::Identity);
        let mut world = World { scores: vec![1.0, 2.0, 2.0], ..World::default() };
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["b1"]);
    }

    #[test]
    fn curve_is_applied_before_comparison() {
        let (mut graph, _, _) = three_way(ResponseCurve::Linear { slope: -1.0, intercept: 0.0 });
        let mut world = World { scores: vec![1.0, 3.0, 2.0], ..World::default() };
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["b0"]);
    }

    #[test]
    fn failed_scorer_cannot_win() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let u = b
            .add(
                NodeDef::utility("pick")
                    .branch(score(0), ResponseCurve::Identity)
                    .branch(
                        Callback::no_args(|_w: &mut World| Err(CallbackError::component_not_found("sensor"))),
                        ResponseCurve::Identity,
                    ),
            )
            .unwrap();
        let extra = b.add_branch(u, score(2), ResponseCurve::Identity).unwrap();
        assert_eq!(extra, Port::Branch(2));
        b.link(entry, u).unwrap();
        for (k, label) in ["b0", "b1", "b2"].into_iter().enumerate() {
            let target = b.add(counter(label)).unwrap();
            b.connect(u, Port::Branch(k), target, TransitionDef::new()).unwrap();
        }
        let mut graph = b.build().unwrap();

        let mut world = World { scores: vec![1.0, 0.0, 2.0], ..World::default() };
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["b2"]);
        assert_eq!(graph.node(u).unwrap().status(), Status::Warning);
    }

    #[test]
    fn nan_through_keyframes_cannot_win() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let u = b
            .add(
                NodeDef::utility("pick")
                    .branch(
                        Callback::no_args(|_w: &mut World| Ok(f32::NAN)),
                        ResponseCurve::keyframes(vec![(0.0, 0.0), (1.0, 1.0)]),
                    )
                    .branch(Callback::no_args(|_w: &mut World| Ok(0.5)), ResponseCurve::Identity),
            )
            .unwrap();
        b.link(entry, u).unwrap();
        for (k, label) in ["b0", "b1"].into_iter().enumerate() {
            let target = b.add(counter(label)).unwrap();
            b.connect(u, Port::Branch(k), target, TransitionDef::new()).unwrap();
        }
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["b1"]);
        assert_eq!(graph.node(u).unwrap().status(), Status::Normal);
    }

    #[test]
    fn empty_utility_is_rejected_at_build() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let u = b.add(NodeDef::utility("nothing")).unwrap();
        assert_eq!(
            b.build().err(),
            Some(GraphError::EmptyUtility { node: u, label: "nothing".into() }),
        );
    }
}

// ── Transition gates ──────────────────────────────────────────────────────────

#[cfg(test)]
mod transition_tests {
    use super::*;

    fn gated(def: TransitionDef<World>, clock: &ManualClock, rng: Script) -> (BehaviourCore<World>, eliot_core::TransitionId) {
        let mut b = builder(clock).rng(rng);
        let entry = b.entry();
        let a = b.add(counter("a")).unwrap();
        let t = b.connect(entry, Port::Out, a, def).unwrap();
        (b.build().unwrap(), t)
    }

    #[test]
    fn ungated_transition_never_draws() {
        let clock = ManualClock::new(0.0);
        let (rng, calls) = Script::new(&[]);
        let (mut graph, _) = gated(TransitionDef::new(), &clock, rng);
        let mut world = World::default();
        for _ in 0..10 {
            graph.tick(&mut world);
        }
        assert_eq!(world.count("a"), 10);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn probability_uses_threshold_then_roll() {
        let clock = ManualClock::new(0.0);
        // (threshold, roll) pairs: pass, fail, pass on equality.
        let (rng, calls) = Script::new(&[40.0, 39.0, 40.0, 41.0, 60.0, 60.0]);
        let (mut graph, _) = gated(TransitionDef::new().probability(40.0, 60.0), &clock, rng);
        let mut world = World::default();

        graph.tick(&mut world);
        assert_eq!(world.count("a"), 1);
        graph.tick(&mut world);
        assert_eq!(world.count("a"), 1);
        graph.tick(&mut world);
        assert_eq!(world.count("a"), 2);
        assert_eq!(calls.get(), 6);
    }

    #[test]
    fn cooldown_blocks_until_elapsed() {
        let clock = ManualClock::new(0.0);
        let (rng, _) = Script::new(&[]);
        let (mut graph, t) = gated(TransitionDef::new().cooldown(1.0, 1.0), &clock, rng);
        let mut world = World::default();

        graph.tick(&mut world);
        assert_eq!(world.count("a"), 1);
        for now in [0.25, 0.5, 0.999] {
            clock.set(now);
            assert!(!graph.transition(t).unwrap().cooldown_ready(now));
            graph.tick(&mut world);
        }
        assert_eq!(world.count("a"), 1);

        clock.set(1.0);
        assert!(graph.transition(t).unwrap().cooldown_ready(1.0));
        graph.tick(&mut world);
        assert_eq!(world.count("a"), 2);
        assert_eq!(graph.transition(t).unwrap().last_fire(), Some(1.0));
    }

    #[test]
    fn cooldown_sample_redrawn_once_per_firing() {
        let clock = ManualClock::new(0.0);
        let (rng, calls) = Script::new(&[2.0, 1.0]);
        let (mut graph, t) = gated(TransitionDef::new().cooldown(1.0, 3.0), &clock, rng);
        let mut world = World::default();

        for now in [0.0, 1.0, 2.0, 2.5] {
            clock.set(now);
            graph.tick(&mut world);
        }
        assert_eq!(world.count("a"), 2);
        assert_eq!(calls.get(), 2);
        assert_eq!(graph.transition(t).unwrap().cooldown_sample(), 1.0);
    }

    #[test]
    fn terminate_group_stops_siblings_only_on_propagation() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let first = b.add(counter("first")).unwrap();
        let second = b.add(counter("second")).unwrap();
        b.connect(
            entry,
            Port::Out,
            first,
            TransitionDef::new().terminate_group(true).guard(flag_guard()),
        )
        .unwrap();
        b.link(entry, second).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World { flag: true, ..World::default() };
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["first"]);

        world.flag = false;
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["first", "second"]);
    }

    #[test]
    fn guard_reverse_and_failure() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let a = b.add(counter("a")).unwrap();
        let c = b.add(counter("c")).unwrap();
        b.connect(entry, Port::Out, a, TransitionDef::new().guard(flag_guard()).reverse(true)).unwrap();
        let broken = b
            .connect(
                entry,
                Port::Out,
                c,
                TransitionDef::new()
                    .label("broken")
                    .guard(Callback::no_args(|_w: &mut World| Err(CallbackError::unexpected("x")))),
            )
            .unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["a"]);
        assert_eq!(graph.transition(broken).unwrap().status(), Status::Error);
        assert!(graph.transition(broken).unwrap().has_guard());
    }

    #[test]
    fn transition_capture_moves_control_to_start() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        b.pre_tick(entry, |w: &mut World| w.hits.push("entry")).unwrap();
        let cond = b.add(NodeDef::condition("flag?", flag_guard())).unwrap();
        let x = b.add(counter("x")).unwrap();
        b.link(entry, cond).unwrap();
        b.connect(cond, Port::If, x, TransitionDef::new().capture_control(true)).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World { flag: true, ..World::default() };
        graph.tick(&mut world);
        assert_eq!(graph.active_component(), cond);
        graph.tick(&mut world);
        assert_eq!(world.count("entry"), 1);
        assert_eq!(world.count("x"), 2);
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod driver_tests {
    use super::*;
    use crate::GraphError;

    #[test]
    fn set_active_component_relaxes_previous_path() {
        let clock = ManualClock::new(0.0);
        let recorder = Recorder::default();
        let mut b = builder(&clock).observer(recorder.clone());
        let entry = b.entry();
        let a = b.add(counter("a")).unwrap();
        let t = b.link(entry, a).unwrap();
        let mut graph = b.build().unwrap();

        graph.tick(&mut World::default());
        assert!(graph.node(entry).unwrap().is_active());
        assert!(graph.transition(t).unwrap().is_active());

        graph.set_active_component(a).unwrap();
        assert_eq!(graph.active_component(), a);
        assert!(!graph.node(entry).unwrap().is_active());
        assert!(!graph.transition(t).unwrap().is_active());
        assert!(!graph.node(a).unwrap().is_active());

        graph.set_active_component(a).unwrap();
        assert_eq!(recorder.events(), vec![Event::Active(entry, a)]);
        assert_eq!(graph.set_active_component(NodeId(99)), Err(GraphError::UnknownNode(NodeId(99))));
    }

    #[test]
    fn reset_returns_to_entry_and_fires_hook() {
        let clock = ManualClock::new(0.0);
        let resets = Rc::new(Cell::new(0));
        let seen = resets.clone();
        let recorder = Recorder::default();
        let mut b = builder(&clock)
            .observer(recorder.clone())
            .on_reset(move || seen.set(seen.get() + 1));
        let entry = b.entry();
        let a = b.add(counter("a").capture_control(true)).unwrap();
        b.link(entry, a).unwrap();
        let mut graph = b.build().unwrap();

        graph.tick(&mut World::default());
        assert_eq!(graph.active_component(), a);
        graph.reset();
        assert_eq!(graph.active_component(), entry);
        assert_eq!(resets.get(), 1);
        assert_eq!(recorder.events().last(), Some(&Event::Reset));
    }

    #[test]
    fn relax_is_idempotent() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let a = b.add(counter("a")).unwrap();
        let t = b.link(entry, a).unwrap();
        let mut graph = b.build().unwrap();

        graph.tick(&mut World::default());
        graph.relax(entry).unwrap();
        let snapshot = (
            graph.node(entry).unwrap().is_active(),
            graph.transition(t).unwrap().is_active(),
            graph.node(a).unwrap().is_active(),
        );
        assert_eq!(snapshot, (false, false, false));
        graph.relax(entry).unwrap();
        graph.relax_single_iteration(entry).unwrap();
        graph.relax_transition(t).unwrap();
        assert!(!graph.node(a).unwrap().is_active());
        assert!(graph.relax(NodeId(42)).is_err());
    }

    #[test]
    fn lookups_by_label() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let p1 = b.add(counter("patrol")).unwrap();
        let p2 = b.add(counter("patrol")).unwrap();
        let t = b.connect(entry, Port::Out, p1, TransitionDef::new().label("go")).unwrap();
        b.link(entry, p2).unwrap();
        let graph = b.build().unwrap();

        assert_eq!(graph.get_node("Entry"), Some(entry));
        assert_eq!(graph.get_node("patrol"), Some(p1));
        assert_eq!(graph.get_nodes("patrol"), &[p1, p2]);
        assert!(graph.get_nodes("missing").is_empty());
        assert_eq!(graph.get_transition("go"), Some(t));
        assert_eq!(graph.get_transitions("go"), &[t]);
        assert_eq!(graph.get_transition("nope"), None);
        assert_eq!((graph.node_count(), graph.transition_count()), (3, 2));
    }

    #[test]
    fn resume_at_hands_over_control_when_due() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let a = b.add(counter("a")).unwrap();
        let later = b.add(counter("later")).unwrap();
        b.link(entry, a).unwrap();
        let mut graph = b.build().unwrap();

        graph.resume_at(later, 5.0).unwrap();
        let mut world = World::default();
        graph.tick(&mut world);
        assert_eq!(graph.pending_resumes().len(), 1);
        assert_eq!(graph.pending_resumes().next_due(), Some(5.0));

        clock.set(5.0);
        graph.tick(&mut world);
        assert_eq!(graph.active_component(), later);
        assert_eq!(world.hits, vec!["a", "later"]);
        assert!(graph.pending_resumes().is_empty());

        graph.resume_at(entry, 9.0).unwrap();
        assert_eq!(graph.cancel_resumes(entry), 1);
        assert!(graph.resume_at(NodeId(77), 1.0).is_err());
    }

    #[test]
    fn non_finite_resume_time_is_rejected() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let a = b.add(counter("a")).unwrap();
        let mut graph = b.build().unwrap();

        assert!(matches!(graph.resume_at(a, f64::NAN), Err(GraphError::InvalidResumeTime(_))));
        assert!(matches!(graph.resume_at(a, f64::INFINITY), Err(GraphError::InvalidResumeTime(_))));
        assert!(graph.pending_resumes().is_empty());
    }

    #[test]
    fn panicking_callback_does_not_block_next_tick() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let a = b.add(counter("a")).unwrap();
        let faulty = b
            .add(NodeDef::action(
                "faulty",
                Callback::no_args(|w: &mut World| {
                    if !w.flag {
                        w.flag = true;
                        panic!("sensor fault");
                    }
                    Ok(())
                }),
            ))
            .unwrap();
        b.link(entry, a).unwrap();
        b.link(entry, faulty).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| graph.tick(&mut world)));
        assert!(outcome.is_err());

        graph.tick(&mut world);
        assert_eq!(world.count("a"), 2);
        assert!(!graph.node(a).unwrap().is_single_iteration_active());
    }
}

// ── Builder validation ────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use eliot_core::CoreError;

    use super::*;
    use crate::{GraphError, NodeKind};

    #[test]
    fn port_must_match_node_kind() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let a = b.add(counter("a")).unwrap();
        let c = b.add(counter("c")).unwrap();
        assert_eq!(
            b.connect(a, Port::If, c, TransitionDef::new()).err(),
            Some(GraphError::PortMismatch { node: a, kind: NodeKind::Action, port: Port::If }),
        );
        assert!(b.add_branch(a, score(0), ResponseCurve::Identity).is_err());
    }

    #[test]
    fn definition_options_must_match_node_kind() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        assert_eq!(
            b.add(counter("a").reverse(true)).err(),
            Some(GraphError::OptionMismatch { label: "a".into(), kind: NodeKind::Action, option: "reverse" }),
        );
        assert_eq!(
            b.add(NodeDef::condition("c", flag_guard()).branch(score(0), ResponseCurve::Identity)).err(),
            Some(GraphError::OptionMismatch { label: "c".into(), kind: NodeKind::Condition, option: "branch" }),
        );
        assert!(b.add(NodeDef::repeat_while("l", flag_guard()).reverse(true)).is_ok());
        assert_eq!(b.build().unwrap().node_count(), 2);
    }

    #[test]
    fn windows_are_validated() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let a = b.add(counter("a")).unwrap();
        assert_eq!(
            b.connect(entry, Port::Out, a, TransitionDef::new().probability(50.0, 150.0)).err(),
            Some(GraphError::Core(CoreError::InvalidWindow { what: "probability", min: 50.0, max: 150.0 })),
        );
        assert!(b.connect(entry, Port::Out, a, TransitionDef::new().cooldown(2.0, 1.0)).is_err());
    }

    #[test]
    fn unknown_nodes_are_rejected() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        assert_eq!(b.link(entry, NodeId(5)).err(), Some(GraphError::UnknownNode(NodeId(5))));
        assert!(b.pre_tick(NodeId(5), |_w: &mut World| {}).is_err());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let clock = ManualClock::new(0.0);
        let b = builder(&clock).config(GraphConfig { seed: 1, max_tick_depth: 0 });
        assert!(matches!(b.build(), Err(GraphError::Core(CoreError::Config(_)))));
    }
}

// ── Callback binding forms ────────────────────────────────────────────────────

#[cfg(test)]
mod callback_tests {
    use super::*;
    use crate::{ActivationMode, CallbackResult, Value};

    #[test]
    fn stored_arguments_are_passed() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let defs = [
            NodeDef::action("b", Callback::with_bool(|w: &mut World, v: bool| { w.args.push(v.to_string()); Ok(()) }, true)),
            NodeDef::action("i", Callback::with_int(|w: &mut World, v: i32| { w.args.push(v.to_string()); Ok(()) }, 7)),
            NodeDef::action("f", Callback::with_float(|w: &mut World, v: f32| { w.args.push(v.to_string()); Ok(()) }, 2.5)),
            NodeDef::action("s", Callback::with_str(|w: &mut World, v: &str| { w.args.push(v.to_string()); Ok(()) }, "hello")),
        ];
        let mut modes = Vec::new();
        for def in defs {
            let id = b.add(def).unwrap();
            b.link(entry, id).unwrap();
            modes.push(id);
        }
        let mut graph = b.build().unwrap();

        let mut world = World::default();
        graph.tick(&mut world);
        assert_eq!(world.args, vec!["true", "7", "2.5", "hello"]);

        let modes: Vec<_> = modes.iter().map(|id| graph.node(*id).unwrap().activation_mode()).collect();
        assert_eq!(
            modes,
            vec![
                Some(ActivationMode::Bool),
                Some(ActivationMode::Int),
                Some(ActivationMode::Float),
                Some(ActivationMode::String),
            ],
        );
        assert_eq!(graph.node(entry).unwrap().activation_mode(), None);
    }

    #[test]
    fn generic_values_are_converted() {
        let mut world = World::default();

        let as_float: Callback<World, f32> = Callback::generic(|_w: &mut World| -> CallbackResult<Value> { Ok(Value::Int(4)) });
        assert_eq!(as_float.mode(), ActivationMode::Other);
        assert_eq!(as_float.invoke(&mut world), Ok(4.0));

        let as_bool: Callback<World, bool> = Callback::generic(|_w: &mut World| -> CallbackResult<Value> { Ok(Value::Bool(true)) });
        assert_eq!(as_bool.invoke(&mut world), Ok(true));

        let as_unit: Callback<World, ()> = Callback::generic(|_w: &mut World| -> CallbackResult<Value> { Ok(Value::Str("ignored".into())) });
        assert_eq!(as_unit.invoke(&mut world), Ok(()));
    }

    #[test]
    fn generic_type_mismatch_is_unexpected() {
        let mut world = World::default();
        let bad: Callback<World, bool> = Callback::generic(|_w: &mut World| -> CallbackResult<Value> { Ok(Value::Float(1.0)) });
        assert!(matches!(bad.invoke(&mut world), Err(CallbackError::Unexpected(_))));
    }

    #[test]
    fn generic_condition_in_graph() {
        let clock = ManualClock::new(0.0);
        let mut b = builder(&clock);
        let entry = b.entry();
        let cond = b
            .add(NodeDef::condition(
                "reflective",
                Callback::generic(|w: &mut World| -> CallbackResult<Value> { Ok(Value::Bool(w.flag)) }),
            ))
            .unwrap();
        let yes = b.add(counter("yes")).unwrap();
        b.link(entry, cond).unwrap();
        b.connect(cond, Port::If, yes, TransitionDef::new()).unwrap();
        let mut graph = b.build().unwrap();

        let mut world = World { flag: true, ..World::default() };
        graph.tick(&mut world);
        assert_eq!(world.hits, vec!["yes"]);
        assert_eq!(graph.node(cond).unwrap().activation_mode(), Some(ActivationMode::Other));
    }
}
