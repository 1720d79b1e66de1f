//! `patrol` — a sentry guarding a corridor, driven by a behaviour graph.
//!
//! The sentry walks the corridor and glances around until an intruder comes
//! into sight, then a Utility node weighs firing against reloading.  A
//! reload Loop holds control until the magazine is full.  After each kill
//! the host schedules a regroup reload through the graph's resume queue;
//! an intruder that reaches the sentry forces a reset.
//!
//! Run with:
//!   cargo run -p patrol -- [config.json]
//!   RUST_LOG=eliot_graph=debug cargo run -p patrol

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use eliot_core::{Clock, GraphConfig, ResponseCurve, StepClock};
use eliot_graph::{
    BehaviourCore, Callback, CallbackError, CallbackResult, GraphBuilder, NodeDef, Port, Status,
    TransitionDef,
};

// ── Constants ─────────────────────────────────────────────────────────────────

const CORRIDOR_LEN:  i32   = 20;
const SIGHT_RANGE:   f32   = 8.0;
const SPAWN_RANGE:   f32   = 12.0;
const ENEMY_SPEED:   f32   = 0.5;
const ENEMY_HP:      u32   = 3;
const MAGAZINE:      u32   = 4;
/// An intruder appears every N steps while the corridor is clear.
const SPAWN_EVERY:   u64   = 24;

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DemoConfig {
    graph:        GraphConfig,
    steps:        u64,
    step_secs:    f64,
    /// Pause after a kill before the regroup reload takes control.
    regroup_secs: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            graph:        GraphConfig { seed: 7, ..GraphConfig::default() },
            steps:        200,
            step_secs:    0.25,
            regroup_secs: 2.0,
        }
    }
}

fn load_config(path: Option<&str>) -> Result<DemoConfig> {
    let Some(path) = path else {
        return Ok(DemoConfig::default());
    };
    let text = std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("reading config {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {path}"))
}

// ── World ─────────────────────────────────────────────────────────────────────

struct Intruder {
    distance: f32,
    hp:       u32,
}

#[derive(Default)]
struct Sentry {
    position: i32,
    heading:  i32,
    ammo:     u32,
    intruder: Option<Intruder>,
    shots:    u32,
    kills:    u32,
    glances:  u32,
    breaches: u32,
}

impl Sentry {
    fn new() -> Self {
        Self { heading: 1, ammo: MAGAZINE, ..Self::default() }
    }

    fn threat_in_sight(&mut self) -> CallbackResult<bool> {
        Ok(self.intruder.as_ref().is_some_and(|i| i.distance <= SIGHT_RANGE))
    }

    fn walk(&mut self) -> CallbackResult<()> {
        if !(0..CORRIDOR_LEN).contains(&(self.position + self.heading)) {
            self.heading = -self.heading;
        }
        self.position += self.heading;
        Ok(())
    }

    fn glance(&mut self, arc_degrees: f32) -> CallbackResult<()> {
        self.glances += 1;
        debug!(position = self.position, arc_degrees, "glance");
        Ok(())
    }

    fn fire(&mut self) -> CallbackResult<()> {
        if self.ammo == 0 {
            return Err(CallbackError::unexpected("trigger pulled on an empty magazine"));
        }
        let target = self
            .intruder
            .as_mut()
            .ok_or_else(|| CallbackError::component_not_found("target"))?;
        self.ammo -= 1;
        self.shots += 1;
        target.hp = target.hp.saturating_sub(1);
        if target.hp == 0 {
            self.intruder = None;
            self.kills += 1;
            info!(kills = self.kills, "intruder down");
        }
        Ok(())
    }

    fn ammo_left(&mut self) -> CallbackResult<f32> {
        Ok(self.ammo as f32)
    }

    fn rounds_missing(&mut self) -> CallbackResult<f32> {
        Ok((MAGAZINE - self.ammo) as f32)
    }

    fn magazine_not_full(&mut self) -> CallbackResult<bool> {
        Ok(self.ammo < MAGAZINE)
    }

    fn load_round(&mut self) -> CallbackResult<()> {
        self.ammo = (self.ammo + 1).min(MAGAZINE);
        Ok(())
    }

    fn ready(&mut self) -> CallbackResult<()> {
        debug!(ammo = self.ammo, "magazine full");
        Ok(())
    }

    /// Host-side world update; returns `true` when an intruder reached the
    /// sentry this step.
    fn advance(&mut self, step: u64) -> bool {
        match self.intruder.as_mut() {
            Some(intruder) => {
                intruder.distance -= ENEMY_SPEED;
                if intruder.distance <= 0.0 {
                    self.intruder = None;
                    self.breaches += 1;
                    return true;
                }
            }
            None if step % SPAWN_EVERY == 0 => {
                self.intruder = Some(Intruder { distance: SPAWN_RANGE, hp: ENEMY_HP });
                info!(step, "intruder spotted at the far end");
            }
            None => {}
        }
        false
    }
}

// ── Graph ─────────────────────────────────────────────────────────────────────

fn build_graph(config: &DemoConfig, clock: &StepClock) -> Result<BehaviourCore<Sentry>> {
    let mut b = GraphBuilder::new()
        .config(config.graph.clone())
        .clock(clock.clone())
        .on_reset(|| warn!("sentry reset to entry"));
    let entry = b.entry();

    let threat = b.add(NodeDef::condition("threat in sight", Callback::no_args(Sentry::threat_in_sight)))?;
    let respond = b.add(
        NodeDef::utility("respond")
            .branch(
                Callback::no_args(Sentry::ammo_left),
                ResponseCurve::Logistic { steepness: 2.0, midpoint: 0.5 },
            )
            .branch(
                Callback::no_args(Sentry::rounds_missing),
                ResponseCurve::Linear { slope: 0.25, intercept: 0.0 },
            ),
    )?;
    let fire = b.add(NodeDef::action("fire", Callback::no_args(Sentry::fire)))?;
    let reloading = b.add(NodeDef::repeat_while("reloading", Callback::no_args(Sentry::magazine_not_full)))?;
    let load = b.add(NodeDef::action("load round", Callback::no_args(Sentry::load_round)))?;
    let ready = b.add(NodeDef::action("ready", Callback::no_args(Sentry::ready)))?;
    let walk = b.add(NodeDef::action("walk", Callback::no_args(Sentry::walk)))?;
    let glance = b.add(NodeDef::action("glance", Callback::with_float(Sentry::glance, 120.0)))?;

    b.link(entry, threat)?;
    b.connect(threat, Port::If, respond, TransitionDef::new())?;
    b.connect(threat, Port::Else, walk, TransitionDef::new())?;
    b.connect(respond, Port::Branch(0), fire, TransitionDef::new().label("trigger").cooldown(0.5, 0.75))?;
    b.connect(respond, Port::Branch(1), reloading, TransitionDef::new())?;
    b.connect(reloading, Port::While, load, TransitionDef::new())?;
    b.connect(reloading, Port::End, ready, TransitionDef::new())?;
    b.connect(walk, Port::Out, glance, TransitionDef::new().label("look around").probability(20.0, 40.0))?;

    Ok(b.build()?)
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(std::env::args().nth(1).as_deref())?;
    info!(?config, "starting patrol");

    let clock = StepClock::new(config.step_secs);
    let mut graph = build_graph(&config, &clock)?;
    let reloading = graph.get_node("reloading").context("graph has no reloading node")?;
    let trigger = graph.get_transition("trigger").context("graph has no trigger transition")?;

    let mut sentry = Sentry::new();
    for step in 0..config.steps {
        if sentry.advance(step) {
            warn!(step, "intruder reached the sentry");
            graph.reset();
        }

        let kills_before = sentry.kills;
        graph.tick(&mut sentry);
        if sentry.kills > kills_before {
            graph.resume_at(reloading, clock.now() + config.regroup_secs)?;
        }

        if let Some(node) = graph.node(graph.active_component()) {
            debug!(%clock, active = node.label(), ammo = sentry.ammo, "tick");
        }
        clock.advance();
    }

    let fire = graph.get_node("fire").and_then(|id| graph.node(id));
    if fire.is_some_and(|n| n.status() != Status::Normal) {
        warn!("last trigger pull failed");
    }
    info!(
        shots = sentry.shots,
        kills = sentry.kills,
        glances = sentry.glances,
        breaches = sentry.breaches,
        position = sentry.position,
        last_shot = ?graph.transition(trigger).and_then(|t| t.last_fire()),
        "patrol finished"
    );
    Ok(())
}
