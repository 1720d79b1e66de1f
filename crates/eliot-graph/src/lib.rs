//! `eliot-graph` — behaviour execution graph runtime.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                        |
//! |----------------|-----------------------------------------------------------------|
//! | [`callback`]   | `Callback`, `ActivationMode`, `Invocable`, `Value`              |
//! | [`node`]       | `Node`, `NodeDef`, `NodeKind`, `Port`, `Status`                 |
//! | [`transition`] | `Transition`, `TransitionDef` — gated edges                     |
//! | [`graph`]      | `BehaviourCore` — the driver and per-node tick semantics        |
//! | [`builder`]    | `GraphBuilder` — authoring and build-time validation            |
//! | [`observer`]   | `GraphObserver`, `TracingObserver`, `NoopObserver`              |
//! | [`resume`]     | `ResumeQueue` — timed control hand-offs polled each tick        |
//! | [`error`]      | `CallbackError`, `GraphError`, `GraphResult<T>`                 |
//!
//! # Design notes
//!
//! One call to [`BehaviourCore::tick`] is a synchronous depth-first walk
//! from the *active component*:
//!
//! ```text
//! tick():
//!   ① Resume   — due ResumeQueue entries take control.
//!   ② Walk     — active node runs its callback, then ticks its transitions:
//!                  Transition: capture? → cooldown gate → probability gate
//!                              → guard → tick end node
//!                  Condition:  relax the branch not taken, tick the other
//!                  Loop:       true  → take control, tick `While`
//!                              false → Entry takes control, tick `End`
//!                  Utility:    tick only the best-scoring branch
//!   ③ Boundary — clear every single-iteration flag raised by the walk.
//! ```
//!
//! The graph owns every node and transition in flat arenas; transitions
//! hold `NodeId`s, so cyclic graphs need no shared ownership.  Re-entry
//! within one tick is stopped by each node's single-iteration flag, and a
//! configurable depth cap bounds walks that cycle through the active
//! component.
//!
//! Callbacks never abort a tick: failures demote the component's
//! [`Status`] and are reported to the [`GraphObserver`].

pub mod builder;
pub mod callback;
pub mod error;
pub mod graph;
pub mod node;
pub mod observer;
pub mod resume;
pub mod transition;

#[cfg(test)]
mod tests;

pub use builder::GraphBuilder;
pub use callback::{ActivationMode, Callback, FromValue, Invocable, Value};
pub use error::{CallbackError, CallbackResult, GraphError, GraphResult};
pub use graph::BehaviourCore;
pub use node::{Hook, Node, NodeDef, NodeKind, Port, Status};
pub use observer::{ComponentRef, GraphObserver, NoopObserver, TracingObserver};
pub use resume::ResumeQueue;
pub use transition::{Transition, TransitionDef};
