//! `eliot-core` — foundational types for the eliot behaviour graph.
//!
//! This crate is a dependency of every other `eliot-*` crate.  It has no
//! `eliot-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`ids`]     | `NodeId`, `TransitionId`                                  |
//! | [`time`]    | `Clock` trait, `StepClock`, `ManualClock`, `SystemClock`  |
//! | [`rng`]     | `RandomSource` trait, `GraphRng`, `true_with_probability` |
//! | [`window`]  | `Window` — probability / cooldown sampling intervals      |
//! | [`curve`]   | `ResponseCurve` for utility scoring                       |
//! | [`config`]  | `GraphConfig`                                             |
//! | [`error`]   | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, config, windows and |
//! |         | curves so hosts can load them from files.                  |

pub mod config;
pub mod curve;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;
pub mod window;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::GraphConfig;
pub use curve::ResponseCurve;
pub use error::{CoreError, CoreResult};
pub use ids::{NodeId, TransitionId};
pub use rng::{GraphRng, RandomSource, true_with_probability};
pub use time::{Clock, ManualClock, Step, StepClock, SystemClock};
pub use window::Window;
