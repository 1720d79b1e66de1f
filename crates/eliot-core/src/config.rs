//! Graph runtime configuration.

use crate::{CoreError, CoreResult};

/// Default recursion cap for a single tick's depth-first walk.
pub const DEFAULT_MAX_TICK_DEPTH: usize = 256;

/// Per-graph runtime configuration.
///
/// Typically loaded from a JSON/TOML file by the host application and passed
/// to the graph builder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GraphConfig {
    /// Seed for the default random source.  Same seed, same gate outcomes.
    pub seed: u64,

    /// Maximum nesting of node ticks within one driver tick.  Descent stops
    /// (and the observer is told) when a walk would exceed it.
    pub max_tick_depth: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            seed:           0,
            max_tick_depth: DEFAULT_MAX_TICK_DEPTH,
        }
    }
}

impl GraphConfig {
    /// Reject configurations the runtime cannot honour.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_tick_depth == 0 {
            return Err(CoreError::Config("max_tick_depth must be at least 1".into()));
        }
        Ok(())
    }
}
