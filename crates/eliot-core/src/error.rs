//! Core error type.
//!
//! `eliot-graph` keeps its own `GraphError` and wraps `CoreError` as one
//! variant.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid {what} window [{min}, {max}]")]
    InvalidWindow {
        what: &'static str,
        min:  f32,
        max:  f32,
    },
}

/// Shorthand result type for `eliot-core`.
pub type CoreResult<T> = Result<T, CoreError>;
