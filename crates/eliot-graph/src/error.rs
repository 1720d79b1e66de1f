use eliot_core::{CoreError, NodeId, TransitionId};
use thiserror::Error;

use crate::{NodeKind, Port};

/// Failure raised by a bound callback.
///
/// These never escape [`BehaviourCore::tick`][crate::BehaviourCore::tick]:
/// they are caught at the node boundary, demote the component's
/// [`Status`][crate::Status], and are reported to the observer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CallbackError {
    /// A dependency the callback needs is absent right now (recoverable).
    #[error("component not found: {0}")]
    ComponentNotFound(String),

    #[error("unexpected callback failure: {0}")]
    Unexpected(String),
}

impl CallbackError {
    pub fn component_not_found(what: impl Into<String>) -> Self {
        CallbackError::ComponentNotFound(what.into())
    }

    pub fn unexpected(what: impl Into<String>) -> Self {
        CallbackError::Unexpected(what.into())
    }
}

pub type CallbackResult<T> = Result<T, CallbackError>;

/// Graph construction and driver errors.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("{0} does not exist in this graph")]
    UnknownNode(NodeId),

    #[error("{0} does not exist in this graph")]
    UnknownTransition(TransitionId),

    #[error("{kind:?} node {node} has no {port:?} port")]
    PortMismatch {
        node: NodeId,
        kind: NodeKind,
        port: Port,
    },

    #[error("utility node {node} ('{label}') has no scoring branches")]
    EmptyUtility {
        node:  NodeId,
        label: String,
    },

    #[error("{kind:?} node '{label}' does not accept `{option}`")]
    OptionMismatch {
        label:  String,
        kind:   NodeKind,
        option: &'static str,
    },

    #[error("resume time {0} is not a finite clock reading")]
    InvalidResumeTime(f64),

    #[error("too many {0} for a 32-bit index")]
    Capacity(&'static str),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type GraphResult<T> = Result<T, GraphError>;
