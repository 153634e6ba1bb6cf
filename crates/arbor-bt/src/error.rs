use thiserror::Error;

use arbor_core::NodeId;

use crate::VarKind;

/// Rejected structural or variable edit. The tree is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} does not exist (destroyed or never created)")]
    UnknownNode(NodeId),

    #[error("node {node} already has parent {parent}")]
    AlreadyParented { node: NodeId, parent: NodeId },

    #[error("node {0} is attached to the tree and cannot become a child")]
    AlreadyAttached(NodeId),

    #[error("adding {node} under {parent} would create a cycle")]
    WouldCycle { parent: NodeId, node: NodeId },

    #[error("node {0} is not a composite")]
    NotComposite(NodeId),

    #[error("node {0} is not a decorator")]
    NotDecorator(NodeId),

    #[error("node {0} is not a sequence")]
    NotSequence(NodeId),

    #[error("node {0} is not a selector")]
    NotSelector(NodeId),

    #[error("node {0} is not a repeater")]
    NotRepeater(NodeId),

    #[error("node {0} is not a gate")]
    NotGate(NodeId),

    #[error("node {0} is not an action")]
    NotAction(NodeId),

    #[error("node {node} is not a child of {parent}")]
    NotAChild { parent: NodeId, node: NodeId },

    #[error("node {0} still has a parent or is attached; detach it before destroying")]
    StillLinked(NodeId),

    #[error("tree variable `{0}` already exists")]
    DuplicateVariable(String),

    #[error("tree variable `{0}` does not exist")]
    UnknownVariable(String),
}

/// Misuse of a runner's variable API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunnerError {
    #[error("tree variable `{0}` does not exist")]
    UnknownVariable(String),

    #[error("tree variable `{name}` holds {expected:?}, got {found:?}")]
    VariableType {
        name: String,
        expected: VarKind,
        found: VarKind,
    },
}
