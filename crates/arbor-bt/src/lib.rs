//! Shared behavior trees executed by independent runners.
//!
//! A [`Tree`] is authored once (by code or an editing tool) and shared. Every agent gets its own
//! [`Runner`], which lays out a [`RuntimeBuffer`](arbor_core::RuntimeBuffer) for the tree's node
//! state once and then ticks the root every frame.
//!
//! Built-in node kinds:
//! - `Sequence`: children in order; `never_fail` turns a failure into a finish.
//! - `Selector`: the child picked by a [`Condition`], re-evaluated every tick.
//! - `Parallel`: every unfinished child each tick; fails as soon as one child fails.
//! - `Repeater`: restarts its child whenever it stops.
//! - `Gate`: starts its child once a [`Trigger`] fires.
//! - `Action`: user code implementing [`Action`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod events;
mod exec;
pub mod leaves;
pub mod node;
pub mod runner;
pub mod tree;
pub mod variables;

pub use arbor_core::{Layout, Local, NodeData, NodeId, Status, TickContext};
pub use context::{EvalCtx, NodeCtx};
pub use error::{RunnerError, TreeError};
pub use events::{EventLog, TreeEvent, TreeListener};
pub use leaves::{
    ActionFn, ConditionFn, IndexVariable, SetVariable, TriggerFn, VariableSwitch, VariableTrigger,
};
pub use node::{Action, Category, Condition, Node, NodeKind, Trigger};
pub use runner::{Completion, Runner, RunnerConfig, RunnerState};
pub use tree::{Tree, Walk};
pub use variables::{VarKind, VarValue, VariableDef, VariableTable};

pub type Result<T> = std::result::Result<T, TreeError>;
