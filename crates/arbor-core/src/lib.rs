//! Per-instance runtime data and execution primitives for shared behavior trees.
//!
//! A tree definition is authored once and shared; every running instance keeps its progress in
//! its own [`RuntimeBuffer`]. Nodes register their private variables during a one-time layout
//! pass and address them afterwards through typed keys.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod layout;
pub mod runtime;
pub mod status;
pub mod tick;

pub use error::BufferError;
pub use id::NodeId;
pub use layout::{Layout, Local, NodeData, NodeDataMut, SlotRange};
pub use runtime::{BufferId, Handle, RuntimeBuffer, RuntimeValue, SlotInfo};
pub use status::Status;
pub use tick::TickContext;

pub type Result<T> = std::result::Result<T, BufferError>;
