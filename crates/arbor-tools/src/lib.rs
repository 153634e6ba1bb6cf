//! Debug tooling for arbor behavior trees.
//!
//! Kept engine-agnostic: a runner hands node lifecycle events to a [`TraceSink`] and tooling
//! decides how to render them.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{NullTraceSink, SharedTraceSink, TraceEvent, TraceKind, TraceLog, TraceSink};
