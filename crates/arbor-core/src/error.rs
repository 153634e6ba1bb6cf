use thiserror::Error;

use crate::BufferId;

/// Misuse of a runtime buffer or of the handles it issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("handle was issued by runtime buffer {handle}, not by buffer {buffer}")]
    ForeignHandle { handle: BufferId, buffer: BufferId },

    #[error("slot {index} is out of range (buffer holds {len} slots)")]
    OutOfRange { index: usize, len: usize },

    #[error("slot {index} stores `{found}`, requested as `{expected}`")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("runtime buffer {0} is sealed; variables can only be registered during layout")]
    Sealed(BufferId),

    #[error("node-local slot {local} requested, node registered {count}")]
    LocalOutOfRange { local: usize, count: usize },
}
