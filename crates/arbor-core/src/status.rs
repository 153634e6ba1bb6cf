#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of one tick of a node.
///
/// `InProgress` means "call me again next tick before re-evaluating siblings". `Finished` and
/// `Failed` are terminal; `Failed` is an ordinary value that composites interpret, never a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Status {
    InProgress,
    Finished,
    Failed,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::InProgress)
    }
}
