#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Frame information handed to every node call.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickContext {
    /// Frame counter of the runner, starting at 0.
    pub tick: u64,
    /// Simulated time covered by this tick. Includes the time of frames skipped by decimation.
    pub dt_seconds: f32,
}

impl TickContext {
    pub fn new(tick: u64, dt_seconds: f32) -> Self {
        Self { tick, dt_seconds }
    }
}
