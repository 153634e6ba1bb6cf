#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Timing of one clip taking part in a synchronized blend.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncDescriptor {
    /// Clip time left until the shared synchronization event.
    pub time_left_until_event: f32,
    pub blend_weight: f32,
    /// Output of [`synchronize`]; 1.0 until then.
    pub playback_speed: f32,
}

impl SyncDescriptor {
    pub fn new(time_left_until_event: f32, blend_weight: f32) -> Self {
        Self {
            time_left_until_event,
            blend_weight,
            playback_speed: 1.0,
        }
    }
}

/// Weighted time every clip has left until the event: `Σ time_left × weight`.
pub fn virtual_clip_length(descriptors: &[SyncDescriptor]) -> f32 {
    descriptors
        .iter()
        .map(|d| d.time_left_until_event * d.blend_weight)
        .sum()
}

/// Scales every clip's playback speed so all of them reach the event together.
///
/// Each speed becomes `time_left / V` with `V` the [`virtual_clip_length`], which is returned.
/// When `V` is zero nothing is changed and `None` is returned.
pub fn synchronize(descriptors: &mut [SyncDescriptor]) -> Option<f32> {
    let length = virtual_clip_length(descriptors);
    if length == 0.0 {
        return None;
    }
    for d in descriptors.iter_mut() {
        d.playback_speed = d.time_left_until_event / length;
    }
    Some(length)
}
