use thiserror::Error;

/// Invalid clip or blend data.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BlendError {
    #[error("clip duration must be zero or positive, got {0}")]
    Duration(f32),

    #[error("clip event time must be a number, got {0}")]
    EventTime(f32),

    #[error("blend point value must be a number, got {0}")]
    PointValue(f32),
}
