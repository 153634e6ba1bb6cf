use arbor_bt::{Action, NodeCtx};
use arbor_core::{Layout, Local, NodeData, NodeId, Status};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{BlendError, SyncDescriptor, Transform};

/// Shared description of an animation clip: its length, whether it wraps, and the times of
/// the events clips synchronize on.
///
/// The duration is never negative or NaN and the events are sorted numbers inside the clip.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "ClipDef")
)]
pub struct Clip {
    name: String,
    duration: f32,
    looping: bool,
    events: Vec<f32>,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct ClipDef {
    name: String,
    duration: f32,
    looping: bool,
    #[serde(default)]
    events: Vec<f32>,
}

#[cfg(feature = "serde")]
impl TryFrom<ClipDef> for Clip {
    type Error = BlendError;

    fn try_from(def: ClipDef) -> Result<Self, BlendError> {
        Clip::try_new(def.name, def.duration, def.looping)?.with_events(def.events)
    }
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

impl Clip {
    /// Negative and NaN durations become zero.
    pub fn new(name: impl Into<String>, duration: f32, looping: bool) -> Self {
        Self {
            name: name.into(),
            duration: if duration >= 0.0 { duration } else { 0.0 },
            looping,
            events: Vec::new(),
        }
    }

    /// Like [`new`](Self::new) but rejects a negative or NaN duration.
    pub fn try_new(
        name: impl Into<String>,
        duration: f32,
        looping: bool,
    ) -> Result<Self, BlendError> {
        if duration >= 0.0 {
            Ok(Self::new(name, duration, looping))
        } else {
            Err(BlendError::Duration(duration))
        }
    }

    /// Adds a synchronization event, clamped into the clip. NaN is rejected.
    pub fn add_event(&mut self, time: f32) -> Result<(), BlendError> {
        if time.is_nan() {
            return Err(BlendError::EventTime(time));
        }
        let time = time.clamp(0.0, self.duration);
        let at = self.events.partition_point(|&t| t <= time);
        self.events.insert(at, time);
        Ok(())
    }

    pub fn with_events(
        mut self,
        times: impl IntoIterator<Item = f32>,
    ) -> Result<Self, BlendError> {
        for time in times {
            self.add_event(time)?;
        }
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn events(&self) -> &[f32] {
        &self.events
    }

    /// Moves a playhead by `dt`. Looping clips wrap around, others stop at the end. A
    /// non-finite playhead or step counts as zero.
    ///
    /// Returns the new time and whether the playhead wrapped.
    pub fn advance(&self, time: f32, dt: f32) -> (f32, bool) {
        let next = finite_or_zero(time) + finite_or_zero(dt);
        if self.looping {
            if self.duration <= 0.0 {
                return (0.0, false);
            }
            let wrapped = next.rem_euclid(self.duration);
            (wrapped, wrapped != next)
        } else {
            (next.clamp(0.0, self.duration), false)
        }
    }

    /// Whether a playhead at `time` has played a non-looping clip to its end.
    pub fn is_finished_at(&self, time: f32) -> bool {
        !self.looping && time >= self.duration
    }

    /// Clip time from `time` to the next event, wrapping for looping clips.
    ///
    /// `None` when the clip has no events, or none is left in a non-looping clip.
    pub fn time_until_next_event(&self, time: f32) -> Option<f32> {
        match self.events.iter().find(|&&event| event > time) {
            Some(event) => Some(event - time),
            None if self.looping => self
                .events
                .first()
                .map(|first| self.duration - time + first),
            None => None,
        }
    }
}

/// A clip with a playhead of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipTrack {
    clip: Clip,
    time: f32,
}

impl ClipTrack {
    pub fn new(clip: Clip) -> Self {
        Self { clip, time: 0.0 }
    }

    pub fn clip(&self) -> &Clip {
        &self.clip
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Moves the playhead, clamped into the clip. NaN rewinds to the start.
    pub fn jump_to(&mut self, time: f32) {
        let time = if time.is_nan() { 0.0 } else { time };
        self.time = time.clamp(0.0, self.clip.duration);
    }

    /// Advances the playhead. Returns whether it looped around.
    pub fn advance(&mut self, dt: f32) -> bool {
        let (time, looped) = self.clip.advance(self.time, dt);
        self.time = time;
        looped
    }

    pub fn is_finished(&self) -> bool {
        self.clip.is_finished_at(self.time)
    }

    pub fn time_until_next_event(&self) -> Option<f32> {
        self.clip.time_until_next_event(self.time)
    }

    pub fn descriptor(&self, blend_weight: f32) -> Option<SyncDescriptor> {
        self.time_until_next_event()
            .map(|left| SyncDescriptor::new(left, blend_weight))
    }
}

/// Host side of clip playback.
pub trait AnimationHost {
    /// Called every tick with the playhead a [`PlayClip`] node reached.
    fn pose(&mut self, node: NodeId, clip: &Clip, time: f32);

    /// Playback speed override for `node`, e.g. the output of [`synchronize`](crate::synchronize).
    fn playback_speed(&self, _node: NodeId) -> Option<f32> {
        None
    }

    /// Pose of `clip` at `time`, read by blending nodes.
    fn sample(&self, _clip: &Clip, _time: f32) -> Vec<Transform> {
        Vec::new()
    }

    /// Receives the pose a [`Blend1D`](crate::Blend1D) node produced this tick.
    fn blended_pose(&mut self, _node: NodeId, _pose: &[Transform]) {}
}

/// Leaf that plays a clip. The playhead, speed and loop count live in the runner's buffer, so
/// one tree can animate any number of instances.
///
/// Finishes when a non-looping clip reaches its end; looping clips run until interrupted.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayClip {
    pub clip: Clip,
    pub speed: f32,
}

impl PlayClip {
    pub const TIME: Local<f32> = Local::new(0);
    pub const SPEED: Local<f32> = Local::new(1);
    pub const LOOPS: Local<u32> = Local::new(2);

    pub fn new(clip: Clip) -> Self {
        Self { clip, speed: 1.0 }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Synchronization input for this node's playhead in one instance.
    pub fn descriptor(&self, data: NodeData<'_>, blend_weight: f32) -> Option<SyncDescriptor> {
        let time = *data.try_get(Self::TIME).ok()?;
        self.clip
            .time_until_next_event(time)
            .map(|left| SyncDescriptor::new(left, blend_weight))
    }
}

impl<C: AnimationHost> Action<C> for PlayClip {
    fn create_layout(&self, layout: &mut Layout<'_>) {
        layout.register(Self::TIME, 0.0);
        layout.register(Self::SPEED, self.speed);
        layout.register(Self::LOOPS, 0);
    }

    fn initialize(&self, ctx: &mut NodeCtx<'_, C>) {
        ctx.set(Self::TIME, 0.0);
        ctx.set(Self::SPEED, self.speed);
        ctx.set(Self::LOOPS, 0);
    }

    fn execute(&self, ctx: &mut NodeCtx<'_, C>) -> Status {
        let node = ctx.node();
        if let Some(speed) = ctx.host().playback_speed(node) {
            ctx.set(Self::SPEED, speed);
        }
        let dt = ctx.dt_seconds() * *ctx.get(Self::SPEED);
        let (time, looped) = self.clip.advance(*ctx.get(Self::TIME), dt);
        ctx.set(Self::TIME, time);
        if looped {
            *ctx.get_mut(Self::LOOPS) += 1;
            trace!(%node, clip = self.clip.name(), "clip looped");
        }

        ctx.host_mut().pose(node, &self.clip, time);
        if self.clip.is_finished_at(time) {
            Status::Finished
        } else {
            Status::InProgress
        }
    }
}
