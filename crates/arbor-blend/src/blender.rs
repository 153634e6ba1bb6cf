//! One-dimensional blending between clips placed along a control axis.

use arbor_bt::{Action, NodeCtx, VarValue};
use arbor_core::{Layout, Local, Status};
use tracing::{trace, warn};

use crate::{blended, synchronize, AnimationHost, BlendError, Clip, SyncDescriptor, Transform};

/// A clip and the control value at which it plays alone.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendPoint {
    pub value: f32,
    pub clip: Clip,
}

/// Stretch of the control axis between two points, by index into
/// [`Blend1D::points`]. `start == end` covers the single value of that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn is_single(self) -> bool {
        self.start == self.end
    }
}

/// Leaf that blends the clips of the two points around a float tree variable.
///
/// Points are sorted by value into segments `[p0] [p0,p1] [p1] [p1,p2] ... [pn]`. Each tick the
/// control value is clamped to the points' range (a missing variable reads as the lowest
/// value), the segment containing it becomes active, and the two clips are sampled from the
/// host and blended by where the value lies between them. Clips of points that join the active
/// segment restart from zero; clips outside it are paused.
///
/// Per-instance state, including one playhead per point, lives in the runner's buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Blend1D {
    control: String,
    points: Vec<BlendPoint>,
    segments: Vec<Segment>,
    synchronized: bool,
}

impl Blend1D {
    pub const SEGMENT: Local<Option<usize>> = Local::new(0);
    pub const WEIGHT: Local<f32> = Local::new(1);
    pub const TIMES: Local<Vec<f32>> = Local::new(2);

    /// A blender without points, driven by the float variable `control`.
    pub fn new(control: impl Into<String>) -> Self {
        Self {
            control: control.into(),
            points: Vec::new(),
            segments: Vec::new(),
            synchronized: false,
        }
    }

    pub fn with_point(mut self, value: f32, clip: Clip) -> Result<Self, BlendError> {
        if value.is_nan() {
            return Err(BlendError::PointValue(value));
        }
        self.points.push(BlendPoint { value, clip });
        self.rebuild_segments();
        Ok(self)
    }

    /// Retimes the two blended clips so they reach their next events together.
    pub fn synchronized(mut self, on: bool) -> Self {
        self.synchronized = on;
        self
    }

    pub fn control(&self) -> &str {
        &self.control
    }

    /// Points in insertion order.
    pub fn points(&self) -> &[BlendPoint] {
        &self.points
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    fn rebuild_segments(&mut self) {
        let mut order: Vec<usize> = (0..self.points.len()).collect();
        order.sort_by(|&a, &b| self.points[a].value.total_cmp(&self.points[b].value));

        self.segments.clear();
        for pair in order.windows(2) {
            self.segments.push(Segment {
                start: pair[0],
                end: pair[0],
            });
            self.segments.push(Segment {
                start: pair[0],
                end: pair[1],
            });
        }
        if let Some(&last) = order.last() {
            self.segments.push(Segment {
                start: last,
                end: last,
            });
        }
    }

    /// `raw` clamped to the points' range. `None` when there are no points.
    pub fn control_value(&self, raw: Option<f32>) -> Option<f32> {
        let first = self.segments.first()?;
        let last = self.segments.last()?;
        let min = self.points[first.start].value;
        let max = self.points[last.end].value;
        Some(match raw {
            Some(value) if !value.is_nan() => value.clamp(min, max),
            _ => min,
        })
    }

    /// Index of the segment holding `control`.
    pub fn segment_for(&self, control: f32) -> Option<usize> {
        self.segments.iter().position(|segment| {
            let start = self.points[segment.start].value;
            let end = self.points[segment.end].value;
            (start == end && start == control) || (start <= control && control < end)
        })
    }

    /// Weight of the segment's end clip at `control`; 0 for a single point.
    pub fn weight(&self, segment: Segment, control: f32) -> f32 {
        let start = self.points[segment.start].value;
        let end = self.points[segment.end].value;
        if segment.is_single() || start == end {
            0.0
        } else {
            (control - start) / (end - start)
        }
    }

    fn speeds(&self, segment: Segment, weight: f32, times: &[f32]) -> (f32, f32) {
        if !self.synchronized || segment.is_single() {
            return (1.0, 1.0);
        }
        let start = &self.points[segment.start].clip;
        let end = &self.points[segment.end].clip;
        let descriptors = start
            .time_until_next_event(times[segment.start])
            .zip(end.time_until_next_event(times[segment.end]));
        let Some((start_left, end_left)) = descriptors else {
            return (1.0, 1.0);
        };

        let mut clips = [
            SyncDescriptor::new(start_left, 1.0 - weight),
            SyncDescriptor::new(end_left, weight),
        ];
        match synchronize(&mut clips) {
            Some(_) => (clips[0].playback_speed, clips[1].playback_speed),
            None => (1.0, 1.0),
        }
    }
}

impl<C: AnimationHost> Action<C> for Blend1D {
    fn create_layout(&self, layout: &mut Layout<'_>) {
        layout.register(Self::SEGMENT, None);
        layout.register(Self::WEIGHT, 0.0);
        layout.register(Self::TIMES, vec![0.0; self.points.len()]);
    }

    fn initialize(&self, ctx: &mut NodeCtx<'_, C>) {
        ctx.set(Self::SEGMENT, None);
        ctx.set(Self::WEIGHT, 0.0);
        ctx.get_mut(Self::TIMES).fill(0.0);
    }

    fn execute(&self, ctx: &mut NodeCtx<'_, C>) -> Status {
        let node = ctx.node();
        let raw = ctx.variable(&self.control).and_then(VarValue::as_float);
        let Some(control) = self.control_value(raw) else {
            return Status::Finished;
        };
        let Some(index) = self.segment_for(control) else {
            return Status::Finished;
        };
        let segment = self.segments[index];

        let previous = ctx.set(Self::SEGMENT, Some(index));
        if previous != Some(index) {
            let kept = previous.and_then(|old| self.segments.get(old).copied());
            let times = ctx.get_mut(Self::TIMES);
            for point in [segment.start, segment.end] {
                if !kept.is_some_and(|old| old.start == point || old.end == point) {
                    times[point] = 0.0;
                }
            }
            trace!(%node, ?previous, index, "blend segment changed");
        }

        let weight = self.weight(segment, control);
        ctx.set(Self::WEIGHT, weight);

        let (start_speed, end_speed) = self.speeds(segment, weight, ctx.get::<Vec<f32>>(Self::TIMES));
        let dt = ctx.dt_seconds();
        let start_clip = &self.points[segment.start].clip;
        let end_clip = &self.points[segment.end].clip;
        let times = ctx.get_mut(Self::TIMES);
        let start_time = start_clip.advance(times[segment.start], dt * start_speed).0;
        times[segment.start] = start_time;
        let end_time = if segment.is_single() {
            start_time
        } else {
            let time = end_clip.advance(times[segment.end], dt * end_speed).0;
            times[segment.end] = time;
            time
        };

        let source = ctx.host().sample(start_clip, start_time);
        let pose: Vec<Transform> = if segment.is_single() {
            source
        } else {
            let target = ctx.host().sample(end_clip, end_time);
            if source.len() != target.len() {
                warn!(
                    %node,
                    source = source.len(),
                    target = target.len(),
                    "sampled poses differ in bone count"
                );
                return Status::Failed;
            }
            blended(weight, &source, &target)
        };
        ctx.host_mut().blended_pose(node, &pose);

        if start_clip.is_finished_at(start_time) && end_clip.is_finished_at(end_time) {
            Status::Finished
        } else {
            Status::InProgress
        }
    }
}
