//! Animation blending support for arbor trees.
//!
//! - [`blend`] mixes two poses bone by bone.
//! - [`synchronize`] retimes clips so they reach a shared event together.
//! - [`PlayClip`] is a behavior-tree leaf that plays a [`Clip`] with per-instance playheads.
//! - [`Blend1D`] is a leaf that blends clips placed along a float tree variable.

pub mod blender;
pub mod clip;
pub mod error;
pub mod math;
pub mod pose;
pub mod sync;

pub use blender::{Blend1D, BlendPoint, Segment};
pub use clip::{AnimationHost, Clip, ClipTrack, PlayClip};
pub use error::BlendError;
pub use math::{Quat, Transform, Vec3};
pub use pose::{blend, blended};
pub use sync::{synchronize, virtual_clip_length, SyncDescriptor};
