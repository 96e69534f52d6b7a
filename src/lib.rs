//! keycurve is a keyframe animation curve engine.
//!
//! A [`Curve`] is an ordered set of [`Keyframe`]s keyed by time. Sampling a curve at an arbitrary
//! time `u`:
//!
//! 1. **Map**: outside the keyframed span, the pre/post [`OutsideCurveBehavior`] remaps `u` into
//!    the span and yields a value offset (hold, cycle, cycle with offset, ping-pong).
//! 2. **Bracket**: the two keyframes around the mapped time are located by binary search.
//! 3. **Interpolate**: the left keyframe's [`Interpolation`] (constant, linear or spline) computes
//!    the value; spline segments are cubic Bezier curves shaped by per-side tangents.
//!
//! Editing goes through [`Curve`] mutators directly or through reversible [`KeyframeCommand`]s
//! recorded in an [`UndoRedoStack`]. Every applied mutation bumps the curve revision and notifies
//! subscribers once.
//!
//! Multi-component values (vectors, colors) are [`Channel`]s, which can be evaluated over a frame
//! range with [`sample_frames`], optionally on a rayon pool.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod command;
mod eval;
mod foundation;

pub use animation::curve::Curve;
pub use animation::keyframe::{DEFAULT_TANGENT_WEIGHT, Interpolation, Keyframe, TangentMode};
pub use animation::notify::{CurveChange, CurveEvent, SubscriptionId};
pub use animation::outside::{MappedTime, OutsideCurveBehavior};
pub use command::keyframe::KeyframeCommand;
pub use command::stack::{Command, UndoRedoStack};
pub use eval::channel::Channel;
pub use eval::frames::{EvalOpts, FrameSamples, sample_curve_frames, sample_frames};
pub use foundation::core::{Fps, FrameIndex, FrameRange};
pub use foundation::error::{CurveError, CurveResult};
