//! Keyframes, segment interpolation, outside-curve extrapolation and the curve aggregate.

pub(crate) mod curve;
pub(crate) mod interp;
pub(crate) mod keyframe;
pub(crate) mod notify;
pub(crate) mod outside;
