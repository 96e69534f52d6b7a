//! Evaluation side: multi-component channels and frame-range sampling.

pub(crate) mod channel;
pub(crate) mod frames;
