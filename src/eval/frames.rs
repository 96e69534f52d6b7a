use rayon::prelude::*;

use crate::animation::curve::Curve;
use crate::eval::channel::Channel;
use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{CurveError, CurveResult};

/// Options for evaluating a frame range.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EvalOpts {
    /// Sample frames on a rayon pool.
    pub parallel: bool,
    /// Worker count for the pool; `None` lets rayon decide.
    pub threads: Option<usize>,
}

/// All component values of a channel at one frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FrameSamples {
    /// Timeline frame.
    pub frame: FrameIndex,
    /// Frame start time in seconds.
    pub time: f64,
    /// One value per component, in component order.
    pub values: Vec<f64>,
}

/// Sample `channel` at the start of every frame in `range`.
///
/// The parallel path produces exactly the same values, in frame order, as the sequential one.
#[tracing::instrument(skip(channel, opts), fields(name = channel.name()))]
pub fn sample_frames(
    channel: &Channel,
    fps: Fps,
    range: FrameRange,
    opts: &EvalOpts,
) -> CurveResult<Vec<FrameSamples>> {
    let sample_one = |f: FrameIndex| -> CurveResult<FrameSamples> {
        let time = fps.frames_to_secs(f.0);
        Ok(FrameSamples {
            frame: f,
            time,
            values: channel.sample(time)?,
        })
    };

    if !opts.parallel {
        let mut out = Vec::with_capacity(range.len_frames().min(4096) as usize);
        let mut values = Vec::with_capacity(channel.components());
        for f in range.frames() {
            let time = fps.frames_to_secs(f.0);
            channel.sample_into(time, &mut values)?;
            out.push(FrameSamples {
                frame: f,
                time,
                values: values.clone(),
            });
        }
        return Ok(out);
    }

    let pool = build_thread_pool(opts.threads)?;
    let frames: Vec<FrameIndex> = range.frames().collect();
    let out = pool.install(|| {
        frames
            .par_iter()
            .map(|&f| sample_one(f))
            .collect::<CurveResult<Vec<_>>>()
    })?;
    tracing::debug!(frames = out.len(), "sampled frame range in parallel");
    Ok(out)
}

/// Sample one curve at the start of every frame in `range`.
#[tracing::instrument(skip(curve, opts))]
pub fn sample_curve_frames(
    curve: &Curve,
    fps: Fps,
    range: FrameRange,
    opts: &EvalOpts,
) -> CurveResult<Vec<f64>> {
    if !opts.parallel {
        return range
            .frames()
            .map(|f| curve.sample(fps.frames_to_secs(f.0)))
            .collect();
    }

    let pool = build_thread_pool(opts.threads)?;
    let frames: Vec<FrameIndex> = range.frames().collect();
    pool.install(|| {
        frames
            .par_iter()
            .map(|f| curve.sample(fps.frames_to_secs(f.0)))
            .collect()
    })
}

fn build_thread_pool(threads: Option<usize>) -> CurveResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(CurveError::invalid_value(
            "eval 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| CurveError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/eval/frames.rs"]
mod tests;
