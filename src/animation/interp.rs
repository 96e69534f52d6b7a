use std::f64::consts::FRAC_PI_2;

use kurbo::{CubicBez, ParamCurve, ParamCurveDeriv, Point};

use crate::animation::keyframe::{Interpolation, Keyframe, TangentMode};

const SOLVE_MAX_ITERS: usize = 48;
const SOLVE_TOLERANCE: f64 = 1e-12;

impl Interpolation {
    /// Value between `left` and `right` at `u`, where `left.time <= u <= right.time`.
    pub fn interpolate(self, left: &Keyframe, right: &Keyframe, u: f64) -> f64 {
        match self {
            Self::Constant => left.value,
            Self::Linear => lerp(left, right, u),
            Self::Spline => spline(left, right, u),
        }
    }
}

fn lerp(left: &Keyframe, right: &Keyframe, u: f64) -> f64 {
    let t = (u - left.time) / (right.time - left.time);
    left.value + (right.value - left.value) * t
}

/// Bezier segment in (time, value) space for the outgoing side of `left` and the incoming side
/// of `right`.
pub(crate) fn segment_bezier(left: &Keyframe, right: &Keyframe) -> CubicBez {
    let dt = right.time - left.time;
    // Handles whose combined length exceeds the segment would fold the time axis back on itself.
    let total = left.out_weight + right.in_weight;
    let scale = if total > 1.0 { 1.0 / total } else { 1.0 };
    let out_len = left.out_weight * scale * dt;
    let in_len = right.in_weight * scale * dt;

    CubicBez::new(
        Point::new(left.time, left.value),
        Point::new(left.time + out_len, left.value + left.out_slope() * out_len),
        Point::new(right.time - in_len, right.value - right.in_slope() * in_len),
        Point::new(right.time, right.value),
    )
}

fn spline(left: &Keyframe, right: &Keyframe, u: f64) -> f64 {
    let seg = segment_bezier(left, right);
    let s = solve_param_for_time(&seg, u);
    seg.eval(s).y
}

/// Find the Bezier parameter whose time coordinate is `u`.
///
/// The time coordinate is monotonic because handles never cross, so Newton steps are kept inside
/// a shrinking bisection bracket.
fn solve_param_for_time(seg: &CubicBez, u: f64) -> f64 {
    let span = seg.p3.x - seg.p0.x;
    if span <= 0.0 {
        return 0.0;
    }
    let deriv = seg.deriv();
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    let mut s = ((u - seg.p0.x) / span).clamp(0.0, 1.0);

    for _ in 0..SOLVE_MAX_ITERS {
        let err = seg.eval(s).x - u;
        if err.abs() <= SOLVE_TOLERANCE * span.max(1.0) {
            break;
        }
        if err > 0.0 {
            hi = s;
        } else {
            lo = s;
        }
        let dx = deriv.eval(s).x;
        let newton = s - err / dx;
        s = if dx.abs() > f64::EPSILON && newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
    }
    s
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    In,
    Out,
}

fn slope_between(a: &Keyframe, b: &Keyframe) -> f64 {
    (b.value - a.value) / (b.time - a.time)
}

/// Slope for an automatic tangent mode, or `None` for explicit tangents.
fn auto_slope(
    mode: TangentMode,
    side: Side,
    prev: Option<&Keyframe>,
    cur: &Keyframe,
    next: Option<&Keyframe>,
) -> Option<f64> {
    let slope = match mode {
        TangentMode::Tangent => return None,
        TangentMode::Constant | TangentMode::Horizontal => 0.0,
        TangentMode::Linear => {
            let neighbor = match side {
                Side::In => prev,
                Side::Out => next,
            };
            match neighbor {
                Some(n) => slope_between(cur, n),
                None => 0.0,
            }
        }
        TangentMode::Cubic => match (prev, next) {
            (Some(p), Some(n)) => slope_between(p, n),
            (Some(p), None) => slope_between(p, cur),
            (None, Some(n)) => slope_between(cur, n),
            (None, None) => 0.0,
        },
        TangentMode::Smooth => match (prev, next) {
            (Some(p), Some(n)) => {
                if (cur.value - p.value) * (n.value - cur.value) <= 0.0 {
                    0.0
                } else {
                    slope_between(p, n)
                }
            }
            _ => 0.0,
        },
    };
    Some(slope)
}

/// Tangent angle for `slope`, kept strictly inside (-pi/2, pi/2).
///
/// `atan` rounds to exactly pi/2 once |slope| passes roughly 4.5e15.
pub(crate) fn slope_angle(slope: f64) -> f64 {
    let max = f64::from_bits(FRAC_PI_2.to_bits() - 1);
    slope.atan().clamp(-max, max)
}

/// Refresh the automatic tangents of `points[idx]` from its immediate neighbors.
///
/// Only the point itself is written; callers pass each point whose neighborhood changed.
pub(crate) fn recompute_tangents(points: &mut [Keyframe], idx: usize) {
    if idx >= points.len() {
        return;
    }
    let (before, rest) = points.split_at_mut(idx);
    let Some((cur, after)) = rest.split_first_mut() else {
        return;
    };
    let prev = before.last();
    let next = after.first();

    if cur.broken {
        if let Some(slope) = auto_slope(cur.in_mode, Side::In, prev, cur, next) {
            cur.in_angle = slope_angle(slope);
        }
        if let Some(slope) = auto_slope(cur.out_mode, Side::Out, prev, cur, next) {
            cur.out_angle = slope_angle(slope);
        }
    } else if let Some(slope) = auto_slope(cur.out_mode, Side::Out, prev, cur, next) {
        let angle = slope_angle(slope);
        cur.in_angle = angle;
        cur.out_angle = angle;
    } else {
        cur.in_angle = cur.out_angle;
    }
    tracing::trace!(
        time = cur.time,
        in_angle = cur.in_angle,
        out_angle = cur.out_angle,
        "tangents recomputed"
    );
}

#[cfg(test)]
#[path = "../../tests/unit/animation/interp.rs"]
mod tests;
