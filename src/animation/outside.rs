use crate::animation::keyframe::Keyframe;

/// How a curve is evaluated before its first or after its last keyframe.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OutsideCurveBehavior {
    /// Hold the boundary keyframe's value.
    #[default]
    Constant,
    /// Repeat the keyframed span.
    Cycle,
    /// Repeat the keyframed span, shifting each repetition by the span's value change.
    CycleWithOffset,
    /// Repeat the keyframed span, alternating direction every period.
    #[serde(alias = "oscillate")]
    PingPong,
}

/// Result of remapping an outside query time into the keyframed span.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MappedTime {
    /// Time to sample the curve at.
    pub u: f64,
    /// Value added to the sample.
    pub offset: f64,
}

impl MappedTime {
    /// Sample at `u` unchanged.
    pub fn identity(u: f64) -> Self {
        Self { u, offset: 0.0 }
    }
}

impl OutsideCurveBehavior {
    /// Remap `u` against the time-ordered `points`.
    ///
    /// In-range times, and curves with fewer than two keyframes or a zero-length span, map to
    /// themselves. `Constant` never remaps; the curve clamps afterwards.
    pub fn map(self, u: f64, points: &[Keyframe]) -> MappedTime {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return MappedTime::identity(u);
        };
        let span = last.time - first.time;
        if points.len() < 2 || span <= 0.0 || (first.time..=last.time).contains(&u) {
            return MappedTime::identity(u);
        }

        match self {
            Self::Constant => MappedTime::identity(u),
            Self::Cycle => MappedTime::identity(cycle(u, first.time, last.time).u),
            Self::CycleWithOffset => {
                let wrapped = cycle(u, first.time, last.time);
                MappedTime {
                    u: wrapped.u,
                    offset: wrapped.periods * (last.value - first.value),
                }
            }
            Self::PingPong => MappedTime::identity(ping_pong(u, first.time, last.time)),
        }
    }
}

struct Wrapped {
    u: f64,
    /// Signed number of whole spans between the query and the wrapped time; negative before the
    /// curve.
    periods: f64,
}

/// Split the distance outside the span into whole periods and a remainder.
fn split(delta: f64, span: f64) -> (f64, f64) {
    let rem = delta % span;
    let whole = ((delta - rem) / span).round();
    (whole, rem)
}

fn cycle(u: f64, first: f64, last: f64) -> Wrapped {
    let span = last - first;
    if u < first {
        let (whole, rem) = split(first - u, span);
        Wrapped {
            u: last - rem,
            periods: -(whole + 1.0),
        }
    } else {
        let (whole, rem) = split(u - last, span);
        Wrapped {
            u: first + rem,
            periods: whole + 1.0,
        }
    }
}

/// The period touching the curve on either side plays mirrored, the next one forward, and so on.
fn ping_pong(u: f64, first: f64, last: f64) -> f64 {
    let span = last - first;
    if u < first {
        let (whole, rem) = split(first - u, span);
        if whole.rem_euclid(2.0) == 0.0 {
            first + rem
        } else {
            last - rem
        }
    } else {
        let (whole, rem) = split(u - last, span);
        if whole.rem_euclid(2.0) == 0.0 {
            last - rem
        } else {
            first + rem
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/outside.rs"]
mod tests;
