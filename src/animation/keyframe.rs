use std::f64::consts::FRAC_PI_2;

use crate::foundation::error::{CurveError, CurveResult};

/// Handle length used when a keyframe does not specify one: a third of the adjacent segment.
///
/// With this weight on both sides a spline segment is exactly the cubic Hermite segment for the
/// two slopes.
pub const DEFAULT_TANGENT_WEIGHT: f64 = 1.0 / 3.0;

fn default_weight() -> f64 {
    DEFAULT_TANGENT_WEIGHT
}

/// How the segment that starts at a keyframe is interpolated.
///
/// The left keyframe of a segment decides; the right keyframe's kind only governs the segment
/// after it.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Hold the left keyframe's value until the next keyframe.
    Constant,
    /// Straight line between the two keyframes.
    #[default]
    Linear,
    /// Cubic segment shaped by the keyframes' tangents.
    Spline,
}

/// How one side of a keyframe gets its tangent.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TangentMode {
    /// Flat; the side is held.
    Constant,
    /// Aim at the neighboring keyframe on this side.
    #[default]
    Linear,
    /// Catmull-Rom slope, flattened at local extrema so the curve never overshoots.
    Smooth,
    /// Plain Catmull-Rom slope.
    Cubic,
    /// Always flat.
    Horizontal,
    /// Explicit angle set by the editor; never recomputed.
    Tangent,
}

impl TangentMode {
    /// Return `true` when tangents in this mode are derived from the neighboring keyframes.
    pub fn is_automatic(self) -> bool {
        !matches!(self, Self::Tangent)
    }
}

/// One authored sample of a curve.
///
/// Angles are slope angles in (time, value) space: a side's slope is `angle.tan()`, so angles
/// live strictly inside `(-pi/2, pi/2)`. Weights are handle lengths as a fraction of the adjacent
/// segment's duration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    /// Key of this point inside its curve.
    pub time: f64,
    /// Value at `time`.
    pub value: f64,
    /// Interpolation of the segment starting here.
    #[serde(default)]
    pub interpolation: Interpolation,
    /// Tangent mode of the incoming side.
    #[serde(default)]
    pub in_mode: TangentMode,
    /// Tangent mode of the outgoing side.
    #[serde(default)]
    pub out_mode: TangentMode,
    /// Incoming slope angle in radians.
    #[serde(default)]
    pub in_angle: f64,
    /// Outgoing slope angle in radians.
    #[serde(default)]
    pub out_angle: f64,
    /// Incoming handle length, fraction of the previous segment.
    #[serde(default = "default_weight")]
    pub in_weight: f64,
    /// Outgoing handle length, fraction of the next segment.
    #[serde(default = "default_weight")]
    pub out_weight: f64,
    /// When `false` both sides share the outgoing side's tangent.
    #[serde(default)]
    pub broken: bool,
    /// Editor selection flag, persisted with the point.
    #[serde(default)]
    pub selected: bool,
}

impl Default for Keyframe {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Keyframe {
    /// Linear keyframe with flat default tangents.
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            time,
            value,
            interpolation: Interpolation::Linear,
            in_mode: TangentMode::Linear,
            out_mode: TangentMode::Linear,
            in_angle: 0.0,
            out_angle: 0.0,
            in_weight: DEFAULT_TANGENT_WEIGHT,
            out_weight: DEFAULT_TANGENT_WEIGHT,
            broken: false,
            selected: false,
        }
    }

    /// Step keyframe: holds `value` until the next keyframe.
    pub fn constant(time: f64, value: f64) -> Self {
        Self {
            interpolation: Interpolation::Constant,
            in_mode: TangentMode::Constant,
            out_mode: TangentMode::Constant,
            broken: true,
            ..Self::new(time, value)
        }
    }

    /// Linear keyframe.
    pub fn linear(time: f64, value: f64) -> Self {
        Self::new(time, value)
    }

    /// Spline keyframe with overshoot-free automatic tangents.
    pub fn smooth(time: f64, value: f64) -> Self {
        Self::spline(time, value, TangentMode::Smooth)
    }

    /// Spline keyframe with Catmull-Rom tangents.
    pub fn cubic(time: f64, value: f64) -> Self {
        Self::spline(time, value, TangentMode::Cubic)
    }

    /// Spline keyframe with flat tangents.
    pub fn horizontal(time: f64, value: f64) -> Self {
        Self::spline(time, value, TangentMode::Horizontal)
    }

    fn spline(time: f64, value: f64, mode: TangentMode) -> Self {
        Self {
            interpolation: Interpolation::Spline,
            in_mode: mode,
            out_mode: mode,
            ..Self::new(time, value)
        }
    }

    /// Switch to explicit spline tangents. Differing angles break the tangent.
    pub fn with_tangents(mut self, in_angle: f64, out_angle: f64) -> Self {
        self.interpolation = Interpolation::Spline;
        self.in_mode = TangentMode::Tangent;
        self.out_mode = TangentMode::Tangent;
        self.in_angle = in_angle;
        self.out_angle = out_angle;
        self.broken = in_angle != out_angle;
        self
    }

    /// Override the handle lengths.
    pub fn with_weights(mut self, in_weight: f64, out_weight: f64) -> Self {
        self.in_weight = in_weight;
        self.out_weight = out_weight;
        self
    }

    /// Set the editor selection flag.
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Slope of the incoming side.
    pub fn in_slope(&self) -> f64 {
        self.in_angle.tan()
    }

    /// Slope of the outgoing side.
    pub fn out_slope(&self) -> f64 {
        self.out_angle.tan()
    }

    /// Check the value and tangent data. The time is checked by the owning curve.
    pub fn validate(&self) -> CurveResult<()> {
        if !self.value.is_finite() {
            return Err(CurveError::invalid_value(format!(
                "keyframe value {} is not finite",
                self.value
            )));
        }
        for (side, angle) in [("in", self.in_angle), ("out", self.out_angle)] {
            if !(angle.is_finite() && angle.abs() < FRAC_PI_2) {
                return Err(CurveError::invalid_value(format!(
                    "{side} tangent angle {angle} must be finite and inside (-pi/2, pi/2)"
                )));
            }
        }
        for (side, weight) in [("in", self.in_weight), ("out", self.out_weight)] {
            if !(weight.is_finite() && weight > 0.0 && weight <= 1.0) {
                return Err(CurveError::invalid_value(format!(
                    "{side} tangent weight {weight} must be inside (0, 1]"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframe.rs"]
mod tests;
