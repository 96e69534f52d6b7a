/// Convenience result type used across keycurve.
pub type CurveResult<T> = Result<T, CurveError>;

/// Error taxonomy for curve mutation, sampling, editing commands and persistence.
///
/// Every mutating call is atomic with respect to these errors: a rejected call leaves the curve,
/// its tangents and its revision counter untouched and fires no notification.
#[derive(thiserror::Error, Debug)]
pub enum CurveError {
    /// A non-finite time was supplied as a key or a query time.
    #[error("invalid key: time {0} is not finite")]
    InvalidKey(f64),

    /// A supplied keyframe carries a non-finite value or malformed tangent data.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The curve has no points and cannot be sampled.
    #[error("empty curve: cannot sample a curve without points")]
    EmptyCurve,

    /// A strict move targeted a time that already holds a point.
    #[error("key collision: a point already exists at time {0}")]
    KeyCollision(f64),

    /// An edit referenced a keyframe that does not exist.
    #[error("missing key: no point at time {0}")]
    MissingKey(f64),

    /// Undo/redo bookkeeping failed.
    #[error("command error: {0}")]
    Command(String),

    /// Errors when serializing or deserializing curve data.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CurveError {
    /// Build a [`CurveError::InvalidValue`] value.
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }

    /// Build a [`CurveError::Command`] value.
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Build a [`CurveError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

/// Reject NaN and infinite times before they reach the ordered key set.
pub(crate) fn ensure_finite_time(time: f64) -> CurveResult<f64> {
    if time.is_finite() {
        // Fold -0.0 into 0.0 so both spellings address the same key.
        Ok(time + 0.0)
    } else {
        Err(CurveError::InvalidKey(time))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
