use crate::animation::curve::Curve;
use crate::animation::keyframe::Keyframe;
use crate::command::stack::Command;
use crate::foundation::error::{CurveError, CurveResult, ensure_finite_time};

/// Serializable keyframe edit.
///
/// Constructors validate against the current curve; `apply` re-captures the state that `revert`
/// restores, so replaying a persisted history stays consistent.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyframeCommand {
    /// Insert `keyframe` at `time` or overwrite the point there.
    AddOrUpdate {
        /// Key to write.
        time: f64,
        /// New point data.
        keyframe: Keyframe,
        /// Point that was at `time` before the edit.
        #[serde(default)]
        previous: Option<Keyframe>,
    },
    /// Remove one or more points.
    Remove {
        /// Removed points, each carrying its own time.
        entries: Vec<Keyframe>,
    },
    /// Re-key one point, overwriting whatever sits at `to`.
    Move {
        /// Current key.
        from: f64,
        /// Target key.
        to: f64,
        /// Point that was at `to` before the move.
        #[serde(default)]
        overwritten: Option<Keyframe>,
    },
    /// Several edits applied and reverted as one unit.
    Macro {
        /// Label shown in undo/redo lists.
        name: String,
        /// Children in application order.
        commands: Vec<KeyframeCommand>,
    },
}

impl KeyframeCommand {
    /// Insert or overwrite the point at `time`.
    pub fn add_or_update(curve: &Curve, time: f64, keyframe: Keyframe) -> CurveResult<Self> {
        let time = ensure_finite_time(time)?;
        keyframe.validate()?;
        Ok(Self::AddOrUpdate {
            time,
            keyframe: Keyframe { time, ..keyframe },
            previous: curve.get_point(time).cloned(),
        })
    }

    /// Change only the value at `time`, keeping the existing point's interpolation and tangent
    /// settings. Creates a linear point when `time` is not keyed yet.
    pub fn set_value(curve: &Curve, time: f64, value: f64) -> CurveResult<Self> {
        let time = ensure_finite_time(time)?;
        let keyframe = match curve.get_point(time) {
            Some(existing) => Keyframe {
                value,
                ..existing.clone()
            },
            None => Keyframe::new(time, value),
        };
        Self::add_or_update(curve, time, keyframe)
    }

    /// Remove the points at `times`. Every time must be keyed.
    pub fn remove(curve: &Curve, times: &[f64]) -> CurveResult<Self> {
        let mut entries: Vec<Keyframe> = Vec::with_capacity(times.len());
        for &t in times {
            let t = ensure_finite_time(t)?;
            if entries.iter().any(|k| k.time == t) {
                continue;
            }
            let point = curve.get_point(t).ok_or(CurveError::MissingKey(t))?;
            entries.push(point.clone());
        }
        Ok(Self::Remove { entries })
    }

    /// Move the point at `from` to `to`.
    pub fn move_keyframe(curve: &Curve, from: f64, to: f64) -> CurveResult<Self> {
        let from = ensure_finite_time(from)?;
        let to = ensure_finite_time(to)?;
        if !curve.has_point_at(from) {
            return Err(CurveError::MissingKey(from));
        }
        let overwritten = if from == to {
            None
        } else {
            curve.get_point(to).cloned()
        };
        Ok(Self::Move {
            from,
            to,
            overwritten,
        })
    }

    /// Point an applied move at `new_to`, putting back whatever the previous target overwrote.
    ///
    /// Keeps a drag gesture as one undo entry. Only move commands can be retargeted.
    pub fn retarget_move(&mut self, curve: &mut Curve, new_to: f64) -> CurveResult<()> {
        let Self::Move {
            to, overwritten, ..
        } = self
        else {
            return Err(CurveError::command("only move commands can be retargeted"));
        };
        let new_to = ensure_finite_time(new_to)?;
        if *to == new_to {
            return Ok(());
        }
        if !curve.has_point_at(*to) {
            return Err(CurveError::command(format!(
                "cannot retarget move: no point at time {to}"
            )));
        }

        let displaced = curve.get_point(new_to).cloned();
        let old_to = *to;
        let restore = overwritten.take();
        let result: CurveResult<()> = curve.batch(|curve| {
            curve.move_value(old_to, new_to)?;
            if let Some(o) = restore {
                curve.add_or_update_value(old_to, o)?;
            }
            Ok(())
        });
        result?;
        *overwritten = displaced;
        *to = new_to;
        tracing::debug!(from = old_to, to = new_to, "move retargeted");
        Ok(())
    }

    /// Group `commands` under one undo entry.
    pub fn macro_command(name: impl Into<String>, commands: Vec<KeyframeCommand>) -> Self {
        Self::Macro {
            name: name.into(),
            commands,
        }
    }
}

impl Command for KeyframeCommand {
    fn name(&self) -> &str {
        match self {
            Self::AddOrUpdate { .. } => "Add or update keyframe",
            Self::Remove { entries } if entries.len() == 1 => "Remove keyframe",
            Self::Remove { .. } => "Remove keyframes",
            Self::Move { .. } => "Move keyframe",
            Self::Macro { name, .. } => name,
        }
    }

    fn apply(&mut self, curve: &mut Curve) -> CurveResult<()> {
        match self {
            Self::AddOrUpdate {
                time,
                keyframe,
                previous,
            } => {
                let before = curve.get_point(*time).cloned();
                curve.add_or_update_value(*time, keyframe.clone())?;
                *previous = before;
                Ok(())
            }
            Self::Remove { entries } => {
                if let Some(k) = entries.iter().find(|k| !curve.has_point_at(k.time)) {
                    return Err(CurveError::MissingKey(k.time));
                }
                curve.batch(|curve| {
                    for k in entries.iter_mut() {
                        if let Some(current) = curve.remove_value(k.time)? {
                            *k = current;
                        }
                    }
                    Ok(())
                })
            }
            Self::Move {
                from,
                to,
                overwritten,
            } => {
                if !curve.has_point_at(*from) {
                    return Err(CurveError::MissingKey(*from));
                }
                let before = if from == to {
                    None
                } else {
                    curve.get_point(*to).cloned()
                };
                curve.move_value(*from, *to)?;
                *overwritten = before;
                Ok(())
            }
            Self::Macro { commands, .. } => curve.batch(|curve| {
                let mut applied = 0;
                let result: CurveResult<()> = commands.iter_mut().try_for_each(|c| {
                    c.apply(curve)?;
                    applied += 1;
                    Ok(())
                });
                if let Err(e) = result {
                    for c in commands[..applied].iter_mut().rev() {
                        if let Err(undo_err) = c.revert(curve) {
                            tracing::warn!(command = c.name(), error = %undo_err, "rollback failed");
                        }
                    }
                    return Err(e);
                }
                Ok(())
            }),
        }
    }

    fn revert(&mut self, curve: &mut Curve) -> CurveResult<()> {
        match self {
            Self::AddOrUpdate { time, previous, .. } => match previous {
                Some(p) => curve.add_or_update_value(*time, p.clone()),
                None => match curve.remove_value(*time)? {
                    Some(_) => Ok(()),
                    None => Err(CurveError::command(format!(
                        "cannot undo insert: no point at time {time}"
                    ))),
                },
            },
            Self::Remove { entries } => curve.batch(|curve| {
                for k in entries.iter().rev() {
                    curve.add_or_update_value(k.time, k.clone())?;
                }
                Ok(())
            }),
            Self::Move {
                from,
                to,
                overwritten,
            } => curve.batch(|curve| {
                if !curve.move_value(*to, *from)? {
                    return Err(CurveError::command(format!(
                        "cannot undo move: no point at time {to}"
                    )));
                }
                if let Some(o) = overwritten {
                    curve.add_or_update_value(*to, o.clone())?;
                }
                Ok(())
            }),
            Self::Macro { commands, .. } => curve.batch(|curve| {
                for c in commands.iter_mut().rev() {
                    c.revert(curve)?;
                }
                Ok(())
            }),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/command/keyframe.rs"]
mod tests;
