use crate::animation::curve::Curve;
use crate::command::keyframe::KeyframeCommand;
use crate::foundation::error::CurveResult;

/// Reversible edit applied to a [`Curve`].
///
/// `apply` may refresh whatever state `revert` needs (for example the keyframe an insert
/// overwrote), so a command must be reverted against the curve it was last applied to.
pub trait Command {
    /// Human-readable label shown in undo/redo lists.
    fn name(&self) -> &str;
    /// Non-undoable commands are executed but never recorded.
    fn is_undoable(&self) -> bool {
        true
    }
    /// Perform the edit. On error the curve is left as it was.
    fn apply(&mut self, curve: &mut Curve) -> CurveResult<()>;
    /// Undo a previous `apply`.
    fn revert(&mut self, curve: &mut Curve) -> CurveResult<()>;
}

/// Linear undo/redo history for curve edits.
///
/// Executing a new undoable command drops everything that could have been redone. The history is
/// plain data and can be persisted and replayed.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UndoRedoStack<C = KeyframeCommand> {
    undo: Vec<C>,
    redo: Vec<C>,
}

impl<C> Default for UndoRedoStack<C> {
    fn default() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }
}

impl<C: Command> UndoRedoStack<C> {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `cmd` to `curve` and record it when it is undoable.
    ///
    /// A rejected command is not recorded and leaves the history untouched.
    pub fn add_and_execute(&mut self, mut cmd: C, curve: &mut Curve) -> CurveResult<()> {
        if let Err(e) = cmd.apply(curve) {
            tracing::warn!(command = cmd.name(), error = %e, "edit rejected");
            return Err(e);
        }
        tracing::debug!(command = cmd.name(), "edit applied");
        self.add(cmd);
        Ok(())
    }

    /// Record an already-applied command.
    pub fn add(&mut self, cmd: C) {
        if cmd.is_undoable() {
            self.undo.push(cmd);
            self.redo.clear();
        }
    }

    /// Revert the most recent command. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, curve: &mut Curve) -> CurveResult<bool> {
        let Some(mut cmd) = self.undo.pop() else {
            return Ok(false);
        };
        if let Err(e) = cmd.revert(curve) {
            tracing::warn!(command = cmd.name(), error = %e, "undo failed");
            self.undo.push(cmd);
            return Err(e);
        }
        tracing::debug!(command = cmd.name(), "undo");
        self.redo.push(cmd);
        Ok(true)
    }

    /// Re-apply the most recently undone command. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self, curve: &mut Curve) -> CurveResult<bool> {
        let Some(mut cmd) = self.redo.pop() else {
            return Ok(false);
        };
        if let Err(e) = cmd.apply(curve) {
            tracing::warn!(command = cmd.name(), error = %e, "redo failed");
            self.redo.push(cmd);
            return Err(e);
        }
        tracing::debug!(command = cmd.name(), "redo");
        self.undo.push(cmd);
        Ok(true)
    }

    /// Return `true` when [`UndoRedoStack::undo`] has something to revert.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Return `true` when [`UndoRedoStack::redo`] has something to re-apply.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Names of undoable commands, most recent first.
    pub fn undo_names(&self) -> Vec<&str> {
        self.undo.iter().rev().map(|c| c.name()).collect()
    }

    /// Names of redoable commands, next redo first.
    pub fn redo_names(&self) -> Vec<&str> {
        self.redo.iter().rev().map(|c| c.name()).collect()
    }

    /// Forget the whole history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/command/stack.rs"]
mod tests;
