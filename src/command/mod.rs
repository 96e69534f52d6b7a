//! Reversible, serializable keyframe edits and the undo/redo history that records them.

/// Keyframe edit commands.
pub(crate) mod keyframe;
/// The `Command` trait and the undo/redo history.
pub(crate) mod stack;
