//! Error types for puzzle construction, grid updates, word list loading and solving.

use std::io;

use crate::{GridCoord, SlotId};

/// A malformed puzzle definition. Reported before any search starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PuzzleError {
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("box {position:?} is outside of the {width}x{height} grid")]
    OutOfBounds {
        position: GridCoord,
        width: usize,
        height: usize,
    },

    #[error("box {position:?} is both shaded and pre-filled")]
    ShadedAndPrefilled { position: GridCoord },

    #[error("conflicting pre-filled letters '{first}' and '{second}' at {position:?}")]
    ConflictingPrefill {
        position: GridCoord,
        first: char,
        second: char,
    },

    #[error("invalid letter {letter:?} at {position:?}")]
    InvalidLetter { position: GridCoord, letter: char },

    #[error("empty grid template")]
    EmptyTemplate,

    #[error("template row {row} has {actual} boxes, expected {expected}")]
    RaggedTemplate {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// A rejected grid update. The search never proposes such an update, so hitting one is a bug
/// in the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("no slot with id {0}")]
    UnknownSlot(SlotId),

    #[error("value \"{value}\" has length {actual}, slot {slot_id} has length {expected}")]
    LengthMismatch {
        slot_id: SlotId,
        value: String,
        expected: usize,
        actual: usize,
    },

    #[error("value \"{value}\" for slot {slot_id} conflicts with '{existing}' at {position:?}")]
    AssignmentConflict {
        slot_id: SlotId,
        value: String,
        position: GridCoord,
        existing: char,
    },

    #[error("slot {0} is already instantiated")]
    AlreadyInstantiated(SlotId),

    #[error("slot {0} is not instantiated")]
    NotInstantiated(SlotId),
}

/// Failure to read a word list.
#[derive(Debug, thiserror::Error)]
pub enum WordListError {
    #[error("cannot read word list: {0}")]
    Io(#[from] io::Error),

    #[error("invalid score \"{value}\" on line {line}")]
    InvalidScore { line: usize, value: String },
}

/// A solve that did not run to a verdict.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolverError {
    #[error("invalid puzzle: {0}")]
    InvalidPuzzle(#[from] PuzzleError),

    #[error("solver aborted")]
    Aborted,

    #[error("internal solver error: {0}")]
    Internal(#[from] GridError),
}
