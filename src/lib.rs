//! Crossword grid filling by dynamic backtracking.
//!
//! Given a [`PuzzleDefinition`] (dimensions, shaded boxes, pre-filled letters) and a
//! [`WordStore`], the Ginsberg solver assigns a word to every slot of the grid so that crossing
//! slots agree on their shared letter. The search picks the most constrained slot first, the
//! least constraining word for it, and on a dead end unassigns and blacklists a crossing word.

pub mod backtrack;
pub mod candidate;
pub mod dictionary;
pub mod elimination;
pub mod engine;
pub mod errors;
pub mod grid;
pub mod history;
pub mod log;
pub mod puzzle;
pub mod result;
pub mod slot_selection;
pub mod trie;
pub mod word_list;

use std::fmt;

pub use engine::{CancellationToken, NeverCancelled, ProgressListener, SolverConfig};
pub use errors::{GridError, PuzzleError, SolverError, WordListError};
pub use puzzle::PuzzleDefinition;
pub use result::{ResultKind, SolverResult, Statistics};
pub use word_list::{WordList, WordStore};

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

/// The expected maximum number of slots crossing a single slot, i.e. its maximum length.
pub const MAX_CROSSINGS: usize = MAX_SLOT_LENGTH;

/// The expected maximum number of slots appearing in a grid.
pub const MAX_SLOT_COUNT: usize = 256;

/// An identifier for a given slot, based on its index in the grid's slot table.
pub type SlotId = usize;

/// Zero-indexed x and y coords for a cell in the grid, where y = 0 in the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    /// The coordinates of the cell `offset` boxes away from `start` in this direction.
    pub fn step(self, start: GridCoord, offset: usize) -> GridCoord {
        match self {
            Direction::Across => (start.0 + offset, start.1),
            Direction::Down => (start.0, start.1 + offset),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => write!(f, "across"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// A crossword solving backend. Backends are interchangeable behind this contract and are
/// looked up by name with [`solver_by_name`].
pub trait CrosswordSolver {
    /// The name used to select this backend.
    fn name(&self) -> &str;

    /// A one-line human readable description.
    fn description(&self) -> &str;

    /// Fill the given puzzle with words from the given word store.
    ///
    /// An unfillable grid is not an error: it comes back as an `Ok` result of kind
    /// [`ResultKind::Impossible`].
    fn solve(
        &self,
        puzzle: &PuzzleDefinition,
        words: &dyn WordStore,
        abort: &dyn CancellationToken,
        progress: &mut dyn ProgressListener,
    ) -> Result<SolverResult, SolverError>;
}

/// The dynamic backtracking solver.
#[derive(Debug, Clone, Default)]
pub struct GinsbergSolver {
    config: SolverConfig,
}

impl GinsbergSolver {
    pub const NAME: &'static str = "ginsberg";

    pub fn new() -> GinsbergSolver {
        GinsbergSolver::default()
    }

    pub fn with_config(config: SolverConfig) -> GinsbergSolver {
        GinsbergSolver { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}

impl CrosswordSolver for GinsbergSolver {
    fn name(&self) -> &str {
        GinsbergSolver::NAME
    }

    fn description(&self) -> &str {
        "Dynamic backtracking with most-constrained slot and least-constraining word heuristics"
    }

    fn solve(
        &self,
        puzzle: &PuzzleDefinition,
        words: &dyn WordStore,
        abort: &dyn CancellationToken,
        progress: &mut dyn ProgressListener,
    ) -> Result<SolverResult, SolverError> {
        engine::solve(puzzle, words, &self.config, abort, progress)
    }
}

/// All available solver backends with the default configuration, default first.
pub fn solvers() -> Vec<Box<dyn CrosswordSolver + Send>> {
    solvers_with_config(&SolverConfig::default())
}

/// All available solver backends with the given configuration, default first.
pub fn solvers_with_config(config: &SolverConfig) -> Vec<Box<dyn CrosswordSolver + Send>> {
    vec![Box::new(GinsbergSolver::with_config(config.clone()))]
}

/// Look up a solver backend by its (case-insensitive) name.
pub fn solver_by_name(name: &str) -> Option<Box<dyn CrosswordSolver + Send>> {
    solver_by_name_with_config(name, &SolverConfig::default())
}

pub fn solver_by_name_with_config(
    name: &str,
    config: &SolverConfig,
) -> Option<Box<dyn CrosswordSolver + Send>> {
    solvers_with_config(config)
        .into_iter()
        .find(|solver| solver.name().eq_ignore_ascii_case(name.trim()))
}

/// Fill the given puzzle with the default solver and configuration, without cancellation.
pub fn find_fill(
    puzzle: &PuzzleDefinition,
    words: &dyn WordStore,
) -> Result<SolverResult, SolverError> {
    GinsbergSolver::new().solve(puzzle, words, &NeverCancelled, &mut ())
}
