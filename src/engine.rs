//! The search loop tying the heuristics together.
//!
//! Each iteration picks the most constrained slot and tries to fill it with its least
//! constraining candidate. When no candidate is viable, a nearby assignment is undone and its
//! value eliminated for that slot. Since eliminations are never lifted and assigned values are
//! never eliminated ones, every backtrack shrinks the search space and the loop terminates.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use instant::Instant;
use log::{debug, info};

use crate::backtrack::backtrack;
use crate::candidate::{choose_candidate, Estimate};
use crate::dictionary::CachedDictionary;
use crate::elimination::EliminationSpace;
use crate::errors::{GridError, PuzzleError, SolverError};
use crate::grid::Grid;
use crate::history::History;
use crate::puzzle::PuzzleDefinition;
use crate::result::{SolverResult, Statistics};
use crate::slot_selection::choose_slot;
use crate::word_list::WordStore;
use crate::SlotId;

/// Tunable parameters of the search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverConfig {
    /// Stop comparing candidates for a slot after this many viable ones. Unlimited by default.
    pub candidate_limit: Option<NonZeroUsize>,
}

/// A poll-only cancellation signal, checked once per iteration of the search loop.
pub trait CancellationToken {
    fn is_cancelled(&self) -> bool;
}

/// A token that is never cancelled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancelled;

impl CancellationToken for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl CancellationToken for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// An abort channel: any message cancels.
impl CancellationToken for Receiver<()> {
    fn is_cancelled(&self) -> bool {
        self.try_recv().is_ok()
    }
}

impl<T: CancellationToken + ?Sized> CancellationToken for Arc<T> {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<T: CancellationToken + ?Sized> CancellationToken for &T {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Receives the share of slots currently filled, whenever it changes.
pub trait ProgressListener {
    fn on_progress(&mut self, percent: u8);
}

impl ProgressListener for () {
    fn on_progress(&mut self, _percent: u8) {}
}

/// The state owned by one search: the live grid and everything derived from it.
#[derive(Debug, Clone)]
pub struct Crossword {
    pub(crate) grid: Grid,
    pub(crate) dictionary: CachedDictionary,
    pub(crate) eliminations: EliminationSpace,
    pub(crate) history: History,
}

impl Crossword {
    pub fn new(puzzle: &PuzzleDefinition, words: &dyn WordStore) -> Result<Crossword, PuzzleError> {
        let grid = Grid::new(puzzle)?;
        let dictionary = CachedDictionary::new(&grid, words);
        let history = History::new(grid.slot_count());
        Ok(Crossword {
            grid,
            dictionary,
            eliminations: EliminationSpace::new(),
            history,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn dictionary(&self) -> &CachedDictionary {
        &self.dictionary
    }

    pub fn eliminations(&self) -> &EliminationSpace {
        &self.eliminations
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Commit a value: write it into the grid and narrow the affected caches.
    pub fn assign(&mut self, slot_id: SlotId, value: &str) -> Result<(), GridError> {
        self.grid.assign(slot_id, value)?;
        self.dictionary.narrow(&self.grid, slot_id);
        self.history.record_assignment(slot_id);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Running,
    Solved,
    /// No assignment crossing `unsolvable_slot` was left to undo.
    Failed { unsolvable_slot: SlotId },
}

/// A search in progress over a [`Crossword`].
pub struct Search<'a> {
    crossword: Crossword,
    config: &'a SolverConfig,
    state: SearchState,
    statistics: Statistics,
    last_progress: Option<u8>,
}

impl<'a> Search<'a> {
    pub fn new(crossword: Crossword, config: &'a SolverConfig) -> Search<'a> {
        Search {
            crossword,
            config,
            state: SearchState::Running,
            statistics: Statistics::default(),
            last_progress: None,
        }
    }

    pub fn crossword(&self) -> &Crossword {
        &self.crossword
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Run one iteration of the loop. Does nothing once the search has stopped.
    pub fn step(&mut self) -> Result<SearchState, GridError> {
        if self.state != SearchState::Running {
            return Ok(self.state);
        }
        self.statistics.states += 1;

        let crossword = &mut self.crossword;
        let Some(slot_id) = choose_slot(&crossword.grid, &crossword.dictionary) else {
            self.state = SearchState::Solved;
            return Ok(self.state);
        };

        let choice = choose_candidate(
            &crossword.grid,
            &crossword.dictionary,
            &crossword.eliminations,
            slot_id,
            self.config.candidate_limit,
        )?;

        match choice {
            Some(choice) => {
                debug!("Slot {slot_id} <- {}", choice.value);
                crossword.assign(slot_id, &choice.value)?;
                self.statistics.assignments += 1;
            }
            None => match backtrack(crossword, slot_id)? {
                Some(_) => {
                    self.statistics.backtracks += 1;
                    self.statistics.eliminations += 1;
                }
                None => {
                    info!("No assignment left to undo for slot {slot_id}");
                    self.state = SearchState::Failed { unsolvable_slot: slot_id };
                }
            },
        }

        Ok(self.state)
    }

    fn report_progress(&mut self, progress: &mut dyn ProgressListener) {
        let grid = &self.crossword.grid;
        let percent = match grid.slot_count() {
            0 => 100,
            slot_count => (grid.instantiated_count() * 100 / slot_count) as u8,
        };
        if self.last_progress != Some(percent) {
            self.last_progress = Some(percent);
            progress.on_progress(percent);
        }
    }

    /// Step until the search stops, polling `abort` before every iteration.
    pub fn run(
        mut self,
        abort: &dyn CancellationToken,
        progress: &mut dyn ProgressListener,
    ) -> Result<SolverResult, SolverError> {
        let start = Instant::now();
        self.report_progress(progress);

        loop {
            if abort.is_cancelled() {
                info!("Search aborted after {} states", self.statistics.states);
                return Err(SolverError::Aborted);
            }

            let state = self.step()?;
            self.report_progress(progress);
            self.statistics.duration = start.elapsed();

            match state {
                SearchState::Running => continue,
                SearchState::Solved => {
                    info!("Solved: {}", self.statistics);
                    return Ok(SolverResult::solved(&self.crossword.grid, self.statistics));
                }
                SearchState::Failed { unsolvable_slot } => {
                    info!("Impossible: {}", self.statistics);
                    return Ok(SolverResult::impossible(
                        &self.crossword.grid,
                        unsolvable_slot,
                        self.statistics,
                    ));
                }
            }
        }
    }
}

/// Fill `puzzle` with words from `words`.
pub fn solve(
    puzzle: &PuzzleDefinition,
    words: &dyn WordStore,
    config: &SolverConfig,
    abort: &dyn CancellationToken,
    progress: &mut dyn ProgressListener,
) -> Result<SolverResult, SolverError> {
    let crossword = Crossword::new(puzzle, words)?;

    let grid = crossword.grid();
    let branches = Estimate::from_counts(
        (0..grid.slot_count()).map(|slot_id| crossword.dictionary().candidate_count(slot_id)),
    );
    info!(
        "Solving {} slots, about 10^{:.1} branches before pruning",
        grid.slot_count(),
        branches.log10()
    );

    Search::new(crossword, config).run(abort, progress)
}
