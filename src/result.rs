use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use crate::grid::Grid;
use crate::{GridCoord, SlotId};

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Iterations of the search loop.
    pub states: u64,
    pub assignments: u64,
    pub backtracks: u64,
    /// Values eliminated by backtracking, across all slots.
    pub eliminations: u64,
    pub duration: Duration,
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} states, {} assignments, {} backtracks, {} eliminations in {:.3}s",
            self.states,
            self.assignments,
            self.backtracks,
            self.eliminations,
            self.duration.as_secs_f64()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// Every slot holds a word.
    Solved,
    /// The word store cannot fill the grid.
    Impossible,
}

/// The outcome of a completed search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverResult {
    pub kind: ResultKind,
    /// Every filled box. For an impossible grid, the last grid attempted.
    pub boxes: BTreeMap<GridCoord, char>,
    /// The boxes of the slot that could not be filled, empty when solved.
    pub unsolvable_boxes: BTreeSet<GridCoord>,
    pub shaded: BTreeSet<GridCoord>,
    pub statistics: Statistics,
}

impl SolverResult {
    pub fn solved(grid: &Grid, statistics: Statistics) -> SolverResult {
        SolverResult {
            kind: ResultKind::Solved,
            boxes: grid.filled_boxes(),
            unsolvable_boxes: BTreeSet::new(),
            shaded: shaded_boxes(grid),
            statistics,
        }
    }

    pub fn impossible(grid: &Grid, unsolvable_slot: SlotId, statistics: Statistics) -> SolverResult {
        SolverResult {
            kind: ResultKind::Impossible,
            boxes: grid.filled_boxes(),
            unsolvable_boxes: grid.definition(unsolvable_slot).cell_coords().collect(),
            shaded: shaded_boxes(grid),
            statistics,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.kind == ResultKind::Solved
    }

    /// Draw the grid one row per line, with `#` for shaded boxes and `.` for unfilled ones.
    pub fn render(&self, width: usize, height: usize) -> String {
        let mut rendered = String::with_capacity((width + 1) * height);
        for y in 0..height {
            for x in 0..width {
                let cell = if self.shaded.contains(&(x, y)) {
                    '#'
                } else {
                    self.boxes.get(&(x, y)).copied().unwrap_or('.')
                };
                rendered.push(cell);
            }
            rendered.push('\n');
        }
        rendered
    }
}

fn shaded_boxes(grid: &Grid) -> BTreeSet<GridCoord> {
    (0..grid.height())
        .flat_map(|y| (0..grid.width()).map(move |x| (x, y)))
        .filter(|&coord| grid.box_at(coord).is_shaded())
        .collect()
}
