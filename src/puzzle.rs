use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::errors::PuzzleError;
use crate::{Direction, GridCoord};

/// Normalize a letter for storage in the grid or the dictionary: letters and digits are kept,
/// upper-cased when that yields a single character. Anything else is rejected.
pub fn normalize_letter(letter: char) -> Option<char> {
    if !letter.is_alphanumeric() {
        return None;
    }
    let mut upper = letter.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => Some(single),
        _ => Some(letter),
    }
}

/// The static description of a puzzle to fill: its dimensions, its shaded boxes and the
/// letters fixed before solving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleDefinition {
    width: usize,
    height: usize,
    shaded: BTreeSet<GridCoord>,
    // Kept as a list so that two different letters given for one box can be reported.
    prefilled: Vec<(GridCoord, char)>,
}

impl PuzzleDefinition {
    /// An empty puzzle of the given size, with no shaded or pre-filled box.
    pub fn new(width: usize, height: usize) -> PuzzleDefinition {
        PuzzleDefinition {
            width,
            height,
            shaded: BTreeSet::new(),
            prefilled: vec![],
        }
    }

    pub fn with_shaded(mut self, position: GridCoord) -> PuzzleDefinition {
        self.shaded.insert(position);
        self
    }

    pub fn with_prefilled(mut self, position: GridCoord, letter: char) -> PuzzleDefinition {
        self.prefilled.push((position, letter));
        self
    }

    /// Pre-fill a run of boxes starting at `start`, one box per character of `fill`, skipping
    /// `.` characters.
    pub fn with_fill(mut self, start: GridCoord, direction: Direction, fill: &str) -> PuzzleDefinition {
        for (offset, letter) in fill.chars().enumerate() {
            if letter != '.' {
                self.prefilled.push((direction.step(start, offset), letter));
            }
        }
        self
    }

    /// Parse a grid from a string template, with `.` representing empty boxes, `#` representing
    /// shaded boxes, and letters representing themselves.
    pub fn from_template(template: &str) -> Result<PuzzleDefinition, PuzzleError> {
        let rows: Vec<Vec<char>> = template
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().collect())
            .collect();

        let width = rows.first().map(Vec::len).ok_or(PuzzleError::EmptyTemplate)?;
        let mut puzzle = PuzzleDefinition::new(width, rows.len());

        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(PuzzleError::RaggedTemplate {
                    row: y,
                    expected: width,
                    actual: row.len(),
                });
            }
            for (x, &cell) in row.iter().enumerate() {
                match cell {
                    '#' => puzzle = puzzle.with_shaded((x, y)),
                    '.' => {}
                    letter => puzzle = puzzle.with_prefilled((x, y), letter),
                }
            }
        }

        puzzle.validate()?;
        Ok(puzzle)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn shaded(&self) -> &BTreeSet<GridCoord> {
        &self.shaded
    }

    pub fn is_shaded(&self, position: GridCoord) -> bool {
        self.shaded.contains(&position)
    }

    /// Check every construction rule, returning the first violation found.
    pub fn validate(&self) -> Result<(), PuzzleError> {
        self.prefilled_letters().map(|_| ())
    }

    /// The pre-filled letters, normalized and keyed by position, after validating the whole
    /// definition.
    pub fn prefilled_letters(&self) -> Result<BTreeMap<GridCoord, char>, PuzzleError> {
        if self.width == 0 || self.height == 0 {
            return Err(PuzzleError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        for &position in &self.shaded {
            self.check_bounds(position)?;
        }

        let mut letters: BTreeMap<GridCoord, char> = BTreeMap::new();
        for &(position, raw_letter) in &self.prefilled {
            self.check_bounds(position)?;
            if self.shaded.contains(&position) {
                return Err(PuzzleError::ShadedAndPrefilled { position });
            }
            let letter = normalize_letter(raw_letter)
                .ok_or(PuzzleError::InvalidLetter { position, letter: raw_letter })?;

            if let Some(&existing) = letters.get(&position) {
                if existing != letter {
                    return Err(PuzzleError::ConflictingPrefill {
                        position,
                        first: existing,
                        second: letter,
                    });
                }
            }
            letters.insert(position, letter);
        }

        Ok(letters)
    }

    fn check_bounds(&self, position: GridCoord) -> Result<(), PuzzleError> {
        if position.0 >= self.width || position.1 >= self.height {
            Err(PuzzleError::OutOfBounds {
                position,
                width: self.width,
                height: self.height,
            })
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for PuzzleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters: BTreeMap<GridCoord, char> = self.prefilled.iter().copied().collect();
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = if self.shaded.contains(&(x, y)) {
                    '#'
                } else {
                    letters.get(&(x, y)).copied().unwrap_or('.')
                };
                write!(f, "{cell}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
