//! The mutable puzzle state: box contents, slot definitions and their crossings.
//!
//! The slot table and the crossings never change after construction, so they live in an
//! [`Arc<Topology>`] shared by the live grid and all of its probe copies. Cloning a [`Grid`]
//! copies the box storage and the instantiation flags only.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bit_set::BitSet;
use smallvec::SmallVec;

use crate::errors::{GridError, PuzzleError};
use crate::puzzle::PuzzleDefinition;
use crate::trie::Pattern;
use crate::{Direction, GridCoord, SlotId, MAX_CROSSINGS, MAX_SLOT_LENGTH};

/// The content of one cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridBox {
    /// Writable, no letter yet.
    Empty,
    /// Writable, filled by the solver.
    Computed(char),
    /// Fixed by the puzzle definition.
    Prefilled(char),
    /// Not writable and not part of any slot.
    Shaded,
}

impl GridBox {
    pub fn letter(self) -> Option<char> {
        match self {
            GridBox::Computed(letter) | GridBox::Prefilled(letter) => Some(letter),
            GridBox::Empty | GridBox::Shaded => None,
        }
    }

    pub fn is_shaded(self) -> bool {
        self == GridBox::Shaded
    }
}

/// A crossing between one slot and another, referencing the other slot's id and the location of
/// the intersection within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// The aspects of a slot that are static during filling.
#[derive(Debug, Clone)]
pub struct SlotDefinition {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,
    connected: SmallVec<[SlotId; MAX_CROSSINGS]>,
}

impl SlotDefinition {
    /// The coords of the cell at `cell_idx` within this slot.
    pub fn cell(&self, cell_idx: usize) -> GridCoord {
        self.direction.step(self.start_cell, cell_idx)
    }

    /// The coords of each cell of this slot, in order.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| self.cell(cell_idx))
    }

    /// Ids of the slots sharing a box with this one, in increasing order.
    pub fn connected_slots(&self) -> &[SlotId] {
        &self.connected
    }

    /// The index of the cell this slot shares with `other`, if they cross.
    pub fn crossing_with(&self, other: SlotId) -> Option<usize> {
        self.crossings.iter().position(|crossing| {
            crossing.map_or(false, |crossing| crossing.other_slot_id == other)
        })
    }
}

/// The immutable shape of a grid: its size and its slots.
#[derive(Debug)]
pub struct Topology {
    width: usize,
    height: usize,
    slots: Vec<SlotDefinition>,
}

impl Topology {
    fn build(puzzle: &PuzzleDefinition) -> Topology {
        let width = puzzle.width();
        let height = puzzle.height();

        let mut runs = find_runs(puzzle, Direction::Across);
        runs.extend(find_runs(puzzle, Direction::Down));

        // (slot id, cell index) of every slot passing through each cell
        let mut slots_by_cell: Vec<SmallVec<[(SlotId, usize); 2]>> =
            vec![SmallVec::new(); width * height];
        for (slot_id, &(start_cell, direction, length)) in runs.iter().enumerate() {
            for cell_idx in 0..length {
                let (x, y) = direction.step(start_cell, cell_idx);
                slots_by_cell[y * width + x].push((slot_id, cell_idx));
            }
        }

        let slots = runs
            .iter()
            .enumerate()
            .map(|(id, &(start_cell, direction, length))| {
                let crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]> = (0..length)
                    .map(|cell_idx| {
                        let (x, y) = direction.step(start_cell, cell_idx);
                        slots_by_cell[y * width + x]
                            .iter()
                            .find(|&&(other, _)| other != id)
                            .map(|&(other_slot_id, other_slot_cell)| Crossing {
                                other_slot_id,
                                other_slot_cell,
                            })
                    })
                    .collect();

                let mut connected: SmallVec<[SlotId; MAX_CROSSINGS]> = crossings
                    .iter()
                    .flatten()
                    .map(|crossing| crossing.other_slot_id)
                    .collect();
                connected.sort_unstable();
                connected.dedup();

                SlotDefinition {
                    id,
                    start_cell,
                    direction,
                    length,
                    crossings,
                    connected,
                }
            })
            .collect();

        Topology { width, height, slots }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn slots(&self) -> &[SlotDefinition] {
        &self.slots
    }
}

/// Find every maximal run of two or more non-shaded boxes in the given direction: across runs
/// row by row, down runs column by column.
fn find_runs(puzzle: &PuzzleDefinition, direction: Direction) -> Vec<(GridCoord, Direction, usize)> {
    let (lines, line_length) = match direction {
        Direction::Across => (puzzle.height(), puzzle.width()),
        Direction::Down => (puzzle.width(), puzzle.height()),
    };
    let coord = |line: usize, idx: usize| match direction {
        Direction::Across => (idx, line),
        Direction::Down => (line, idx),
    };

    let mut result = vec![];
    for line in 0..lines {
        let mut run_start: Option<usize> = None;
        for idx in 0..=line_length {
            let open = idx < line_length && !puzzle.is_shaded(coord(line, idx));
            if open {
                run_start.get_or_insert(idx);
            } else if let Some(start) = run_start.take() {
                if idx - start > 1 {
                    result.push((coord(line, start), direction, idx - start));
                }
            }
        }
    }
    result
}

/// A word to write into a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub slot_id: SlotId,
    pub value: String,
}

impl Assignment {
    pub fn new(slot_id: SlotId, value: impl Into<String>) -> Assignment {
        Assignment {
            slot_id,
            value: value.into(),
        }
    }
}

/// A read view of one slot of a grid.
#[derive(Clone, Copy)]
pub struct Slot<'a> {
    grid: &'a Grid,
    definition: &'a SlotDefinition,
}

impl<'a> Slot<'a> {
    pub fn id(&self) -> SlotId {
        self.definition.id
    }

    pub fn definition(&self) -> &'a SlotDefinition {
        self.definition
    }

    pub fn length(&self) -> usize {
        self.definition.length
    }

    pub fn pattern(&self) -> Pattern {
        self.grid.pattern(self.id())
    }

    pub fn value(&self) -> Option<String> {
        self.grid.value(self.id())
    }

    pub fn is_instantiated(&self) -> bool {
        self.grid.is_instantiated(self.id())
    }

    pub fn connected_slots(&self) -> &'a [SlotId] {
        self.definition.connected_slots()
    }
}

impl fmt::Debug for Slot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("id", &self.id())
            .field("start_cell", &self.definition.start_cell)
            .field("direction", &self.definition.direction)
            .field("pattern", &self.pattern().to_string())
            .field("instantiated", &self.is_instantiated())
            .finish()
    }
}

/// The live puzzle state. Cloning produces an independent copy suitable for probing.
///
/// Methods taking a [`SlotId`] panic if it is out of range, except [`Grid::assign`] and
/// [`Grid::unassign`] which report [`GridError::UnknownSlot`].
#[derive(Debug, Clone)]
pub struct Grid {
    topology: Arc<Topology>,
    boxes: Vec<GridBox>,
    instantiated: BitSet,
}

impl Grid {
    /// Build a grid from a puzzle definition, validating it first.
    pub fn new(puzzle: &PuzzleDefinition) -> Result<Grid, PuzzleError> {
        let letters = puzzle.prefilled_letters()?;
        let width = puzzle.width();

        let mut boxes = vec![GridBox::Empty; width * puzzle.height()];
        for &(x, y) in puzzle.shaded() {
            boxes[y * width + x] = GridBox::Shaded;
        }
        for (&(x, y), &letter) in &letters {
            boxes[y * width + x] = GridBox::Prefilled(letter);
        }

        let topology = Topology::build(puzzle);
        let slot_count = topology.slots.len();

        Ok(Grid {
            topology: Arc::new(topology),
            boxes,
            instantiated: BitSet::with_capacity(slot_count),
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn width(&self) -> usize {
        self.topology.width
    }

    pub fn height(&self) -> usize {
        self.topology.height
    }

    pub fn slot_count(&self) -> usize {
        self.topology.slots.len()
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot<'_>> {
        self.topology
            .slots
            .iter()
            .map(move |definition| Slot { grid: self, definition })
    }

    pub fn slot(&self, slot_id: SlotId) -> Option<Slot<'_>> {
        self.topology
            .slots
            .get(slot_id)
            .map(|definition| Slot { grid: self, definition })
    }

    pub fn definition(&self, slot_id: SlotId) -> &SlotDefinition {
        &self.topology.slots[slot_id]
    }

    pub fn box_at(&self, (x, y): GridCoord) -> GridBox {
        self.boxes[y * self.width() + x]
    }

    fn box_mut(&mut self, (x, y): GridCoord) -> &mut GridBox {
        let width = self.width();
        &mut self.boxes[y * width + x]
    }

    pub fn is_instantiated(&self, slot_id: SlotId) -> bool {
        self.instantiated.contains(slot_id)
    }

    pub fn instantiated_count(&self) -> usize {
        self.instantiated.len()
    }

    /// Ids of the slots that have not been assigned a value, in increasing order.
    pub fn unassigned_slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        (0..self.slot_count()).filter(move |&slot_id| !self.is_instantiated(slot_id))
    }

    pub fn connected_slots(&self, slot_id: SlotId) -> &[SlotId] {
        self.topology.slots[slot_id].connected_slots()
    }

    pub fn is_connected(&self, slot_id: SlotId, other: SlotId) -> bool {
        self.connected_slots(slot_id).binary_search(&other).is_ok()
    }

    /// The current letters of a slot, with wildcards for empty boxes.
    pub fn pattern(&self, slot_id: SlotId) -> Pattern {
        self.definition(slot_id)
            .cell_coords()
            .map(|coord| self.box_at(coord).letter())
            .collect()
    }

    /// The word held by a slot. Only instantiated slots have a value, even if every box of an
    /// uninstantiated slot happens to be filled by its crossings.
    pub fn value(&self, slot_id: SlotId) -> Option<String> {
        if !self.is_instantiated(slot_id) {
            return None;
        }
        self.definition(slot_id)
            .cell_coords()
            .map(|coord| self.box_at(coord).letter())
            .collect()
    }

    /// Whether `word` fits the current letters of a slot.
    pub fn is_compatible_with(&self, slot_id: SlotId, word: &str) -> bool {
        let definition = self.definition(slot_id);
        let mut length = 0;
        for (cell_idx, letter) in word.chars().enumerate() {
            if cell_idx >= definition.length {
                return false;
            }
            if let Some(existing) = self.box_at(definition.cell(cell_idx)).letter() {
                if existing != letter {
                    return false;
                }
            }
            length += 1;
        }
        length == definition.length
    }

    fn check_slot(&self, slot_id: SlotId) -> Result<(), GridError> {
        if slot_id < self.slot_count() {
            Ok(())
        } else {
            Err(GridError::UnknownSlot(slot_id))
        }
    }

    /// Write a word into a slot and mark it instantiated. The grid is left untouched on error.
    pub fn assign(&mut self, slot_id: SlotId, value: &str) -> Result<(), GridError> {
        self.check_slot(slot_id)?;
        if self.is_instantiated(slot_id) {
            return Err(GridError::AlreadyInstantiated(slot_id));
        }

        let topology = Arc::clone(&self.topology);
        let definition = &topology.slots[slot_id];
        let letters: SmallVec<[char; MAX_SLOT_LENGTH]> = value.chars().collect();
        if letters.len() != definition.length {
            return Err(GridError::LengthMismatch {
                slot_id,
                value: value.to_string(),
                expected: definition.length,
                actual: letters.len(),
            });
        }

        for (position, &letter) in definition.cell_coords().zip(&letters) {
            if let Some(existing) = self.box_at(position).letter() {
                if existing != letter {
                    return Err(GridError::AssignmentConflict {
                        slot_id,
                        value: value.to_string(),
                        position,
                        existing,
                    });
                }
            }
        }

        for (position, &letter) in definition.cell_coords().zip(&letters) {
            let cell = self.box_mut(position);
            if *cell == GridBox::Empty {
                *cell = GridBox::Computed(letter);
            }
        }
        self.instantiated.insert(slot_id);
        Ok(())
    }

    /// Clear a slot, returning the value it held. Boxes shared with another instantiated slot
    /// and pre-filled boxes keep their letter.
    pub fn unassign(&mut self, slot_id: SlotId) -> Result<String, GridError> {
        self.check_slot(slot_id)?;
        let value = self
            .value(slot_id)
            .ok_or(GridError::NotInstantiated(slot_id))?;

        let topology = Arc::clone(&self.topology);
        let definition = &topology.slots[slot_id];
        for (cell_idx, crossing) in definition.crossings.iter().enumerate() {
            let shared = crossing.map_or(false, |crossing| self.is_instantiated(crossing.other_slot_id));
            if shared {
                continue;
            }
            let cell = self.box_mut(definition.cell(cell_idx));
            if let GridBox::Computed(_) = *cell {
                *cell = GridBox::Empty;
            }
        }
        self.instantiated.remove(slot_id);
        Ok(value)
    }

    /// An independent copy of this grid with the given assignment applied.
    pub fn probe(&self, assignment: &Assignment) -> Result<Grid, GridError> {
        let mut probed = self.clone();
        probed.assign(assignment.slot_id, &assignment.value)?;
        Ok(probed)
    }

    /// An independent copy of this grid with the given slots unassigned, in order.
    pub fn probe_unassignments(&self, slot_ids: &[SlotId]) -> Result<Grid, GridError> {
        let mut probed = self.clone();
        for &slot_id in slot_ids {
            probed.unassign(slot_id)?;
        }
        Ok(probed)
    }

    /// Every box holding a letter, pre-filled or computed.
    pub fn filled_boxes(&self) -> BTreeMap<GridCoord, char> {
        let width = self.width();
        self.boxes
            .iter()
            .enumerate()
            .filter_map(|(idx, cell)| cell.letter().map(|letter| ((idx % width, idx / width), letter)))
            .collect()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.boxes.chunks(self.width()) {
            for cell in row {
                let c = match cell {
                    GridBox::Shaded => '#',
                    GridBox::Empty => '.',
                    GridBox::Computed(letter) | GridBox::Prefilled(letter) => *letter,
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(template: &str) -> Grid {
        Grid::new(&PuzzleDefinition::from_template(template).unwrap()).unwrap()
    }

    /// #..
    /// ...
    /// ..#
    #[test]
    fn test_slot_extraction() {
        let grid = grid(
            "
            #..
            ...
            ..#
            ",
        );

        let slots: Vec<(GridCoord, Direction, usize)> = grid
            .slots()
            .map(|slot| {
                let definition = slot.definition();
                (definition.start_cell, definition.direction, definition.length)
            })
            .collect();
        assert_eq!(
            slots,
            vec![
                ((1, 0), Direction::Across, 2),
                ((0, 1), Direction::Across, 3),
                ((0, 2), Direction::Across, 2),
                ((0, 1), Direction::Down, 2),
                ((1, 0), Direction::Down, 3),
                ((2, 0), Direction::Down, 2),
            ]
        );

        assert_eq!(grid.connected_slots(1), &[3, 4, 5]);
        assert_eq!(grid.connected_slots(0), &[4, 5]);
        assert!(grid.is_connected(4, 2));
        assert!(!grid.is_connected(0, 1));
        assert_eq!(grid.definition(1).crossing_with(4), Some(1));
        assert_eq!(
            grid.definition(1).crossings[2],
            Some(Crossing { other_slot_id: 5, other_slot_cell: 1 })
        );
    }

    #[test]
    fn test_single_boxes_are_not_slots() {
        let grid = grid(
            "
            .#.
            ###
            ..#
            ",
        );
        assert_eq!(grid.slot_count(), 1);
        assert_eq!(grid.definition(0).start_cell, (0, 2));
        assert!(grid.connected_slots(0).is_empty());
    }

    #[test]
    fn test_assign_and_unassign_keep_crossing_letters() {
        let mut grid = grid(
            "
            ...
            ...
            ...
            ",
        );

        grid.assign(0, "CAT").unwrap();
        grid.assign(3, "COW").unwrap();
        assert_eq!(grid.pattern(1), Pattern::parse("O.."));
        assert_eq!(grid.value(0).as_deref(), Some("CAT"));

        assert_eq!(grid.unassign(0).unwrap(), "CAT");
        assert!(!grid.is_instantiated(0));
        assert_eq!(grid.value(0), None);
        // the C is still held by slot 3
        assert_eq!(grid.pattern(0), Pattern::parse("C.."));
        assert_eq!(grid.value(3).as_deref(), Some("COW"));
        assert_eq!(grid.unassign(0), Err(GridError::NotInstantiated(0)));
    }

    #[test]
    fn test_assign_conflicts() {
        let mut grid = grid(
            "
            A..
            ...
            ...
            ",
        );

        assert_eq!(
            grid.assign(0, "BAT"),
            Err(GridError::AssignmentConflict {
                slot_id: 0,
                value: "BAT".to_string(),
                position: (0, 0),
                existing: 'A',
            })
        );
        assert_eq!(
            grid.assign(0, "ANTS"),
            Err(GridError::LengthMismatch { slot_id: 0, value: "ANTS".to_string(), expected: 3, actual: 4 })
        );
        assert_eq!(grid.assign(9, "ANT"), Err(GridError::UnknownSlot(9)));

        grid.assign(0, "ANT").unwrap();
        assert_eq!(grid.assign(0, "ANT"), Err(GridError::AlreadyInstantiated(0)));
        assert_eq!(
            grid.assign(4, "ZZZ"),
            Err(GridError::AssignmentConflict {
                slot_id: 4,
                value: "ZZZ".to_string(),
                position: (1, 0),
                existing: 'N',
            })
        );
        // a failed assignment leaves the grid untouched
        assert_eq!(grid.pattern(4), Pattern::parse("N.."));
    }

    #[test]
    fn test_unassign_never_clears_prefilled_boxes() {
        let mut grid = grid(
            "
            A.
            ..
            ",
        );

        grid.assign(0, "AB").unwrap();
        grid.unassign(0).unwrap();
        assert_eq!(grid.box_at((0, 0)), GridBox::Prefilled('A'));
        assert_eq!(grid.box_at((1, 0)), GridBox::Empty);
    }

    #[test]
    fn test_fully_filled_slot_is_not_instantiated() {
        let mut grid = grid(
            "
            ..
            ..
            ",
        );

        grid.assign(2, "AC").unwrap();
        grid.assign(3, "BD").unwrap();
        assert!(grid.pattern(0).is_complete());
        assert_eq!(grid.value(0), None);
        assert!(grid.is_compatible_with(0, "AB"));
        assert!(!grid.is_compatible_with(0, "AX"));
        assert_eq!(grid.unassigned_slots().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_probe_is_independent() {
        let grid = grid(
            "
            ...
            ...
            ...
            ",
        );

        let probed = grid.probe(&Assignment::new(0, "CAT")).unwrap();
        assert_eq!(probed.value(0).as_deref(), Some("CAT"));
        assert_eq!(grid.value(0), None);
        assert_eq!(grid.pattern(0), Pattern::any(3));

        let unprobed = probed.probe_unassignments(&[0]).unwrap();
        assert_eq!(unprobed.pattern(0), Pattern::any(3));
        assert!(probed.is_instantiated(0));
        assert_eq!(grid.filled_boxes().len(), 0);
        assert_eq!(probed.filled_boxes().get(&(2, 0)), Some(&'T'));
    }

    #[test]
    fn test_display() {
        let mut grid = grid(
            "
            #..
            ...
            ",
        );
        grid.assign(0, "HI").unwrap();
        assert_eq!(grid.to_string(), "#HI\n...\n");
    }
}
