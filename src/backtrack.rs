//! Dead-end recovery: pick an assigned slot near the stuck slot, blacklist its value there and
//! unassign it.

use std::cmp::Reverse;

use log::debug;
use smallvec::SmallVec;

use crate::dictionary::CachedDictionary;
use crate::engine::Crossword;
use crate::errors::GridError;
use crate::grid::Grid;
use crate::history::History;
use crate::{SlotId, MAX_CROSSINGS};

/// An assignment undone to escape a dead end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backtrack {
    /// The slot that was unassigned.
    pub slot_id: SlotId,
    /// Its former value, now eliminated for it.
    pub value: String,
    /// The slot that could not be filled.
    pub reason: SlotId,
}

/// The assigned slots whose undoing could free `stuck_slot`: those crossing it or, when none
/// is assigned, those crossing one of its unassigned neighbours.
fn backtrack_candidates(grid: &Grid, stuck_slot: SlotId) -> SmallVec<[SlotId; MAX_CROSSINGS]> {
    let crossing: SmallVec<[SlotId; MAX_CROSSINGS]> = grid
        .connected_slots(stuck_slot)
        .iter()
        .copied()
        .filter(|&slot_id| grid.is_instantiated(slot_id))
        .collect();
    if !crossing.is_empty() {
        return crossing;
    }

    let mut once_removed: SmallVec<[SlotId; MAX_CROSSINGS]> = SmallVec::new();
    for &neighbour in grid.connected_slots(stuck_slot) {
        for &slot_id in grid.connected_slots(neighbour) {
            if grid.is_instantiated(slot_id) && !once_removed.contains(&slot_id) {
                once_removed.push(slot_id);
            }
        }
    }
    once_removed
}

/// Choose which instantiated slot to unassign for `stuck_slot`: the one with the fewest
/// candidates once its own assignment is lifted, the most recently assigned among equals, then
/// the lowest id. Slots crossing `stuck_slot` are considered first, then slots two crossings
/// away. Returns `None` if neither kind is instantiated.
pub fn choose_backtrack_point(
    grid: &Grid,
    dictionary: &CachedDictionary,
    history: &History,
    stuck_slot: SlotId,
) -> Result<Option<SlotId>, GridError> {
    let mut ranked: SmallVec<[((usize, Reverse<Option<u64>>, SlotId), SlotId); MAX_CROSSINGS]> =
        SmallVec::new();

    for slot_id in backtrack_candidates(grid, stuck_slot) {
        let probe = grid.probe_unassignments(&[slot_id])?;
        let count = dictionary.reevaluated_candidate_count(&probe, slot_id, &[slot_id]);
        ranked.push(((count, Reverse(history.stamp(slot_id)), slot_id), slot_id));
    }

    Ok(ranked.into_iter().min().map(|(_, slot_id)| slot_id))
}

/// Escape the dead end at `stuck_slot`. The chosen slot's value is eliminated, the slot is
/// unassigned, and the caches of it and its neighbours are rebuilt.
///
/// Returns `None` when nothing can be undone, i.e. the grid cannot be filled.
pub fn backtrack(crossword: &mut Crossword, stuck_slot: SlotId) -> Result<Option<Backtrack>, GridError> {
    let Some(slot_id) = choose_backtrack_point(
        &crossword.grid,
        &crossword.dictionary,
        &crossword.history,
        stuck_slot,
    )?
    else {
        return Ok(None);
    };

    let value = crossword.grid.unassign(slot_id)?;
    crossword.eliminations.eliminate(slot_id, &value, stuck_slot);
    crossword.dictionary.forbid(slot_id, &value);
    crossword.dictionary.invalidate(&crossword.grid, slot_id);
    crossword.history.record_unassignment(slot_id);

    debug!("Slot {stuck_slot} is stuck, unassigned {value} from slot {slot_id}");

    Ok(Some(Backtrack {
        slot_id,
        value,
        reason: stuck_slot,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::PuzzleDefinition;
    use crate::word_list::WordList;

    fn crossword(template: &str, words: &[&str]) -> Crossword {
        let puzzle = PuzzleDefinition::from_template(template).unwrap();
        Crossword::new(&puzzle, &WordList::new(words)).unwrap()
    }

    /// A.
    /// ..
    #[test]
    fn test_fewest_candidates_first() {
        let mut crossword = crossword("A.\n..", &["AB", "AC", "BD", "CD", "XY"]);
        crossword.assign(2, "AB").unwrap();
        crossword.assign(3, "CD").unwrap();

        // Lifted, slot 2 still reads A. (AB, AC) while slot 3 reads .. (every word).
        assert_eq!(
            choose_backtrack_point(&crossword.grid, &crossword.dictionary, &crossword.history, 0),
            Ok(Some(2))
        );
    }

    /// ..
    /// ..
    #[test]
    fn test_most_recent_breaks_ties() {
        let mut crossword = crossword("..\n..", &["AA", "AB", "BB"]);
        crossword.assign(3, "AB").unwrap();
        crossword.assign(2, "AB").unwrap();

        assert_eq!(
            choose_backtrack_point(&crossword.grid, &crossword.dictionary, &crossword.history, 0),
            Ok(Some(2))
        );
    }

    #[test]
    fn test_backtrack_eliminates_and_unassigns() {
        let mut crossword = crossword("A.\n..", &["AB", "AC", "BD", "CD", "XY"]);
        crossword.assign(2, "AB").unwrap();
        crossword.assign(3, "CD").unwrap();

        let backtrack = backtrack(&mut crossword, 0).unwrap().unwrap();
        assert_eq!(
            backtrack,
            Backtrack { slot_id: 2, value: "AB".to_string(), reason: 0 }
        );
        assert!(!crossword.grid.is_instantiated(2));
        assert!(crossword.eliminations.is_eliminated(2, "AB"));
        assert_eq!(crossword.dictionary.candidates(2).collect::<Vec<_>>(), vec!["AC"]);
        assert_eq!(crossword.history.stamp(2), None);
        // the pre-filled A and the C held by slot 3 survive
        assert_eq!(crossword.grid.pattern(0).to_string(), "AC");
        assert_eq!(crossword.grid.pattern(2).to_string(), "A.");
    }

    /// ..
    /// .#
    /// ..
    #[test]
    fn test_falls_back_to_slots_two_crossings_away() {
        let mut crossword = crossword("..\n.#\n..", &["AB", "CD", "AXX", "AYY", "CZA"]);
        crossword.assign(0, "AB").unwrap();

        // the bottom row only crosses the unassigned down slot, which crosses the top row
        assert_eq!(
            choose_backtrack_point(&crossword.grid, &crossword.dictionary, &crossword.history, 1),
            Ok(Some(0))
        );

        let backtrack = backtrack(&mut crossword, 1).unwrap().unwrap();
        assert_eq!(
            backtrack,
            Backtrack { slot_id: 0, value: "AB".to_string(), reason: 1 }
        );
        assert_eq!(crossword.dictionary.candidates(0).collect::<Vec<_>>(), vec!["CD"]);
        assert_eq!(crossword.dictionary.candidate_count(2), 3);
        assert_eq!(crossword.grid.pattern(2).to_string(), "...");
    }

    #[test]
    fn test_nothing_to_undo() {
        let mut crossword = crossword("..\n..", &["AB"]);
        assert_eq!(backtrack(&mut crossword, 0), Ok(None));
        assert!(crossword.eliminations.is_empty());
    }
}
