use crate::dictionary::CachedDictionary;
use crate::grid::Grid;
use crate::SlotId;

/// Choose the next slot to fill: the unassigned slot with the fewest current candidates, lowest id
/// first among equals. Returns `None` once every slot is assigned.
pub fn choose_slot(grid: &Grid, dictionary: &CachedDictionary) -> Option<SlotId> {
    grid.unassigned_slots()
        .min_by_key(|&slot_id| (dictionary.candidate_count(slot_id), slot_id))
}
