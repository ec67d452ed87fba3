use smallvec::{smallvec, SmallVec};

use crate::{SlotId, MAX_SLOT_COUNT};

/// The order in which slots were assigned, used to rank backtrack points by recency.
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Assignment number per slot, `None` while the slot is unassigned.
    stamps: SmallVec<[Option<u64>; MAX_SLOT_COUNT]>,
    next_stamp: u64,
}

impl History {
    pub fn new(slot_count: usize) -> History {
        History {
            stamps: smallvec![None; slot_count],
            next_stamp: 0,
        }
    }

    pub fn record_assignment(&mut self, slot_id: SlotId) {
        self.stamps[slot_id] = Some(self.next_stamp);
        self.next_stamp += 1;
    }

    pub fn record_unassignment(&mut self, slot_id: SlotId) {
        self.stamps[slot_id] = None;
    }

    /// The assignment number of a slot; higher is more recent.
    pub fn stamp(&self, slot_id: SlotId) -> Option<u64> {
        self.stamps.get(slot_id).copied().flatten()
    }

    /// The currently assigned slot that was assigned last.
    pub fn most_recent(&self) -> Option<SlotId> {
        self.stamps
            .iter()
            .enumerate()
            .filter_map(|(slot_id, stamp)| stamp.map(|stamp| (stamp, slot_id)))
            .max()
            .map(|(_, slot_id)| slot_id)
    }
}
