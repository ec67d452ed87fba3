use std::collections::{BTreeMap, BTreeSet};

use crate::SlotId;

/// Values that must never be proposed again for a slot during the current solve, each with the
/// slots whose dead ends caused the elimination.
///
/// Entries are only ever added, which is what guarantees the search terminates: every backtrack
/// removes at least one value from the candidate space of some slot.
#[derive(Debug, Clone, Default)]
pub struct EliminationSpace {
    eliminations: BTreeMap<SlotId, BTreeMap<String, BTreeSet<SlotId>>>,
    len: usize,
}

impl EliminationSpace {
    pub fn new() -> EliminationSpace {
        EliminationSpace::default()
    }

    /// Forbid `value` for `slot_id` because `reason` could not be filled. Returns whether the
    /// value was newly eliminated; eliminating it again only records the additional reason.
    pub fn eliminate(&mut self, slot_id: SlotId, value: &str, reason: SlotId) -> bool {
        let values = self.eliminations.entry(slot_id).or_default();
        let added = !values.contains_key(value);
        values.entry(value.to_string()).or_default().insert(reason);
        if added {
            self.len += 1;
        }
        added
    }

    pub fn is_eliminated(&self, slot_id: SlotId, value: &str) -> bool {
        self.eliminations
            .get(&slot_id)
            .map_or(false, |values| values.contains_key(value))
    }

    /// The values eliminated for `slot_id`, in lexicographic order.
    pub fn eliminated_values(&self, slot_id: SlotId) -> impl Iterator<Item = &str> {
        self.eliminations
            .get(&slot_id)
            .into_iter()
            .flat_map(|values| values.keys().map(String::as_str))
    }

    /// The slots that caused `value` to be eliminated for `slot_id`.
    pub fn reasons(&self, slot_id: SlotId, value: &str) -> Option<&BTreeSet<SlotId>> {
        self.eliminations.get(&slot_id)?.get(value)
    }

    /// The total number of eliminated (slot, value) pairs.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eliminate() {
        let mut space = EliminationSpace::new();
        assert!(space.is_empty());

        assert!(space.eliminate(2, "CAT", 5));
        assert!(space.eliminate(2, "ANT", 5));
        assert!(!space.eliminate(2, "CAT", 7));
        assert!(space.eliminate(3, "CAT", 2));

        assert_eq!(space.len(), 3);
        assert!(space.is_eliminated(2, "CAT"));
        assert!(!space.is_eliminated(4, "CAT"));
        assert_eq!(space.eliminated_values(2).collect::<Vec<_>>(), vec!["ANT", "CAT"]);
        assert_eq!(space.eliminated_values(9).count(), 0);
        assert_eq!(
            space.reasons(2, "CAT").map(|reasons| reasons.iter().copied().collect::<Vec<_>>()),
            Some(vec![5, 7])
        );
        assert_eq!(space.reasons(2, "DOG"), None);
    }
}
