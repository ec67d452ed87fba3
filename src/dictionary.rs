//! Per-slot candidate caches, seeded once from the word store.
//!
//! Each slot has an *initial* candidate set, stored in a [`Trie`], and a *current* list of
//! candidates matching the slot's live pattern. Assignments narrow the current lists; unassignments
//! rebuild them from the initial tries.

use std::collections::HashMap;
use std::sync::Arc;

use bit_set::BitSet;
use log::debug;

use crate::grid::Grid;
use crate::trie::{Pattern, Trie};
use crate::word_list::WordStore;
use crate::SlotId;

#[derive(Debug, Clone)]
pub struct CachedDictionary {
    /// Slots whose initial pattern is identical share one trie until a value is forbidden for one
    /// of them.
    initial: Vec<Arc<Trie>>,
    current: Vec<Vec<String>>,
}

impl CachedDictionary {
    /// Build the caches for every slot of `grid`. The word store is queried exactly once.
    pub fn new(grid: &Grid, words: &dyn WordStore) -> CachedDictionary {
        let mut lengths = BitSet::new();
        for slot in grid.slots() {
            lengths.insert(slot.length());
        }
        let known_words = words.lookup(&|word: &str| lengths.contains(word.chars().count()));

        let mut tries_by_pattern: HashMap<Pattern, Arc<Trie>> = HashMap::new();
        let initial: Vec<Arc<Trie>> = grid
            .slots()
            .map(|slot| {
                let pattern = slot.pattern();
                let trie = tries_by_pattern.entry(pattern).or_insert_with_key(|pattern| {
                    Arc::new(known_words.iter().filter(|word| pattern.matches(word)).collect())
                });
                Arc::clone(trie)
            })
            .collect();

        let current = grid
            .slots()
            .map(|slot| initial[slot.id()].matching(&slot.pattern()).collect())
            .collect();

        debug!(
            "Cached dictionary built from {} words, {} distinct slot patterns",
            known_words.len(),
            tries_by_pattern.len()
        );

        CachedDictionary { initial, current }
    }

    /// The current candidates of a slot, in lexicographic order.
    pub fn candidates(&self, slot_id: SlotId) -> impl Iterator<Item = &str> {
        self.current[slot_id].iter().map(String::as_str)
    }

    pub fn candidate_count(&self, slot_id: SlotId) -> usize {
        self.current[slot_id].len()
    }

    /// The number of words left in the initial candidate set of a slot.
    pub fn initial_candidate_count(&self, slot_id: SlotId) -> usize {
        self.initial[slot_id].len()
    }

    /// The candidate count of `slot_id` in `probe`, a copy of the live grid where `probed_slot`
    /// has been hypothetically assigned. Only the current candidates are filtered, since an
    /// assignment can only shrink them.
    pub fn refined_candidate_count(&self, probe: &Grid, slot_id: SlotId, probed_slot: SlotId) -> usize {
        if slot_id != probed_slot && !probe.is_connected(slot_id, probed_slot) {
            return self.candidate_count(slot_id);
        }
        self.current[slot_id]
            .iter()
            .filter(|word| probe.is_compatible_with(slot_id, word))
            .count()
    }

    /// The candidate count of `slot_id` in `probe`, a copy of the live grid where `probed_slots`
    /// have been hypothetically unassigned. Counts from the initial candidates, since narrowing
    /// may have discarded words that become valid again.
    pub fn reevaluated_candidate_count(&self, probe: &Grid, slot_id: SlotId, probed_slots: &[SlotId]) -> usize {
        let affected = probed_slots
            .iter()
            .any(|&probed| probed == slot_id || probe.is_connected(slot_id, probed));
        if !affected {
            return self.candidate_count(slot_id);
        }
        self.initial[slot_id].matching(&probe.pattern(slot_id)).count()
    }

    /// Shrink the current candidates of `assigned_slot` and its connected slots to their live
    /// patterns, after an assignment in `grid`.
    pub fn narrow(&mut self, grid: &Grid, assigned_slot: SlotId) {
        for &slot_id in std::iter::once(&assigned_slot).chain(grid.connected_slots(assigned_slot)) {
            self.current[slot_id].retain(|word| grid.is_compatible_with(slot_id, word));
        }
    }

    /// Rebuild the current candidates of `unassigned_slot` and its connected slots from their
    /// initial candidates, after an unassignment in `grid`. Forbidden values are already gone
    /// from the initial candidates.
    pub fn invalidate(&mut self, grid: &Grid, unassigned_slot: SlotId) {
        for &slot_id in std::iter::once(&unassigned_slot).chain(grid.connected_slots(unassigned_slot)) {
            let pattern = grid.pattern(slot_id);
            self.current[slot_id] = self.initial[slot_id].matching(&pattern).collect();
        }
    }

    /// Remove `value` from the initial candidates of `slot_id` for the rest of the solve. Slots
    /// sharing the same trie are unaffected.
    pub fn forbid(&mut self, slot_id: SlotId, value: &str) {
        let removed = Arc::make_mut(&mut self.initial[slot_id]).remove_matching(&Pattern::literal(value));
        self.current[slot_id].retain(|word| word != value);
        debug!("Forbade {value} for slot {slot_id} ({removed} removed)");
    }
}
