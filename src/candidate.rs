//! Least-constraining value ordering.
//!
//! Each candidate of the chosen slot is probed, and the size of the remaining search space is
//! estimated as the product of the refined candidate counts of every other unassigned slot. The
//! candidate leaving the largest space wins. Counts of a large grid overflow any fixed-width
//! integer, so the product is kept exactly while it fits in a `u128` and compared by its natural
//! logarithm afterwards.

use std::cmp::Ordering;
use std::num::NonZeroUsize;

use log::trace;

use crate::dictionary::CachedDictionary;
use crate::elimination::EliminationSpace;
use crate::errors::GridError;
use crate::grid::{Assignment, Grid};
use crate::SlotId;

/// An estimate of the number of fills left after a probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    exact: Option<u128>,
    ln: f64,
}

impl Estimate {
    pub const ZERO: Estimate = Estimate {
        exact: Some(0),
        ln: f64::NEG_INFINITY,
    };

    /// The empty product.
    pub const ONE: Estimate = Estimate {
        exact: Some(1),
        ln: 0.0,
    };

    pub fn from_counts<I: IntoIterator<Item = usize>>(counts: I) -> Estimate {
        let mut estimate = Estimate::ONE;
        for count in counts {
            if count == 0 {
                return Estimate::ZERO;
            }
            estimate.exact = estimate.exact.and_then(|exact| exact.checked_mul(count as u128));
            estimate.ln += (count as f64).ln();
        }
        estimate
    }

    pub fn is_zero(&self) -> bool {
        self.exact == Some(0)
    }

    /// The estimate as a power of ten.
    pub fn log10(&self) -> f64 {
        self.ln / std::f64::consts::LN_10
    }

    pub fn compare(&self, other: &Estimate) -> Ordering {
        match (self.exact, other.exact) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.ln.total_cmp(&other.ln),
        }
    }
}

/// The candidate picked for a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateChoice {
    pub value: String,
    pub estimate: Estimate,
}

/// Estimate the remaining search space if `assignment` were made.
pub fn estimate(
    grid: &Grid,
    dictionary: &CachedDictionary,
    assignment: &Assignment,
) -> Result<Estimate, GridError> {
    let probe = grid.probe(assignment)?;
    Ok(Estimate::from_counts(
        probe
            .unassigned_slots()
            .map(|slot_id| dictionary.refined_candidate_count(&probe, slot_id, assignment.slot_id)),
    ))
}

/// Choose the value for `slot_id` leaving the most room for the rest of the grid, ties going to
/// the lexicographically largest value. Eliminated values and values leaving some slot without
/// candidates are never chosen. With a `limit`, only the first `limit` viable candidates are
/// compared.
///
/// Returns `None` when no candidate is viable.
pub fn choose_candidate(
    grid: &Grid,
    dictionary: &CachedDictionary,
    eliminations: &EliminationSpace,
    slot_id: SlotId,
    limit: Option<NonZeroUsize>,
) -> Result<Option<CandidateChoice>, GridError> {
    let mut best: Option<CandidateChoice> = None;
    let mut viable = 0;

    for value in dictionary.candidates(slot_id) {
        if limit.map_or(false, |limit| viable >= limit.get()) {
            break;
        }
        if eliminations.is_eliminated(slot_id, value) {
            continue;
        }

        let estimate = estimate(grid, dictionary, &Assignment::new(slot_id, value))?;
        trace!("Slot {slot_id}: {value} leaves about 10^{:.2} fills", estimate.log10());
        if estimate.is_zero() {
            continue;
        }
        viable += 1;

        // Candidates come in lexicographic order, so an equal estimate replaces.
        let better = best
            .as_ref()
            .map_or(true, |best| estimate.compare(&best.estimate) != Ordering::Less);
        if better {
            best = Some(CandidateChoice {
                value: value.to_string(),
                estimate,
            });
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::PuzzleDefinition;
    use crate::word_list::WordList;

    fn setup(template: &str, words: &[&str]) -> (Grid, CachedDictionary) {
        let grid = Grid::new(&PuzzleDefinition::from_template(template).unwrap()).unwrap();
        let dictionary = CachedDictionary::new(&grid, &WordList::new(words));
        (grid, dictionary)
    }

    #[test]
    fn test_estimate_arithmetic() {
        assert_eq!(Estimate::from_counts([]), Estimate::ONE);
        assert!(Estimate::from_counts([3, 0, 5]).is_zero());
        assert_eq!(Estimate::from_counts([2, 3]).exact, Some(6));
        assert_eq!(Estimate::from_counts([6]).compare(&Estimate::from_counts([2, 3])), Ordering::Equal);
        assert_eq!(Estimate::from_counts([7]).compare(&Estimate::from_counts([2, 3])), Ordering::Greater);

        // beyond u128, logarithms decide
        let huge = Estimate::from_counts(vec![100_000; 10]);
        let larger = Estimate::from_counts(vec![100_000; 11]);
        assert_eq!(huge.exact, None);
        assert_eq!(larger.compare(&huge), Ordering::Greater);
        assert_eq!(Estimate::ZERO.compare(&huge), Ordering::Less);
        assert!((Estimate::from_counts([1000]).log10() - 3.0).abs() < 1e-9);
    }

    /// ..
    /// ..
    #[test]
    fn test_least_constraining_candidate_wins() {
        // Across AB leaves columns A. (AB, AD) and B. (BA, BC): 2 * 2 * 6 = 24.
        // Across BA leaves columns B. (BA, BC) and A. (AB, AD): 24 as well, BA wins the tie.
        // Every other word leaves a column with a single candidate.
        let (grid, dictionary) = setup("..\n..", &["AB", "AD", "BA", "BC", "CD", "DC"]);
        let choice = choose_candidate(&grid, &dictionary, &EliminationSpace::new(), 0, None)
            .unwrap()
            .unwrap();
        assert_eq!(choice.value, "BA");
        assert_eq!(choice.estimate.exact, Some(24));
    }

    /// ...
    /// .#.
    /// .#.
    /// ...
    #[test]
    fn test_ties_go_to_the_largest_word() {
        // ABC and PQR each leave one word per column and the three bottom row words
        let words = ["ABC", "PQR", "SET", "AXXE", "CXXG", "PXXS", "RXXT"];
        let (grid, dictionary) = setup("...\n.#.\n.#.\n...", &words);
        let choice = choose_candidate(&grid, &dictionary, &EliminationSpace::new(), 0, None)
            .unwrap()
            .unwrap();
        assert_eq!(choice.value, "PQR");
        assert_eq!(choice.estimate.exact, Some(3));
    }

    #[test]
    fn test_eliminated_values_are_skipped() {
        let (grid, dictionary) = setup("..\n..", &["AB", "AD", "BA", "BC", "CD", "DC"]);
        let mut eliminations = EliminationSpace::new();
        eliminations.eliminate(0, "BA", 2);

        let choice = choose_candidate(&grid, &dictionary, &eliminations, 0, None).unwrap().unwrap();
        assert_eq!(choice.value, "AB");
    }

    #[test]
    fn test_no_viable_candidate() {
        // every across word leaves a column without candidates
        let (grid, dictionary) = setup("..\n..", &["AB", "CD"]);
        assert_eq!(choose_candidate(&grid, &dictionary, &EliminationSpace::new(), 0, None), Ok(None));

        let (grid, dictionary) = setup("..", &[]);
        assert_eq!(choose_candidate(&grid, &dictionary, &EliminationSpace::new(), 0, None), Ok(None));
    }

    /// ...
    #[test]
    fn test_limit_bounds_the_comparison() {
        // a lone slot: every candidate estimates to the empty product, so the last one compared
        // wins
        let (grid, dictionary) = setup("...", &["ANT", "BEE", "CAT"]);
        let choice = choose_candidate(&grid, &dictionary, &EliminationSpace::new(), 0, None)
            .unwrap()
            .unwrap();
        assert_eq!(choice.value, "CAT");
        assert_eq!(choice.estimate, Estimate::ONE);

        let limit = NonZeroUsize::new(1);
        let choice = choose_candidate(&grid, &dictionary, &EliminationSpace::new(), 0, limit)
            .unwrap()
            .unwrap();
        assert_eq!(choice.value, "ANT");

        let limit = NonZeroUsize::new(2);
        let choice = choose_candidate(&grid, &dictionary, &EliminationSpace::new(), 0, limit)
            .unwrap()
            .unwrap();
        assert_eq!(choice.value, "BEE");
    }
}
