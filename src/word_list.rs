//! The word source the solver draws candidates from.
//!
//! The solver only needs two things from a word source: a filtered enumeration, called once per
//! solve to seed the per-slot caches, and a membership test. [`WordList`] is the in-memory
//! implementation used by the command-line front end and the tests.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::errors::WordListError;
use crate::puzzle::normalize_letter;

/// An external source of acceptable words.
pub trait WordStore {
    /// All words accepted by `predicate`.
    fn lookup(&self, predicate: &dyn Fn(&str) -> bool) -> Vec<String>;

    /// Whether `word` belongs to this store.
    fn contains(&self, word: &str) -> bool;
}

/// Normalize a word the same way grid letters are normalized. Words containing anything other
/// than letters and digits are rejected.
pub fn normalize_word(word: &str) -> Option<String> {
    word.trim().chars().map(normalize_letter).collect()
}

/// An in-memory, de-duplicated, sorted word list.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: Vec<String>,
    index: HashSet<String>,
}

impl WordList {
    /// Build a word list from raw words. Words are normalized; unusable entries are dropped.
    pub fn new<I, S>(words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words: Vec<String> = words
            .into_iter()
            .filter_map(|word| normalize_word(word.as_ref()))
            .filter(|word| !word.is_empty())
            .collect();

        // `dedup` only removes adjacent duplicates.
        words.sort();
        words.dedup();

        let index = words.iter().cloned().collect();
        WordList { words, index }
    }

    /// Parse a word list where each line is either `word` or `word;score`. Lines scoring below
    /// `min_score` are skipped; lines without a score are always kept.
    pub fn parse_from_str(contents: &str, min_score: i32) -> Result<WordList, WordListError> {
        let mut words = Vec::new();

        for (line_idx, raw_line) in contents.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            match line.split_once(';') {
                Some((word, score_raw)) => {
                    let score: i32 = score_raw.trim().parse().map_err(|_| {
                        WordListError::InvalidScore {
                            line: line_idx + 1,
                            value: score_raw.trim().to_string(),
                        }
                    })?;
                    if score >= min_score {
                        words.push(word);
                    }
                }
                None => words.push(line),
            }
        }

        Ok(WordList::new(words))
    }

    /// Read and parse a word list file, see [`WordList::parse_from_str`].
    pub fn load_from_path<P: AsRef<Path>>(path: P, min_score: i32) -> Result<WordList, WordListError> {
        let contents = fs::read_to_string(path)?;
        WordList::parse_from_str(&contents, min_score)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl WordStore for WordList {
    fn lookup(&self, predicate: &dyn Fn(&str) -> bool) -> Vec<String> {
        self.words.iter().filter(|word| predicate(word)).cloned().collect()
    }

    fn contains(&self, word: &str) -> bool {
        self.index.contains(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_and_dedups() {
        let list = WordList::new(["cat", "Dog", "CAT", " emu ", "o'neil", ""]);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["CAT", "DOG", "EMU"]);
        assert!(list.contains("DOG"));
        assert!(!list.contains("dog"));
    }

    #[test]
    fn test_parse_scores() {
        let list = WordList::parse_from_str("able;50\nacid;20\n\narea\n", 30).unwrap();
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["ABLE", "AREA"]);
    }

    #[test]
    fn test_parse_invalid_score() {
        let err = WordList::parse_from_str("able;50\nacid;lots\n", 0).unwrap_err();
        match err {
            WordListError::InvalidScore { line, value } => {
                assert_eq!(line, 2);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_lookup_with_predicate() {
        let list = WordList::new(["ab", "abc", "bcd", "cd"]);
        assert_eq!(list.lookup(&|word: &str| word.len() == 3), vec!["ABC", "BCD"]);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            WordList::load_from_path("does/not/exist.dict", 0),
            Err(WordListError::Io(_))
        ));
    }
}
