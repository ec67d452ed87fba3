//! A set of words stored as a prefix tree, queried with same-length wildcard patterns.
//!
//! Nodes live in a flat arena and children are kept sorted, so every enumeration is in
//! lexicographic order. Removal only clears the terminal flag of a node; dead branches are
//! still walked by iterators. A trie lives for a single solve, so it is never compacted.

use std::fmt;

use smallvec::SmallVec;

use crate::MAX_SLOT_LENGTH;

/// Character used to display the any-character wildcard.
pub const WILDCARD: char = '.';

/// A sequence of known letters and wildcards (`None`), matching words of exactly its length.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern(SmallVec<[Option<char>; MAX_SLOT_LENGTH]>);

impl Pattern {
    /// A pattern of `length` wildcards.
    pub fn any(length: usize) -> Pattern {
        Pattern((0..length).map(|_| None).collect())
    }

    /// A pattern matching `word` only.
    pub fn literal(word: &str) -> Pattern {
        Pattern(word.chars().map(Some).collect())
    }

    /// Parse a pattern where `.` is a wildcard and any other character is a known letter.
    pub fn parse(template: &str) -> Pattern {
        template
            .chars()
            .map(|c| if c == WILDCARD { None } else { Some(c) })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The known letter at `position`, `None` for a wildcard or out of range.
    pub fn get(&self, position: usize) -> Option<char> {
        self.0.get(position).copied().flatten()
    }

    /// Whether the pattern has no wildcard left.
    pub fn is_complete(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    /// Whether `letter` is acceptable at `position`.
    pub fn accepts(&self, letter: char, position: usize) -> bool {
        match self.0.get(position) {
            Some(Some(known)) => *known == letter,
            Some(None) => true,
            None => false,
        }
    }

    pub fn matches(&self, word: &str) -> bool {
        let mut length = 0;
        for (position, letter) in word.chars().enumerate() {
            if !self.accepts(letter, position) {
                return false;
            }
            length += 1;
        }
        length == self.len()
    }
}

impl FromIterator<Option<char>> for Pattern {
    fn from_iter<I: IntoIterator<Item = Option<char>>>(iter: I) -> Pattern {
        Pattern(iter.into_iter().collect())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.0 {
            write!(f, "{}", cell.unwrap_or(WILDCARD))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct TrieNode {
    /// Children sorted by letter, as (letter, node index) pairs.
    children: Vec<(char, usize)>,
    terminal: bool,
}

impl TrieNode {
    fn child(&self, letter: char) -> Option<usize> {
        self.children
            .binary_search_by_key(&letter, |&(c, _)| c)
            .ok()
            .map(|idx| self.children[idx].1)
    }
}

/// A set of words supporting wildcard enumeration.
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    len: usize,
}

impl Default for Trie {
    fn default() -> Trie {
        Trie::new()
    }
}

impl Trie {
    const ROOT: usize = 0;

    pub fn new() -> Trie {
        Trie {
            nodes: vec![TrieNode::default()],
            len: 0,
        }
    }

    /// The number of words currently in the trie.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a word, returning whether it was absent. The empty word is never stored.
    pub fn insert(&mut self, word: &str) -> bool {
        if word.is_empty() {
            return false;
        }

        let mut current = Trie::ROOT;
        for letter in word.chars() {
            current = match self.nodes[current]
                .children
                .binary_search_by_key(&letter, |&(c, _)| c)
            {
                Ok(idx) => self.nodes[current].children[idx].1,
                Err(idx) => {
                    let new_node = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[current].children.insert(idx, (letter, new_node));
                    new_node
                }
            };
        }

        let added = !self.nodes[current].terminal;
        self.nodes[current].terminal = true;
        if added {
            self.len += 1;
        }
        added
    }

    fn find(&self, word: &str) -> Option<usize> {
        word.chars()
            .try_fold(Trie::ROOT, |node, letter| self.nodes[node].child(letter))
    }

    pub fn contains(&self, word: &str) -> bool {
        !word.is_empty() && self.find(word).map_or(false, |node| self.nodes[node].terminal)
    }

    /// Remove a word, returning whether it was present. The path to the word is left in place.
    pub fn remove(&mut self, word: &str) -> bool {
        if word.is_empty() {
            return false;
        }
        match self.find(word) {
            Some(node) if self.nodes[node].terminal => {
                self.nodes[node].terminal = false;
                self.len -= 1;
                true
            }
            _ => false,
        }
    }

    /// Remove every word matching `pattern`, returning how many were removed.
    pub fn remove_matching(&mut self, pattern: &Pattern) -> usize {
        let doomed: Vec<String> = self.matching(pattern).collect();
        doomed.iter().filter(|word| self.remove(word)).count()
    }

    /// Whether at least one word matches `pattern`.
    pub fn contains_matching(&self, pattern: &Pattern) -> bool {
        self.matching(pattern).next().is_some()
    }

    /// All words, in lexicographic order.
    pub fn iter(&self) -> Matches<'_> {
        Matches::new(self, None)
    }

    /// All words matching `pattern`, in lexicographic order.
    pub fn matching<'a>(&'a self, pattern: &'a Pattern) -> Matches<'a> {
        Matches::new(self, Some(pattern))
    }
}

impl<S: AsRef<str>> FromIterator<S> for Trie {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Trie {
        let mut trie = Trie::new();
        for word in iter {
            trie.insert(word.as_ref());
        }
        trie
    }
}

impl<'a> IntoIterator for &'a Trie {
    type Item = String;
    type IntoIter = Matches<'a>;

    fn into_iter(self) -> Matches<'a> {
        self.iter()
    }
}

/// Depth-first iterator over the words of a [`Trie`], optionally filtered by a [`Pattern`].
pub struct Matches<'a> {
    trie: &'a Trie,
    pattern: Option<&'a Pattern>,
    /// One frame per node on the current path: the node and the index of its next child.
    stack: Vec<(usize, usize)>,
    /// The letters on the current path, always one shorter than `stack`.
    word: String,
}

impl<'a> Matches<'a> {
    fn new(trie: &'a Trie, pattern: Option<&'a Pattern>) -> Matches<'a> {
        Matches {
            trie,
            pattern,
            stack: vec![(Trie::ROOT, 0)],
            word: String::new(),
        }
    }

    fn accepts(&self, letter: char, position: usize) -> bool {
        self.pattern.map_or(true, |pattern| pattern.accepts(letter, position))
    }
}

impl<'a> Iterator for Matches<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let trie = self.trie;

        while let Some(frame) = self.stack.last_mut() {
            let (node_id, child_idx) = *frame;
            let node = &trie.nodes[node_id];

            if child_idx >= node.children.len() {
                self.stack.pop();
                self.word.pop();
                continue;
            }
            frame.1 += 1;

            let (letter, child_id) = node.children[child_idx];
            let position = self.stack.len() - 1;
            if !self.accepts(letter, position) {
                continue;
            }

            let child = &trie.nodes[child_id];
            let depth = position + 1;
            let is_match = child.terminal && self.pattern.map_or(true, |p| p.len() == depth);
            let descend =
                !child.children.is_empty() && self.pattern.map_or(true, |p| depth < p.len());

            if descend {
                self.stack.push((child_id, 0));
                self.word.push(letter);
                if is_match {
                    return Some(self.word.clone());
                }
            } else if is_match {
                let mut found = self.word.clone();
                found.push(letter);
                return Some(found);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trie {
        ["CAT", "CAR", "CART", "DOG", "DOT", "AT"].into_iter().collect()
    }

    #[test]
    fn test_insert_and_contains() {
        let mut trie = sample();
        assert_eq!(trie.len(), 6);
        assert!(trie.contains("CART"));
        assert!(!trie.contains("CA"));
        assert!(!trie.insert("CAT"));
        assert!(trie.insert("CA"));
        assert!(trie.contains("CA"));
        assert!(!trie.insert(""));
        assert_eq!(trie.len(), 7);
    }

    #[test]
    fn test_iteration_is_lexicographic() {
        let words: Vec<String> = sample().iter().collect();
        assert_eq!(words, vec!["AT", "CAR", "CART", "CAT", "DOG", "DOT"]);
    }

    #[test]
    fn test_matching_requires_same_length() {
        let trie = sample();
        let three_letter: Vec<String> = trie.matching(&Pattern::any(3)).collect();
        assert_eq!(three_letter, vec!["CAR", "CAT", "DOG", "DOT"]);

        let ending_in_t: Vec<String> = trie.matching(&Pattern::parse("..T")).collect();
        assert_eq!(ending_in_t, vec!["CAT", "DOT"]);

        // "CA." does not match "CART" as a prefix
        let prefixed: Vec<String> = trie.matching(&Pattern::parse("CA.")).collect();
        assert_eq!(prefixed, vec!["CAR", "CAT"]);

        assert!(trie.contains_matching(&Pattern::parse("C..T")));
        assert!(!trie.contains_matching(&Pattern::parse("Z..")));
        assert!(!trie.contains_matching(&Pattern::any(5)));
    }

    #[test]
    fn test_empty_trie_has_no_matches() {
        let trie = Trie::new();
        assert!(trie.is_empty());
        assert_eq!(trie.iter().count(), 0);
        assert_eq!(trie.matching(&Pattern::any(3)).count(), 0);
    }

    #[test]
    fn test_lazy_removal() {
        let mut trie = sample();
        assert!(trie.remove("CAR"));
        assert!(!trie.remove("CAR"));
        assert!(!trie.contains("CAR"));
        // the path is still there for longer words
        assert!(trie.contains("CART"));
        assert_eq!(trie.len(), 5);
        let words: Vec<String> = trie.matching(&Pattern::parse("CA..")).collect();
        assert_eq!(words, vec!["CART"]);
    }

    #[test]
    fn test_remove_matching() {
        let mut trie = sample();
        assert_eq!(trie.remove_matching(&Pattern::parse("D..")), 2);
        assert_eq!(trie.iter().collect::<Vec<_>>(), vec!["AT", "CAR", "CART", "CAT"]);
        assert_eq!(trie.remove_matching(&Pattern::literal("CAT")), 1);
        assert_eq!(trie.remove_matching(&Pattern::literal("CAT")), 0);
        assert_eq!(trie.len(), 3);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let trie = sample();
        let pattern = Pattern::parse("C...");
        let mut first = trie.matching(&pattern);
        assert_eq!(first.next().as_deref(), Some("CART"));
        assert_eq!(first.next(), None);
        assert_eq!(trie.matching(&pattern).count(), 1);
    }

    #[test]
    fn test_pattern_display_and_matches() {
        let pattern = Pattern::parse("A.C");
        assert_eq!(pattern.to_string(), "A.C");
        assert!(pattern.matches("ABC"));
        assert!(!pattern.matches("ABCD"));
        assert!(!pattern.matches("AB"));
        assert!(!pattern.is_complete());
        assert!(Pattern::literal("ABC").is_complete());
        assert_eq!(pattern.get(2), Some('C'));
        assert_eq!(pattern.get(1), None);
    }
}
