/// One node of the trie. Children are kept sorted by character so that
/// lookups are a binary search and word collection runs in ascending order.
#[derive(Debug, Default)]
pub struct TrieNode {
    children: Vec<(char, TrieNode)>,
    is_end_of_word: bool,
}

impl TrieNode {
    fn new() -> Self {
        Self::default()
    }

    /// True if some inserted word ends at this node.
    pub fn is_end_of_word(&self) -> bool {
        self.is_end_of_word
    }

    fn child(&self, c: char) -> Option<&TrieNode> {
        self.children
            .binary_search_by_key(&c, |(k, _)| *k)
            .ok()
            .map(|idx| &self.children[idx].1)
    }

    fn child_or_insert(&mut self, c: char) -> &mut TrieNode {
        let idx = match self.children.binary_search_by_key(&c, |(k, _)| *k) {
            Ok(idx) => idx,
            Err(idx) => {
                self.children.insert(idx, (c, TrieNode::new()));
                idx
            }
        };
        &mut self.children[idx].1
    }
}

impl Drop for TrieNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some((_, mut node)) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Prefix tree over arbitrary strings. Stores exactly what it is given;
/// case folding is up to the caller.
#[derive(Debug, Default)]
pub struct Trie {
    root: TrieNode,
    words: usize,
}

impl Trie {
    pub fn new() -> Self {
        Self {
            root: TrieNode::new(),
            words: 0,
        }
    }

    pub fn insert(&mut self, word: &str) {
        let mut node = &mut self.root;
        for c in word.chars() {
            node = node.child_or_insert(c);
        }
        if !node.is_end_of_word {
            node.is_end_of_word = true;
            self.words += 1;
        }
    }

    /// Number of distinct words stored.
    pub fn len(&self) -> usize {
        self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words == 0
    }

    pub fn contains(&self, word: &str) -> bool {
        self.prefix_node(word).is_some_and(TrieNode::is_end_of_word)
    }

    /// Walks the trie along `prefix`. The empty prefix resolves to the root.
    pub fn prefix_node(&self, prefix: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for c in prefix.chars() {
            node = node.child(c)?;
        }
        Some(node)
    }

    /// Appends every word stored at or below `node` to `results`, in ascending
    /// character order. `prefix_so_far` is the path from the root to `node`.
    pub fn collect_words(node: &TrieNode, prefix_so_far: &str, results: &mut Vec<String>) {
        let mut buffer = prefix_so_far.to_string();
        if node.is_end_of_word {
            results.push(buffer.clone());
        }

        // Explicit stack: depth is bounded by the longest word, not the call stack.
        let mut stack = vec![node.children.iter()];
        while let Some(children) = stack.last_mut() {
            match children.next() {
                Some((c, child)) => {
                    buffer.push(*c);
                    if child.is_end_of_word {
                        results.push(buffer.clone());
                    }
                    stack.push(child.children.iter());
                }
                None => {
                    stack.pop();
                    // The bottom iterator belongs to `node` itself, which pushed no char.
                    if !stack.is_empty() {
                        buffer.pop();
                    }
                }
            }
        }
    }

    /// All stored words starting with `prefix`, the prefix itself included when
    /// it was inserted as a word. Unknown prefixes give an empty list.
    pub fn autocomplete(&self, prefix: &str) -> Vec<String> {
        let mut results = Vec::new();
        if let Some(node) = self.prefix_node(prefix) {
            Self::collect_words(node, prefix, &mut results);
        }
        results
    }
}

impl<S: AsRef<str>> Extend<S> for Trie {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for word in iter {
            self.insert(word.as_ref());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for Trie {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut trie = Trie::new();
        trie.extend(iter);
        trie
    }
}

#[cfg(test)]
mod trie_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn result_set(trie: &Trie, prefix: &str) -> BTreeSet<String> {
        trie.autocomplete(prefix).into_iter().collect()
    }

    #[test]
    fn test_shot_names() {
        let trie: Trie = ["shot_0010", "shot_0020", "sequence_01"].into_iter().collect();

        assert_eq!(result_set(&trie, "sho"), set(&["shot_0010", "shot_0020"]));
        assert_eq!(result_set(&trie, "seq"), set(&["sequence_01"]));
        assert!(trie.autocomplete("x").is_empty());
    }

    #[test]
    fn test_query_longer_than_word() {
        let trie: Trie = ["abc"].into_iter().collect();
        assert!(trie.autocomplete("abcd").is_empty());
    }

    #[test]
    fn test_prefix_is_also_a_word() {
        let trie: Trie = ["project_a", "project_b", "proj"].into_iter().collect();
        assert_eq!(
            trie.autocomplete("proj"),
            vec!["proj".to_string(), "project_a".to_string(), "project_b".to_string()]
        );
    }

    #[test]
    fn test_empty_trie() {
        let trie = Trie::new();
        assert!(trie.autocomplete("anything").is_empty());
        assert!(trie.autocomplete("").is_empty());
        assert!(trie.is_empty());
    }

    #[test]
    fn test_empty_prefix_resolves_to_root() {
        let mut trie = Trie::new();
        assert!(trie.prefix_node("").is_some());

        trie.insert("");
        assert!(trie.contains(""));
        assert_eq!(trie.autocomplete(""), vec![String::new()]);
    }

    #[test]
    fn test_len_counts_distinct_words() {
        let mut trie = Trie::new();
        trie.extend(["a", "ab", "a", "ab", "b"]);
        assert_eq!(trie.len(), 3);
        assert!(trie.contains("ab"));
        assert!(!trie.contains("abc"));
    }

    #[test]
    fn test_unicode_and_mixed_characters() {
        let trie: Trie = ["αβγ", "αβδ", "a b", "a-b"].into_iter().collect();
        assert_eq!(result_set(&trie, "αβ"), set(&["αβγ", "αβδ"]));
        assert_eq!(result_set(&trie, "a"), set(&["a b", "a-b"]));
    }

    #[test]
    fn test_long_word_does_not_recurse() {
        let word = "x".repeat(100_000);
        let trie: Trie = [word.as_str()].into_iter().collect();
        assert_eq!(trie.autocomplete("xxx"), vec![word]);
    }

    fn words_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-c_0-9]{0,6}", 0..=20)
    }

    proptest! {
        #[test]
        fn prop_matches_naive_filter(words in words_strategy(), query in "[a-c_0-9]{0,4}") {
            let trie: Trie = words.iter().collect();
            let expected: Vec<String> = words
                .iter()
                .filter(|w| w.starts_with(&query))
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            prop_assert_eq!(trie.autocomplete(&query), expected);
        }

        #[test]
        fn prop_every_prefix_finds_word(words in words_strategy()) {
            let trie: Trie = words.iter().collect();
            for word in &words {
                let chars: Vec<char> = word.chars().collect();
                for end in 1..=chars.len() {
                    let prefix: String = chars[..end].iter().collect();
                    prop_assert!(trie.autocomplete(&prefix).contains(word));
                }
            }
        }

        #[test]
        fn prop_root_prefix_returns_everything(words in words_strategy()) {
            let trie: Trie = words.iter().collect();
            let expected: BTreeSet<String> = words.iter().cloned().collect();
            prop_assert_eq!(result_set(&trie, ""), expected);
            prop_assert_eq!(trie.len(), words.iter().collect::<BTreeSet<_>>().len());
        }

        #[test]
        fn prop_insert_is_idempotent(words in words_strategy(), query in "[a-c]{0,3}") {
            let once: Trie = words.iter().collect();
            let twice: Trie = words.iter().chain(words.iter()).collect();
            prop_assert_eq!(once.autocomplete(&query), twice.autocomplete(&query));
        }

        #[test]
        fn prop_insert_order_is_irrelevant(words in words_strategy(), query in "[a-c]{0,3}") {
            let forward: Trie = words.iter().collect();
            let backward: Trie = words.iter().rev().collect();
            let mut sorted_words = words.clone();
            sorted_words.sort();
            let sorted: Trie = sorted_words.iter().collect();

            prop_assert_eq!(forward.autocomplete(&query), backward.autocomplete(&query));
            prop_assert_eq!(forward.autocomplete(&query), sorted.autocomplete(&query));
        }
    }
}
