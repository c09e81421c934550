use crate::trie::Trie;
use std::collections::HashSet;
use tracing::trace;

/// Visibility mask for `names` under `query`, compared case-insensitively.
///
/// A fresh trie is built from the names on every call; lists are short and
/// change between keystrokes, so nothing is kept around. An empty query shows
/// every name.
pub fn filter_names<S: AsRef<str>>(names: &[S], query: &str) -> Vec<bool> {
    if query.is_empty() {
        return vec![true; names.len()];
    }

    let lowered: Vec<String> = names.iter().map(|n| n.as_ref().to_lowercase()).collect();
    let trie: Trie = lowered.iter().collect();
    trace!(words = trie.len(), %query, "search trie rebuilt");
    let matches: HashSet<String> = trie.autocomplete(&query.to_lowercase()).into_iter().collect();

    lowered.iter().map(|name| matches.contains(name)).collect()
}

/// The names visible under `query`, in their original order and casing.
pub fn matching_names<S: AsRef<str>>(names: &[S], query: &str) -> Vec<String> {
    names
        .iter()
        .zip(filter_names(names, query))
        .filter(|(_, visible)| *visible)
        .map(|(name, _)| name.as_ref().to_string())
        .collect()
}

#[cfg(test)]
mod search_tests {
    use super::*;

    const PROJECTS: [&str; 4] = ["Shot_0010", "shot_0020", "Sequence_01", "assets"];

    #[test]
    fn test_filter_is_case_insensitive() {
        assert_eq!(filter_names(&PROJECTS, "SHO"), vec![true, true, false, false]);
        assert_eq!(matching_names(&PROJECTS, "seq"), vec!["Sequence_01"]);
    }

    #[test]
    fn test_empty_query_shows_all() {
        assert_eq!(filter_names(&PROJECTS, ""), vec![true; 4]);
    }

    #[test]
    fn test_no_match_hides_all() {
        assert!(matching_names(&PROJECTS, "zzz").is_empty());
    }

    #[test]
    fn test_duplicate_names_stay_visible() {
        let names = ["proj", "PROJ", "project_a"];
        assert_eq!(matching_names(&names, "proj"), vec!["proj", "PROJ", "project_a"]);
    }
}
