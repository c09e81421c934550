use liblevenshtein::distance::standard_distance;
use regex::Regex;
use std::sync::LazyLock;

pub const UNTITLED: &str = "Untitled";

/// Minimum similarity for `closest_match` to offer a suggestion.
const MATCH_CUTOFF: f64 = 0.6;

static UNSAFE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").unwrap());
static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]").unwrap());

/// Makes a user-typed name safe to use as a folder name.
pub fn sanitize_name(text: &str) -> String {
    if text.is_empty() {
        return UNTITLED.to_string();
    }
    UNSAFE_RUN.replace_all(text, "_").into_owned()
}

pub fn clean_dcc_name(text: &str) -> String {
    NON_ALNUM.replace_all(text, "").into_owned()
}

pub fn format_version(version: u32) -> String {
    format!("{version:03}")
}

/// Best candidate whose similarity to `word` reaches the cutoff.
pub fn closest_match<'a, S: AsRef<str>>(word: &str, candidates: &'a [S]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (c.as_ref(), similarity(word, c.as_ref())))
        .filter(|(_, score)| *score >= MATCH_CUTOFF)
        .fold(None, |best: Option<(&str, f64)>, (cand, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((cand, score)),
        })
        .map(|(cand, _)| cand)
}

fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - standard_distance(a, b) as f64 / longest as f64
}

#[cfg(test)]
mod naming_tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name(""), "Untitled");
        assert_eq!(sanitize_name("shot 0010"), "shot_0010");
        assert_eq!(sanitize_name("a  b!?c"), "a_b_c");
        assert_eq!(sanitize_name("keep-this_one"), "keep-this_one");
    }

    #[test]
    fn test_clean_dcc_name() {
        assert_eq!(clean_dcc_name("houdini,"), "houdini");
        assert_eq!(clean_dcc_name("un-real"), "unreal");
    }

    #[test]
    fn test_format_version() {
        assert_eq!(format_version(7), "007");
        assert_eq!(format_version(1234), "1234");
    }

    #[test]
    fn test_closest_match() {
        let known = ["houdini", "nuke", "blender", "maya", "unreal"];
        assert_eq!(closest_match("houdni", &known), Some("houdini"));
        assert_eq!(closest_match("blendr", &known), Some("blender"));
        assert_eq!(closest_match("photoshop", &known), None);
    }

    #[test]
    fn test_similarity_scales_by_longest() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("nuke", "nuke"), 1.0);
        assert_eq!(similarity("maya", "mayo"), 0.75);
        assert_eq!(similarity("", "abcd"), 0.0);
    }
}
