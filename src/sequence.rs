use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static FRAME_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.\d+\.(usda|usdc)$").unwrap());
static FOUR_DIGIT_FRAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\d{4}\.(usda|usdc)$").unwrap());

/// A layer file on its own, or the frames of one cached sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Single(String),
    Sequence(Vec<String>),
}

/// Groups per-frame layer files (`name.0001.usdc`) by the part before the
/// frame number.
///
/// Buckets with two or more frames become sequences; a framed file alone in its
/// bucket is a single-frame cache and stays a single. Framed entries come first
/// in first-seen order, followed by the non-framed files.
pub fn group_sequences<S: AsRef<str>>(paths: &[S]) -> Vec<Entry> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<String>> = HashMap::new();
    let mut singles = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if FRAME_SUFFIX.is_match(path) {
            let base = FRAME_SUFFIX.replace(path, "").into_owned();
            buckets
                .entry(base.clone())
                .or_insert_with(|| {
                    order.push(base);
                    Vec::new()
                })
                .push(path.to_string());
        } else {
            singles.push(Entry::Single(path.to_string()));
        }
    }

    let mut entries = Vec::with_capacity(order.len() + singles.len());
    for base in order {
        let Some(mut frames) = buckets.remove(&base) else {
            continue;
        };
        if frames.len() >= 2 {
            entries.push(Entry::Sequence(frames));
        } else if let Some(frame) = frames.pop() {
            entries.push(Entry::Single(frame));
        }
    }
    entries.extend(singles);
    entries
}

/// Display strings: a sequence shows its first frame with the four-digit frame
/// number replaced by `####`.
pub fn preview(entries: &[Entry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| match entry {
            Entry::Single(path) => path.clone(),
            Entry::Sequence(frames) => frames
                .first()
                .map(|first| FOUR_DIGIT_FRAME.replace(first, ".####.$1").into_owned())
                .unwrap_or_default(),
        })
        .collect()
}
