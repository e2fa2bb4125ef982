//! Approximate card-name matching for "did you mean" suggestions
//!
//! `FuzzyIndex` scores a query against every indexed name with an
//! approximate substring edit distance:
//!
//!   score = errors / query_len + match_start / LOCATION_DISTANCE
//!
//! Lower is better, 0.0 is an exact match. Names scoring above the
//! threshold are never suggested. Comparison is case-insensitive.

use crate::core::CardError;

/// Default cutoff; higher accepts sloppier matches
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// How far into a name a match may start before it costs a full error ratio
const LOCATION_DISTANCE: f64 = 100.0;

/// Pluggable approximate string matcher
pub trait NameMatcher {
    /// Build a matcher over the given names
    fn index<I, S>(names: I) -> Self
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>;

    /// Best candidate for `query`, if any clears the threshold
    fn search(&self, query: &str) -> Option<&str>;
}

/// A scored candidate
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch<'a> {
    pub name: &'a str,
    pub score: f64,
}

#[derive(Debug, Clone)]
struct IndexedName {
    name: String,
    folded: Vec<char>,
}

/// Edit-distance name index
#[derive(Debug, Clone)]
pub struct FuzzyIndex {
    names: Vec<IndexedName>,
    threshold: f64,
}

impl FuzzyIndex {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All candidates under the threshold, best first
    ///
    /// Ties keep index order, which is sorted by name.
    pub fn search_all(&self, query: &str) -> Vec<FuzzyMatch<'_>> {
        let pattern = fold(query);
        if pattern.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<FuzzyMatch<'_>> = self
            .names
            .iter()
            .filter_map(|entry| {
                let score = score(&pattern, &entry.folded);
                (score <= self.threshold).then_some(FuzzyMatch {
                    name: &entry.name,
                    score,
                })
            })
            .collect();

        matches.sort_by(|a, b| a.score.total_cmp(&b.score));
        matches
    }
}

impl NameMatcher for FuzzyIndex {
    fn index<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<IndexedName> = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                IndexedName {
                    folded: fold(&name),
                    name,
                }
            })
            .collect();
        names.sort_by(|a, b| a.name.cmp(&b.name));
        names.dedup_by(|a, b| a.name == b.name);

        FuzzyIndex {
            names,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    fn search(&self, query: &str) -> Option<&str> {
        self.search_all(query).first().map(|m| m.name)
    }
}

/// Attach the best suggestion to every error (or clear it when none qualifies)
pub fn suggest_fixes<M: NameMatcher>(errors: &mut [CardError], matcher: &M) {
    for error in errors.iter_mut() {
        error.fix = matcher.search(&error.card.name).map(str::to_string);
    }
}

fn fold(s: &str) -> Vec<char> {
    s.trim().to_lowercase().chars().collect()
}

/// Best score of `pattern` against any substring of `text`
///
/// Sellers' variant of Levenshtein: the match may start anywhere in the
/// text for free, and the start of each alignment is tracked so that
/// matches deep inside a long name cost slightly more.
fn score(pattern: &[char], text: &[char]) -> f64 {
    if pattern == text {
        return 0.0;
    }

    let m = pattern.len();
    let n = text.len();

    // prev[j] / cur[j]: (edit distance, alignment start) for pattern[..i] ending at text[..j]
    let mut prev: Vec<(usize, usize)> = (0..=n).map(|j| (0, j)).collect();
    let mut cur: Vec<(usize, usize)> = vec![(0, 0); n + 1];

    for i in 1..=m {
        cur[0] = (i, 0);
        for j in 1..=n {
            let cost = usize::from(pattern[i - 1] != text[j - 1]);
            let diagonal = (prev[j - 1].0 + cost, prev[j - 1].1);
            let deletion = (prev[j].0 + 1, prev[j].1);
            let insertion = (cur[j - 1].0 + 1, cur[j - 1].1);
            cur[j] = [diagonal, deletion, insertion]
                .into_iter()
                .min_by_key(|&(dist, start)| (dist, start))
                .unwrap_or(diagonal);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    prev.iter()
        .map(|&(errors, start)| {
            errors as f64 / m as f64 + start as f64 / LOCATION_DISTANCE
        })
        .fold(f64::INFINITY, f64::min)
}
