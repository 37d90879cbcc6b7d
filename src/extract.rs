//! Ordered fallback extraction
//!
//! Marketplace payloads inconsistently omit fields depending on query
//! parameters, so the same value is looked for in several places in a strict
//! priority order. Rather than ad hoc chained optional accesses, candidates
//! are listed in priority order and the first non-empty one wins.

/// Returns the first candidate that is present and non-empty
///
/// Candidates are evaluated lazily in the order given, so put the highest
/// priority extractor first.
pub fn first_non_empty<'a, I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
