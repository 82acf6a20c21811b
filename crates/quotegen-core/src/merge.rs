//! Collection merge rules
//!
//! Two dedup policies exist and are intentionally kept apart:
//!
//! - **Remote wins by text** (sync): remote records replace any local quote
//!   with the same `text`, whatever its category.
//! - **Text + category** (import): an incoming quote is skipped only when a
//!   quote with the same `text` and `category` already exists.

use std::collections::HashSet;

use crate::models::Quote;

/// Dedup key used by a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Quotes are the same iff their text is exactly equal
    TextOnly,
    /// Quotes are the same iff text and category are exactly equal
    TextAndCategory,
}

impl DedupPolicy {
    fn key<'a>(&self, quote: &'a Quote) -> (&'a str, Option<&'a str>) {
        match self {
            DedupPolicy::TextOnly => (quote.text.as_str(), None),
            DedupPolicy::TextAndCategory => (quote.text.as_str(), Some(quote.category.as_str())),
        }
    }
}

/// Merge a fetched remote collection into the local one
///
/// Result: every remote quote, followed by the local quotes whose text
/// matches no remote quote. Local order is preserved among the survivors.
pub fn merge_remote_wins(local: &[Quote], remote: &[Quote]) -> Vec<Quote> {
    let policy = DedupPolicy::TextOnly;
    let remote_keys: HashSet<_> = remote.iter().map(|q| policy.key(q)).collect();

    let mut merged = remote.to_vec();
    merged.extend(
        local
            .iter()
            .filter(|q| !remote_keys.contains(&policy.key(q)))
            .cloned(),
    );
    merged
}

/// Append the incoming quotes not already present by text + category
///
/// Duplicates within `incoming` are collapsed too. Returns the merged
/// collection and the number of quotes added.
pub fn merge_import(existing: &[Quote], incoming: &[Quote]) -> (Vec<Quote>, usize) {
    let policy = DedupPolicy::TextAndCategory;
    let mut merged = existing.to_vec();
    let mut seen: HashSet<(String, Option<String>)> = existing
        .iter()
        .map(|q| owned_key(policy.key(q)))
        .collect();

    let mut added = 0;
    for quote in incoming {
        if seen.insert(owned_key(policy.key(quote))) {
            merged.push(quote.clone());
            added += 1;
        }
    }

    (merged, added)
}

fn owned_key((text, category): (&str, Option<&str>)) -> (String, Option<String>) {
    (text.to_string(), category.map(str::to_string))
}
