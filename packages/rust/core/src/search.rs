//! Keyword search over stored entries.

use std::collections::HashSet;

use tracing::{debug, instrument};

use notebase_markdown::search_terms;
use notebase_shared::NoteEntry;
use notebase_storage::NoteStore;

/// A matching entry and how many distinct query terms it contains.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub entry: &'a NoteEntry,
    pub score: usize,
}

/// Find entries whose topic path or body contains any of the query's terms.
///
/// Matching is case-insensitive on whole words. Hits are ordered by score,
/// highest first, with ties left in store order.
#[instrument(skip(store), fields(entries = store.len()))]
pub fn search<'a>(store: &'a NoteStore, query: &str) -> Vec<SearchHit<'a>> {
    let mut terms = search_terms(query);
    terms.sort();
    terms.dedup();

    if terms.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit<'a>> = store
        .list()
        .filter_map(|entry| {
            let words = entry_words(entry);
            let score = terms.iter().filter(|t| words.contains(t.as_str())).count();
            (score > 0).then_some(SearchHit { entry, score })
        })
        .collect();

    // Stable sort keeps store order among equal scores.
    hits.sort_by(|a, b| b.score.cmp(&a.score));

    debug!(hits = hits.len(), "search complete");
    hits
}

fn entry_words(entry: &NoteEntry) -> HashSet<String> {
    entry
        .topic_path
        .segments()
        .iter()
        .chain(std::iter::once(&entry.body))
        .flat_map(|text| search_terms(text))
        .collect()
}
