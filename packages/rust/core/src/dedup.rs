//! Near-duplicate detection for note entries sharing a topic path.
//!
//! Every function here is pure: the same pair of entries, in the same order,
//! always produces the same decision.

use std::collections::HashSet;

use notebase_markdown::{normalize_whitespace, tokens};
use notebase_shared::{AppConfig, NoteEntry};

/// Default share of tokens above which two bodies are duplicates.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Tunables for [`decide`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupPolicy {
    /// Similarity must be strictly greater than this to merge.
    pub similarity_threshold: f64,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl From<&AppConfig> for DedupPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            similarity_threshold: config.dedup.similarity_threshold,
        }
    }
}

/// Which of the two compared entries survives a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    /// The entry seen first in input order.
    First,
    /// The entry seen second.
    Second,
}

/// Outcome of comparing two entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// Same topic and near-identical bodies; only `keep` survives.
    Duplicate { keep: Keep },
    /// Different topics, or bodies too different to merge.
    Distinct,
}

/// Fraction of distinct tokens the two bodies share, relative to the larger body.
///
/// Two empty bodies are identical (`1.0`); an empty body shares nothing with a
/// non-empty one (`0.0`).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: HashSet<&str> = tokens(a).collect();
    let b: HashSet<&str> = tokens(b).collect();

    let larger = a.len().max(b.len());
    if larger == 0 {
        return 1.0;
    }

    let shared = a.intersection(&b).count();
    shared as f64 / larger as f64
}

/// Decide whether `second` duplicates `first`, where `first` came earlier in input order.
pub fn decide(first: &NoteEntry, second: &NoteEntry, policy: &DedupPolicy) -> MergeDecision {
    if first.topic_path != second.topic_path {
        return MergeDecision::Distinct;
    }

    let score = similarity(&first.body, &second.body);
    if score <= policy.similarity_threshold {
        return MergeDecision::Distinct;
    }

    let first_len = normalize_whitespace(&first.body).chars().count();
    let second_len = normalize_whitespace(&second.body).chars().count();

    let keep = if second_len > first_len {
        Keep::Second
    } else {
        Keep::First
    };

    MergeDecision::Duplicate { keep }
}

/// The canonical entry for a duplicate pair, or `None` when they are distinct.
pub fn merge(first: &NoteEntry, second: &NoteEntry, policy: &DedupPolicy) -> Option<NoteEntry> {
    match decide(first, second, policy) {
        MergeDecision::Duplicate { keep: Keep::First } => Some(first.clone()),
        MergeDecision::Duplicate { keep: Keep::Second } => Some(second.clone()),
        MergeDecision::Distinct => None,
    }
}
