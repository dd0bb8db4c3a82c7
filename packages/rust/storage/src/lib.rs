//! In-process note store.
//!
//! The [`NoteStore`] holds one canonical [`NoteEntry`] per topic path and
//! remembers the order in which topics were first inserted. It is constructed
//! explicitly and passed around by the caller; there is no shared instance.
//!
//! Stores live for the process. [`save_snapshot`] and [`load_snapshot`] move a
//! store to and from a JSON file when it has to outlive it.

mod snapshot;

use std::collections::HashMap;

use notebase_shared::{NoteEntry, NotebaseError, Result, TopicPath};

pub use snapshot::{Snapshot, load_snapshot, save_snapshot};

/// What [`NoteStore::put`] did with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The topic was new.
    Inserted,
    /// An entry with the same topic path was replaced in place.
    Replaced,
}

/// Canonical entries keyed by topic path, listed in first-insertion order.
#[derive(Debug, Default, Clone)]
pub struct NoteStore {
    entries: Vec<NoteEntry>,
    index: HashMap<TopicPath, usize>,
}

impl NoteStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry`, or replace the entry stored under the same topic path.
    ///
    /// A replaced entry keeps the list position of the one it replaces.
    pub fn put(&mut self, entry: NoteEntry) -> PutOutcome {
        match self.index.get(&entry.topic_path) {
            Some(&slot) => {
                tracing::trace!(
                    topic = %entry.topic_path,
                    source = %entry.source_file,
                    "replacing entry"
                );
                self.entries[slot] = entry;
                PutOutcome::Replaced
            }
            None => {
                tracing::trace!(
                    topic = %entry.topic_path,
                    source = %entry.source_file,
                    "inserting entry"
                );
                self.index.insert(entry.topic_path.clone(), self.entries.len());
                self.entries.push(entry);
                PutOutcome::Inserted
            }
        }
    }

    /// Look up the entry for `topic_path`.
    pub fn get(&self, topic_path: &TopicPath) -> Result<&NoteEntry> {
        self.index
            .get(topic_path)
            .map(|&slot| &self.entries[slot])
            .ok_or_else(|| NotebaseError::not_found(topic_path.key()))
    }

    /// Parse a joined key (e.g. `React > Hooks`) and look it up.
    pub fn get_by_key(&self, key: &str) -> Result<&NoteEntry> {
        self.get(&TopicPath::parse(key)?)
    }

    /// Whether an entry exists for `topic_path`.
    pub fn contains(&self, topic_path: &TopicPath) -> bool {
        self.index.contains_key(topic_path)
    }

    /// Entries in first-insertion order.
    pub fn list(&self) -> impl ExactSizeIterator<Item = &NoteEntry> {
        self.entries.iter()
    }

    /// Number of distinct topics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the store, yielding entries in first-insertion order.
    pub fn into_entries(self) -> Vec<NoteEntry> {
        self.entries
    }
}

impl FromIterator<NoteEntry> for NoteStore {
    fn from_iter<I: IntoIterator<Item = NoteEntry>>(iter: I) -> Self {
        let mut store = Self::new();
        for entry in iter {
            store.put(entry);
        }
        store
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_entry(path: &[&str], body: &str, source: &str) -> NoteEntry {
        NoteEntry {
            topic_path: TopicPath::new(path.iter().copied()).unwrap(),
            body: body.into(),
            examples: vec![],
            source_file: source.into(),
            revision: "000000000000".into(),
        }
    }

    #[test]
    fn get_before_put_is_not_found() {
        let store = NoteStore::new();
        let path = TopicPath::new(["React", "Fiber"]).unwrap();

        let err = store.get(&path).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "topic not found: React > Fiber");
        assert!(!store.contains(&path));
    }

    #[test]
    fn put_then_get() {
        let mut store = NoteStore::new();
        let entry = make_entry(&["React", "Hooks"], "Call hooks at the top level.", "react.md");

        assert_eq!(store.put(entry.clone()), PutOutcome::Inserted);
        assert_eq!(store.get(&entry.topic_path).unwrap(), &entry);
        assert_eq!(store.get_by_key("React > Hooks").unwrap(), &entry);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_replaces_in_place() {
        let mut store = NoteStore::new();
        store.put(make_entry(&["CSS"], "first", "a.md"));
        store.put(make_entry(&["HTML"], "markup", "a.md"));

        let outcome = store.put(make_entry(&["CSS"], "second", "b.md"));
        assert_eq!(outcome, PutOutcome::Replaced);
        assert_eq!(store.len(), 2);

        let listed: Vec<_> = store.list().map(|e| (e.key(), e.body.clone())).collect();
        assert_eq!(
            listed,
            vec![
                ("CSS".to_string(), "second".to_string()),
                ("HTML".to_string(), "markup".to_string()),
            ]
        );
    }

    #[test]
    fn paths_with_equal_keys_stay_separate() {
        let mut store = NoteStore::new();
        let flat = make_entry(&["CSS > Selectors"], "one heading", "a.md");
        let nested = make_entry(&["CSS", "Selectors"], "two headings", "b.md");
        assert_eq!(flat.key(), nested.key());

        assert_eq!(store.put(flat.clone()), PutOutcome::Inserted);
        assert_eq!(store.put(nested.clone()), PutOutcome::Inserted);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&flat.topic_path).unwrap(), &flat);
        assert_eq!(store.get(&nested.topic_path).unwrap(), &nested);
        // A joined key parses to the nested path.
        assert_eq!(store.get_by_key("CSS > Selectors").unwrap(), &nested);
    }

    #[test]
    fn list_preserves_first_insertion_order() {
        let store: NoteStore = ["Zeta", "Alpha", "Mid"]
            .iter()
            .map(|t| make_entry(&[*t], "", "x.md"))
            .collect();

        let keys: Vec<_> = store.list().map(NoteEntry::key).collect();
        assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(store.list().len(), 3);
    }

    #[test]
    fn empty_store() {
        let store = NoteStore::new();
        assert!(store.is_empty());
        assert_eq!(store.list().count(), 0);
        assert!(store.into_entries().is_empty());
    }
}
