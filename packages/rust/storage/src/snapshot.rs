//! JSON snapshots of a [`NoteStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use notebase_shared::{CURRENT_SCHEMA_VERSION, NoteEntry, NotebaseError, Result};

use crate::NoteStore;

/// On-disk snapshot layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// When the snapshot was written.
    pub exported_at: DateTime<Utc>,
    /// Number of entries, duplicated for quick inspection.
    pub entry_count: usize,
    /// Entries in store order.
    pub entries: Vec<NoteEntry>,
}

impl Snapshot {
    /// Capture the current contents of `store`.
    pub fn capture(store: &NoteStore) -> Self {
        let entries: Vec<NoteEntry> = store.list().cloned().collect();
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            exported_at: Utc::now(),
            entry_count: entries.len(),
            entries,
        }
    }

    /// Rebuild a store, rejecting unknown schema versions.
    pub fn into_store(self) -> Result<NoteStore> {
        if self.schema_version != CURRENT_SCHEMA_VERSION {
            return Err(NotebaseError::validation(format!(
                "snapshot schema_version {} not supported (expected {CURRENT_SCHEMA_VERSION})",
                self.schema_version
            )));
        }
        if self.entry_count != self.entries.len() {
            return Err(NotebaseError::validation(format!(
                "snapshot declares {} entries but contains {}",
                self.entry_count,
                self.entries.len()
            )));
        }

        Ok(self.entries.into_iter().collect())
    }
}

/// Write `store` to `path` as pretty-printed JSON.
///
/// The file is written to a sibling temp path first and renamed into place.
#[instrument(skip(store, path), fields(path = %path.display(), entries = store.len()))]
pub fn save_snapshot(store: &NoteStore, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| NotebaseError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(&Snapshot::capture(store))
        .map_err(|e| NotebaseError::Serialization(e.to_string()))?;

    let temp = path.with_extension("json.tmp");
    std::fs::write(&temp, json).map_err(|e| NotebaseError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| NotebaseError::io(path, e))?;

    info!("snapshot written");
    Ok(())
}

/// Load a store previously written by [`save_snapshot`].
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_snapshot(path: &Path) -> Result<NoteStore> {
    let content = std::fs::read_to_string(path).map_err(|e| NotebaseError::io(path, e))?;

    let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
        NotebaseError::Serialization(format!("failed to parse {}: {e}", path.display()))
    })?;

    let store = snapshot.into_store()?;
    debug!(entries = store.len(), "snapshot loaded");
    Ok(store)
}
