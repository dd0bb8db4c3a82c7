//! End-to-end ingestion pipeline: documents → entries → dedup → store.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use notebase_markdown::{IngestOptions, Ingestor};
use notebase_shared::{NoteEntry, NotebaseError, Result};
use notebase_storage::{NoteStore, PutOutcome};

use crate::dedup::{self, DedupPolicy, Keep, MergeDecision};

// ---------------------------------------------------------------------------
// Inputs & outputs
// ---------------------------------------------------------------------------

/// A Markdown document and the name it is reported under.
#[derive(Debug, Clone)]
pub struct Document {
    /// Name recorded as each entry's `source_file`.
    pub source_file: String,
    /// Raw document text.
    pub text: String,
}

impl Document {
    /// Build a document from in-memory text.
    pub fn new(source_file: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            text: text.into(),
        }
    }

    /// Read a UTF-8 document from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| NotebaseError::io(path, e))?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// A document whose ingestion was aborted.
#[derive(Debug)]
pub struct DocumentFailure {
    /// The document's `source_file`.
    pub source_file: String,
    /// Why it was rejected.
    pub error: NotebaseError,
}

/// Summary of one pipeline run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Documents processed, failed ones included.
    pub documents: usize,
    /// Entries parsed from documents that ingested cleanly.
    pub entries_seen: usize,
    /// Entries stored under a new topic.
    pub inserted: usize,
    /// Entries folded into an existing near-duplicate.
    pub merged: usize,
    /// Entries that overwrote a different body under the same topic.
    pub replaced: usize,
    /// Documents rejected with a parse error.
    pub failures: Vec<DocumentFailure>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter {
    /// Called before each document is parsed.
    fn document_started(&self, source_file: &str, current: usize, total: usize);
    /// Called when a document is rejected.
    fn document_failed(&self, source_file: &str, error: &NotebaseError);
    /// Called when the pipeline completes.
    fn done(&self, report: &IngestReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn document_started(&self, _source_file: &str, _current: usize, _total: usize) {}
    fn document_failed(&self, _source_file: &str, _error: &NotebaseError) {}
    fn done(&self, _report: &IngestReport) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Ingest `documents` in the order given and merge their entries into `store`.
///
/// A document is parsed completely before any of its entries reach the store,
/// so a parse error leaves the store exactly as the previous document left it.
#[instrument(skip_all, fields(documents = documents.len()))]
pub fn ingest_documents(
    documents: &[Document],
    options: &IngestOptions,
    policy: &DedupPolicy,
    store: &mut NoteStore,
    progress: &dyn ProgressReporter,
) -> IngestReport {
    let start = Instant::now();
    let mut report = IngestReport::default();

    for (i, doc) in documents.iter().enumerate() {
        progress.document_started(&doc.source_file, i + 1, documents.len());
        report.documents += 1;

        let ingestor = Ingestor::new(doc.source_file.as_str(), &doc.text, options);
        let entries = match ingestor.collect_entries() {
            Ok(entries) => entries,
            Err(error) => {
                warn!(source = %doc.source_file, %error, "document rejected");
                progress.document_failed(&doc.source_file, &error);
                report.failures.push(DocumentFailure {
                    source_file: doc.source_file.clone(),
                    error,
                });
                continue;
            }
        };

        info!(source = %doc.source_file, entries = entries.len(), "document ingested");
        report.entries_seen += entries.len();

        for entry in entries {
            merge_into(store, entry, policy, &mut report);
        }
    }

    report.elapsed = start.elapsed();
    info!(
        inserted = report.inserted,
        merged = report.merged,
        replaced = report.replaced,
        failed = report.failures.len(),
        "ingestion complete"
    );
    progress.done(&report);

    report
}

/// Merge one entry into the store following the dedup policy.
fn merge_into(
    store: &mut NoteStore,
    entry: NoteEntry,
    policy: &DedupPolicy,
    report: &mut IngestReport,
) {
    let decision = store
        .get(&entry.topic_path)
        .ok()
        .map(|existing| dedup::decide(existing, &entry, policy));

    let Some(decision) = decision else {
        store.put(entry);
        report.inserted += 1;
        return;
    };

    match decision {
        MergeDecision::Duplicate { keep: Keep::First } => {
            debug!(topic = %entry.topic_path, source = %entry.source_file, "duplicate dropped");
            report.merged += 1;
        }
        MergeDecision::Duplicate { keep: Keep::Second } => {
            debug!(
                topic = %entry.topic_path,
                source = %entry.source_file,
                "duplicate supersedes stored entry"
            );
            store.put(entry);
            report.merged += 1;
        }
        MergeDecision::Distinct => {
            debug!(
                topic = %entry.topic_path,
                source = %entry.source_file,
                "distinct body replaces stored entry"
            );
            if store.put(entry) == PutOutcome::Replaced {
                report.replaced += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Document discovery
// ---------------------------------------------------------------------------

/// Expand files and directories into a sorted list of note files.
///
/// Directories are walked recursively and filtered by `extensions`; explicit
/// file arguments are kept regardless of extension. Within each directory the
/// files are sorted by path so merge order is reproducible.
pub fn discover_documents(paths: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for path in paths {
        if path.is_file() {
            found.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            return Err(NotebaseError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
            ));
        }

        let mut in_dir = Vec::new();
        for entry in WalkDir::new(path).follow_links(false) {
            let entry = entry.map_err(|e| {
                let at = e.path().map(Path::to_path_buf).unwrap_or_else(|| path.clone());
                NotebaseError::io(at, std::io::Error::other(e.to_string()))
            })?;

            if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                in_dir.push(entry.into_path());
            }
        }
        in_dir.sort();
        debug!(dir = %path.display(), files = in_dir.len(), "directory scanned");
        found.extend(in_dir);
    }

    Ok(found)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
