//! Core domain types for Notebase note entries.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{NotebaseError, Result};

/// Current schema version for the snapshot format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Separator used when a topic path is rendered as a single key.
pub const TOPIC_SEPARATOR: &str = " > ";

/// Language recorded for fenced code blocks without an info string.
pub const DEFAULT_LANGUAGE: &str = "text";

/// Number of hex characters kept from a document digest.
const REVISION_LEN: usize = 12;

// ---------------------------------------------------------------------------
// TopicPath
// ---------------------------------------------------------------------------

/// Ordered heading titles locating a note entry (e.g. `["React", "Hooks"]`).
///
/// Always non-empty, and no segment is blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TopicPath(Vec<String>);

impl TopicPath {
    /// Build a topic path from heading titles.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments
            .into_iter()
            .map(|s| s.into().trim().to_string())
            .collect();

        if segments.is_empty() {
            return Err(NotebaseError::validation("topic path must not be empty"));
        }
        if segments.iter().any(String::is_empty) {
            return Err(NotebaseError::validation(format!(
                "topic path contains an empty segment: {segments:?}"
            )));
        }

        Ok(Self(segments))
    }

    /// Parse a key such as `JavaScript > Event loop`.
    ///
    /// Splits on [`TOPIC_SEPARATOR`] only, so titles like `Arrow functions (=>)`
    /// survive. Inverse of [`TopicPath::key`] for paths whose segments do not
    /// contain the separator themselves.
    pub fn parse(key: &str) -> Result<Self> {
        Self::new(key.split(TOPIC_SEPARATOR))
    }

    /// Whether any segment contains [`TOPIC_SEPARATOR`], making the key ambiguous.
    pub fn has_ambiguous_key(&self) -> bool {
        self.0.iter().any(|s| s.contains(TOPIC_SEPARATOR))
    }

    /// The segments, outermost heading first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Nesting depth (1 for a top-level heading).
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Title of the innermost heading.
    pub fn leaf(&self) -> &str {
        // Non-empty by construction.
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// Joined string key used by the store.
    pub fn key(&self) -> String {
        self.0.join(TOPIC_SEPARATOR)
    }
}

impl std::fmt::Display for TopicPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for TopicPath {
    type Err = NotebaseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Vec<String>> for TopicPath {
    type Error = NotebaseError;

    fn try_from(segments: Vec<String>) -> std::result::Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<TopicPath> for Vec<String> {
    fn from(path: TopicPath) -> Self {
        path.0
    }
}

// ---------------------------------------------------------------------------
// CodeExample
// ---------------------------------------------------------------------------

/// A fenced code block attached to a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExample {
    /// Declared fence language, or [`DEFAULT_LANGUAGE`].
    pub language: String,
    /// Exact text between the fences, without the final newline.
    pub code: String,
}

// ---------------------------------------------------------------------------
// NoteEntry
// ---------------------------------------------------------------------------

/// One topic's notes, as extracted from a single document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntry {
    /// Heading path; the entry's identity.
    pub topic_path: TopicPath,
    /// Prose under the heading, code fences excluded.
    pub body: String,
    /// Code blocks in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<CodeExample>,
    /// Document the entry came from.
    pub source_file: String,
    /// Digest prefix of the source document's content.
    pub revision: String,
}

impl NoteEntry {
    /// The store key for this entry.
    pub fn key(&self) -> String {
        self.topic_path.key()
    }
}

/// Compute the revision identifier for a document's text.
pub fn document_revision(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..REVISION_LEN].to_string()
}
