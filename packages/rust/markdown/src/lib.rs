//! Markdown note ingestion.
//!
//! Splits a raw Markdown document into [`NoteEntry`] values keyed by heading
//! path, extracting fenced code blocks into each entry's examples. Ingestion is
//! lazy: [`Ingestor::entries`] walks the document one section at a time and can
//! be restarted by calling it again.

mod cleanup;

use std::iter::Enumerate;
use std::str::Split;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument, trace};

use notebase_shared::{
    AppConfig, CodeExample, DEFAULT_LANGUAGE, NoteEntry, NotebaseError, Result, TOPIC_SEPARATOR,
    TopicPath, document_revision,
};

pub use cleanup::{normalize_whitespace, search_terms, tokens};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options controlling how headings and fences are interpreted.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Reject headings that skip a nesting level (e.g. `#` followed by `###`)
    /// and titles containing the topic separator `" > "`.
    pub strict_headings: bool,
    /// Language recorded for fences without an info string.
    pub default_language: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            strict_headings: true,
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl From<&AppConfig> for IngestOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            strict_headings: config.ingest.strict_headings,
            default_language: config.ingest.default_language.clone(),
        }
    }
}

/// A single Markdown document ready to be split into note entries.
#[derive(Debug, Clone)]
pub struct Ingestor<'a> {
    source_file: String,
    text: &'a str,
    revision: String,
    options: IngestOptions,
}

impl<'a> Ingestor<'a> {
    /// Prepare `text` (read from `source_file`) for ingestion.
    pub fn new(source_file: impl Into<String>, text: &'a str, options: &IngestOptions) -> Self {
        Self {
            source_file: source_file.into(),
            text,
            revision: document_revision(text),
            options: options.clone(),
        }
    }

    /// Name of the document being ingested.
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Revision identifier stamped on every entry of this document.
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Lazily iterate the document's entries from the top.
    ///
    /// The iterator yields at most one error, after which it is exhausted.
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            source_file: &self.source_file,
            revision: &self.revision,
            options: &self.options,
            lines: self.text.split('\n').enumerate(),
            stack: Vec::new(),
            pending: None,
            started: false,
            finished: false,
        }
    }

    /// Ingest the whole document, failing on the first malformed section.
    #[instrument(skip(self), fields(source = %self.source_file))]
    pub fn collect_entries(&self) -> Result<Vec<NoteEntry>> {
        let entries = self.entries().collect::<Result<Vec<_>>>()?;
        debug!(count = entries.len(), "document ingested");
        Ok(entries)
    }
}

/// Ingest `text` in one call.
pub fn ingest(source_file: &str, text: &str, options: &IngestOptions) -> Result<Vec<NoteEntry>> {
    Ingestor::new(source_file, text, options).collect_entries()
}

// ---------------------------------------------------------------------------
// Section iterator
// ---------------------------------------------------------------------------

/// Lazy iterator over a document's note entries. See [`Ingestor::entries`].
pub struct Entries<'a> {
    source_file: &'a str,
    revision: &'a str,
    options: &'a IngestOptions,
    /// Lines split on `\n` only; a CRLF document keeps its `\r`.
    lines: Enumerate<Split<'a, char>>,
    /// Open headings as `(level, title)`, outermost first.
    stack: Vec<(usize, String)>,
    /// Heading that terminated the previous section.
    pending: Option<Heading>,
    started: bool,
    finished: bool,
}

#[derive(Debug)]
struct Heading {
    level: usize,
    title: String,
    line: usize,
}

struct Section<'a> {
    prose: Vec<&'a str>,
    examples: Vec<CodeExample>,
    next: Option<Heading>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<NoteEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.advance() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<'a> Entries<'a> {
    fn advance(&mut self) -> Result<Option<NoteEntry>> {
        if !self.started {
            self.started = true;
            let preamble = self.read_section(None)?;
            if !preamble.prose.iter().all(|l| l.trim().is_empty()) || !preamble.examples.is_empty()
            {
                debug!(source = self.source_file, "skipping text before the first heading");
            }
            self.pending = preamble.next;
        }

        let Some(heading) = self.pending.take() else {
            return Ok(None);
        };

        let topic_path = self.enter(heading)?;
        let section = self.read_section(Some(&topic_path))?;
        self.pending = section.next;

        trace!(topic = %topic_path, examples = section.examples.len(), "section parsed");

        Ok(Some(NoteEntry {
            topic_path,
            body: cleanup::join_body(&section.prose),
            examples: section.examples,
            source_file: self.source_file.to_string(),
            revision: self.revision.to_string(),
        }))
    }

    /// Push `heading` onto the nesting stack and return its topic path.
    fn enter(&mut self, heading: Heading) -> Result<TopicPath> {
        while matches!(self.stack.last(), Some((level, _)) if *level >= heading.level) {
            self.stack.pop();
        }

        if self.options.strict_headings {
            if heading.title.contains(TOPIC_SEPARATOR) {
                return Err(NotebaseError::parse(
                    self.source_file,
                    heading.line,
                    format!(
                        "heading '{}' contains the topic separator '{TOPIC_SEPARATOR}'",
                        heading.title
                    ),
                ));
            }
            if let Some((parent, parent_title)) = self.stack.last() {
                if heading.level > parent + 1 {
                    return Err(NotebaseError::parse(
                        self.source_file,
                        heading.line,
                        format!(
                            "heading '{}' (h{}) skips a level below '{parent_title}' (h{parent})",
                            heading.title, heading.level
                        ),
                    ));
                }
            }
        }

        self.stack.push((heading.level, heading.title));
        TopicPath::new(self.stack.iter().map(|(_, title)| title.as_str()))
    }

    /// Consume lines up to (and including) the next heading outside a fence.
    fn read_section(&mut self, topic: Option<&TopicPath>) -> Result<Section<'a>> {
        let mut prose = Vec::new();
        let mut examples = Vec::new();

        while let Some((idx, line)) = self.lines.next() {
            let line_no = idx + 1;

            if let Some(fence) = Fence::open(line) {
                examples.push(self.read_fence(&fence, line_no, topic)?);
                continue;
            }

            if let Some(heading) = parse_heading(line, line_no, self.source_file)? {
                return Ok(Section {
                    prose,
                    examples,
                    next: Some(heading),
                });
            }

            prose.push(line.strip_suffix('\r').unwrap_or(line));
        }

        Ok(Section {
            prose,
            examples,
            next: None,
        })
    }

    /// Consume a fenced block whose opening line was `line_no`.
    fn read_fence(
        &mut self,
        fence: &Fence,
        line_no: usize,
        topic: Option<&TopicPath>,
    ) -> Result<CodeExample> {
        let mut code: Vec<&str> = Vec::new();

        for (_, line) in self.lines.by_ref() {
            if fence.is_closed_by(line) {
                let language = fence
                    .language
                    .clone()
                    .unwrap_or_else(|| self.options.default_language.clone());
                return Ok(CodeExample {
                    language,
                    code: code.join("\n"),
                });
            }
            code.push(line);
        }

        let location = topic
            .map(|t| format!("under '{t}'"))
            .unwrap_or_else(|| "before the first heading".to_string());
        Err(NotebaseError::parse(
            self.source_file,
            line_no,
            format!("unterminated code fence {location}"),
        ))
    }
}

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

/// An open code fence: its marker character, run length and language.
#[derive(Debug)]
struct Fence {
    marker: char,
    len: usize,
    language: Option<String>,
}

impl Fence {
    /// Recognize an opening fence line (up to three spaces of indent).
    fn open(line: &str) -> Option<Self> {
        let rest = strip_indent(line)?;
        let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;

        let len = rest.len() - rest.trim_start_matches(marker).len();
        if len < 3 {
            return None;
        }

        let info = rest[len..].trim();
        // Backtick fences cannot carry backticks in their info string.
        if marker == '`' && info.contains('`') {
            return None;
        }

        Some(Self {
            marker,
            len,
            language: info.split_whitespace().next().map(str::to_string),
        })
    }

    /// Whether `line` closes this fence.
    fn is_closed_by(&self, line: &str) -> bool {
        let Some(rest) = strip_indent(line) else {
            return false;
        };
        let rest = rest.trim_end();
        let run = rest.len() - rest.trim_start_matches(self.marker).len();

        run >= self.len && run == rest.len()
    }
}

/// Drop up to three leading spaces; `None` if the line is indented further.
fn strip_indent(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches(' ');
    (line.len() - rest.len() <= 3).then_some(rest)
}

/// Recognize an ATX heading line.
fn parse_heading(line: &str, line_no: usize, source_file: &str) -> Result<Option<Heading>> {
    static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]+(.*))?$").expect("valid regex")
    });

    let line = line.strip_suffix('\r').unwrap_or(line);
    let Some(caps) = HEADING_RE.captures(line) else {
        return Ok(None);
    };

    let level = caps[1].len();
    let raw_title = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    let title = cleanup::strip_closing_hashes(raw_title);

    if title.is_empty() {
        return Err(NotebaseError::parse(
            source_file,
            line_no,
            format!("empty h{level} heading"),
        ));
    }

    Ok(Some(Heading {
        level,
        title: title.to_string(),
        line: line_no,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    fn load_fixture(name: &str) -> String {
        fs::read_to_string(fixture_path(name))
            .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"))
    }

    fn keys(entries: &[NoteEntry]) -> Vec<String> {
        entries.iter().map(NoteEntry::key).collect()
    }

    // --- Core ingestion tests ---

    #[test]
    fn ingest_nested_headings() {
        let md = "# JavaScript\n\nA language.\n\n## Event loop\n\nOne thread.\n\n## Hoisting\n\nDeclarations move up.\n\n# React\n\n## Hooks\n\nState in functions.\n";
        let entries = ingest("notes.md", md, &IngestOptions::default()).unwrap();

        assert_eq!(
            keys(&entries),
            vec![
                "JavaScript",
                "JavaScript > Event loop",
                "JavaScript > Hoisting",
                "React",
                "React > Hooks",
            ]
        );
        assert_eq!(entries[0].body, "A language.");
        assert_eq!(entries[1].body, "One thread.");
        assert_eq!(entries[3].body, "");
        assert!(entries.iter().all(|e| e.source_file == "notes.md"));
    }

    #[test]
    fn ingest_extracts_code_examples() {
        let md = "# JavaScript\n\n## Closures\n\nFunctions capture scope.\n\n```js\nfunction outer() {\n  let x = 1;\n  return () => x;\n}\n```\n\nMore prose.\n\n```\nplain block\n```\n";
        let entries = ingest("js.md", md, &IngestOptions::default()).unwrap();
        let closures = &entries[1];

        assert_eq!(closures.examples.len(), 2);
        assert_eq!(closures.examples[0].language, "js");
        assert_eq!(
            closures.examples[0].code,
            "function outer() {\n  let x = 1;\n  return () => x;\n}"
        );
        assert_eq!(closures.examples[1].language, "text");
        assert_eq!(closures.examples[1].code, "plain block");
        assert_eq!(closures.body, "Functions capture scope.\n\n\nMore prose.");
    }

    #[test]
    fn default_language_is_configurable() {
        let opts = IngestOptions {
            default_language: "plaintext".into(),
            ..IngestOptions::default()
        };
        let entries = ingest("a.md", "# A\n\n```\nx\n```\n", &opts).unwrap();
        assert_eq!(entries[0].examples[0].language, "plaintext");
    }

    #[test]
    fn headings_inside_fences_are_code() {
        let md = "# HTML\n\n## Script loading\n\n```md\n# not a heading\n```\n\nDefer runs after parsing.\n";
        let entries = ingest("html.md", md, &IngestOptions::default()).unwrap();

        assert_eq!(keys(&entries), vec!["HTML", "HTML > Script loading"]);
        assert_eq!(entries[1].examples[0].code, "# not a heading");
    }

    #[test]
    fn tilde_and_longer_fences() {
        let md = "# Fences\n\n~~~~python extra words\nprint('```')\n~~~\nstill code\n~~~~\n\n````\n```\nnested\n```\n````\n";
        let entries = ingest("f.md", md, &IngestOptions::default()).unwrap();
        let examples = &entries[0].examples;

        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].language, "python");
        assert_eq!(examples[0].code, "print('```')\n~~~\nstill code");
        assert_eq!(examples[1].code, "```\nnested\n```");
    }

    #[test]
    fn preamble_is_skipped() {
        let md = "Study notes, spring term.\n\n```\nstray\n```\n\n# CSS\n\nCascading.\n";
        let entries = ingest("css.md", md, &IngestOptions::default()).unwrap();
        assert_eq!(keys(&entries), vec!["CSS"]);
    }

    #[test]
    fn document_without_headings_yields_nothing() {
        let entries = ingest("empty.md", "just prose\n", &IngestOptions::default()).unwrap();
        assert!(entries.is_empty());
        assert!(ingest("blank.md", "", &IngestOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn closing_hashes_and_indent_are_stripped() {
        let md = "  # JavaScript #\n\n## Hoisting ##\n\nText.\n#hashtag is prose\n";
        let entries = ingest("a.md", md, &IngestOptions::default()).unwrap();
        assert_eq!(keys(&entries), vec!["JavaScript", "JavaScript > Hoisting"]);
        assert_eq!(entries[1].body, "Text.\n#hashtag is prose");
    }

    #[test]
    fn document_may_start_below_h1() {
        let md = "## React\n\n### Fiber\n\nIncremental rendering.\n\n## CSS\n";
        let entries = ingest("a.md", md, &IngestOptions::default()).unwrap();
        assert_eq!(keys(&entries), vec!["React", "React > Fiber", "CSS"]);
    }

    #[test]
    fn revision_matches_document_digest() {
        let md = "# A\n\nbody\n";
        let ingestor = Ingestor::new("a.md", md, &IngestOptions::default());
        let entries = ingestor.collect_entries().unwrap();
        assert_eq!(entries[0].revision, document_revision(md));
        assert_eq!(ingestor.revision(), entries[0].revision);
    }

    // --- Laziness and determinism ---

    #[test]
    fn entries_are_restartable_and_deterministic() {
        let md = load_fixture("notes/javascript.md");
        let ingestor = Ingestor::new("javascript.md", &md, &IngestOptions::default());

        let first: Vec<_> = ingestor.entries().collect::<Result<_>>().unwrap();
        let second: Vec<_> = ingestor.entries().collect::<Result<_>>().unwrap();
        assert_eq!(first, second);

        let again = ingest("javascript.md", &md, &IngestOptions::default()).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn entries_are_lazy() {
        let md = "# A\n\nfine\n\n# B\n\n```js\nnever closed\n";
        let ingestor = Ingestor::new("lazy.md", md, &IngestOptions::default());
        let mut iter = ingestor.entries();

        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.key(), "A");
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }

    // --- Error cases ---

    #[test]
    fn unterminated_fence_is_a_parse_error() {
        let md = load_fixture("notes/broken-css.md");
        let ingestor = Ingestor::new("broken-css.md", &md, &IngestOptions::default());

        let results: Vec<_> = ingestor.entries().collect();
        let produced: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(NoteEntry::key)
            .collect();
        assert!(!produced.contains(&"CSS > Box Model".to_string()));

        let err = ingestor.collect_entries().unwrap_err();
        match err {
            NotebaseError::Parse {
                source_file,
                message,
                ..
            } => {
                assert_eq!(source_file, "broken-css.md");
                assert!(message.contains("unterminated code fence"));
                assert!(message.contains("CSS > Box Model"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_fence_reports_opening_line() {
        let md = "# CSS\n\n## Box Model\n\n```css\n.box { padding: 0; }\n";
        let err = ingest("box.md", md, &IngestOptions::default()).unwrap_err();
        match err {
            NotebaseError::Parse { line, .. } => assert_eq!(line, 5),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn skipped_heading_level_rejected_in_strict_mode() {
        let md = "# CSS\n\n### Flexbox\n\nOne axis.\n";
        let err = ingest("css.md", md, &IngestOptions::default()).unwrap_err();
        assert!(err.to_string().contains("skips a level"));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn skipped_heading_level_accepted_when_lenient() {
        let md = "# CSS\n\n### Flexbox\n\nOne axis.\n";
        let opts = IngestOptions {
            strict_headings: false,
            ..IngestOptions::default()
        };
        let entries = ingest("css.md", md, &opts).unwrap();
        assert_eq!(keys(&entries), vec!["CSS", "CSS > Flexbox"]);
    }

    #[test]
    fn separator_in_heading_rejected_in_strict_mode() {
        let md = "# CSS > Selectors\n\nMatch elements.\n";
        let err = ingest("a.md", md, &IngestOptions::default()).unwrap_err();
        assert!(err.to_string().contains("topic separator"));
        assert!(err.to_string().contains("line 1"));

        let lenient = IngestOptions {
            strict_headings: false,
            ..IngestOptions::default()
        };
        let entries = ingest("a.md", md, &lenient).unwrap();
        assert_eq!(entries[0].topic_path.segments(), &["CSS > Selectors".to_string()]);
    }

    #[test]
    fn arrows_in_heading_are_accepted() {
        let md = "# JavaScript\n\n## Arrow functions (=>)\n\nLexical this.\n";
        let entries = ingest("js.md", md, &IngestOptions::default()).unwrap();
        assert_eq!(entries[1].key(), "JavaScript > Arrow functions (=>)");
        assert_eq!(TopicPath::parse(&entries[1].key()).unwrap(), entries[1].topic_path);
    }

    #[test]
    fn crlf_document_keeps_code_bytes_and_clean_prose() {
        let md = "# A\r\n\r\nProse.\r\n\r\n```js\r\nlet x = 1;\r\nlet y = 2;\r\n```\r\n";
        let entries = ingest("crlf.md", md, &IngestOptions::default()).unwrap();

        assert_eq!(keys(&entries), vec!["A"]);
        assert_eq!(entries[0].body, "Prose.");
        assert_eq!(entries[0].examples[0].language, "js");
        assert_eq!(entries[0].examples[0].code, "let x = 1;\r\nlet y = 2;\r");
    }

    #[test]
    fn empty_heading_rejected() {
        let err = ingest("a.md", "# A\n\n##\n\ntext\n", &IngestOptions::default()).unwrap_err();
        assert!(err.to_string().contains("empty h2 heading"));
    }

    #[test]
    fn options_from_config() {
        let mut config = AppConfig::default();
        config.ingest.strict_headings = false;
        let opts = IngestOptions::from(&config);
        assert!(!opts.strict_headings);
        assert_eq!(opts.default_language, "text");
    }
}
