//! Text normalization passes shared by ingestion, duplicate detection and search.
//!
//! Each pass is a plain function over `&str`; none of them allocate more than
//! the output they return.

/// Join a section's prose lines into a body, dropping blank lines at both ends.
///
/// Inner lines are kept verbatim, trailing whitespace included.
pub(crate) fn join_body(lines: &[&str]) -> String {
    let is_blank = |line: &&str| line.trim().is_empty();

    let Some(start) = lines.iter().position(|l| !is_blank(l)) else {
        return String::new();
    };
    // A non-blank line exists, so `rposition` finds one too.
    let end = lines.iter().rposition(|l| !is_blank(l)).unwrap_or(start);

    lines[start..=end].join("\n")
}

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    tokens(text).collect::<Vec<_>>().join(" ")
}

/// Whitespace-delimited tokens of `text`, case preserved.
pub fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

/// Lowercased search terms with surrounding punctuation removed.
pub fn search_terms(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// Strip an optional closing `#` run from an ATX heading title.
///
/// `Title ##` becomes `Title`, while `C#` is left alone because the run is
/// not separated from the text by whitespace.
pub(crate) fn strip_closing_hashes(title: &str) -> &str {
    let trimmed = title.trim();
    let without = trimmed.trim_end_matches('#');

    if without.is_empty() {
        ""
    } else if without.ends_with([' ', '\t']) {
        without.trim_end()
    } else {
        trimmed
    }
}
