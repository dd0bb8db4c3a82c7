//! Minimal renderers used by the CLI to display stored entries.

use notebase_shared::NoteEntry;

/// Render an entry back to Markdown.
///
/// The heading sits at the entry's depth. Code examples are fenced with a
/// longer run than any inside the code, so re-ingesting the output yields the
/// same example text. A language containing a backtick gets a `~` fence.
pub fn render_markdown(entry: &NoteEntry) -> String {
    let mut md = format!(
        "{} {}\n",
        "#".repeat(entry.topic_path.depth().min(6)),
        entry.topic_path.leaf()
    );

    if !entry.body.is_empty() {
        md.push('\n');
        md.push_str(&entry.body);
        md.push('\n');
    }

    for example in &entry.examples {
        let marker = if example.language.contains('`') { '~' } else { '`' };
        let fence = marker
            .to_string()
            .repeat(longest_run(&example.code, marker).max(2) + 1);
        md.push('\n');
        md.push_str(&format!(
            "{fence}{}\n{}\n{fence}\n",
            example.language, example.code
        ));
    }

    md
}

/// Render an entry as plain text with its full topic key and provenance.
pub fn render_text(entry: &NoteEntry) -> String {
    let key = entry.key();
    let mut out = format!("{key}\n{}\n", "=".repeat(key.chars().count()));

    if !entry.body.is_empty() {
        out.push('\n');
        out.push_str(&entry.body);
        out.push('\n');
    }

    for example in &entry.examples {
        out.push_str(&format!("\n[{}]\n{}\n", example.language, example.code));
    }

    out.push_str(&format!(
        "\n(source: {} @ {})\n",
        entry.source_file, entry.revision
    ));
    out
}

fn longest_run(code: &str, marker: char) -> usize {
    code.split(|c| c != marker)
        .map(str::len)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebase_markdown::{IngestOptions, ingest};
    use notebase_shared::{CodeExample, TopicPath};

    fn entry_with(examples: Vec<CodeExample>) -> NoteEntry {
        NoteEntry {
            topic_path: TopicPath::new(["React", "Hooks"]).unwrap(),
            body: "Hooks run in call order.".into(),
            examples,
            source_file: "react.md".into(),
            revision: "abcdef012345".into(),
        }
    }

    fn example(language: &str, code: &str) -> CodeExample {
        CodeExample {
            language: language.into(),
            code: code.into(),
        }
    }

    #[test]
    fn markdown_layout() {
        let md = render_markdown(&entry_with(vec![example("jsx", "useState(0);")]));
        assert_eq!(
            md,
            "## Hooks\n\nHooks run in call order.\n\n```jsx\nuseState(0);\n```\n"
        );
    }

    #[test]
    fn markdown_roundtrip_preserves_code_bytes() {
        let examples = vec![
            example("js", "const a = 1;   \n\n\tindented();\n"),
            example("md", "```js\nnested fence\n```"),
            example("text", ""),
            example("sh", "echo '~~~'\n````\n"),
            example("a`b", "let x = 1;\n~~~\n```"),
        ];
        let entry = entry_with(examples.clone());

        let reparsed = ingest("roundtrip.md", &render_markdown(&entry), &IngestOptions::default())
            .expect("rendered markdown ingests");
        assert_eq!(reparsed.len(), 1);
        assert_eq!(reparsed[0].examples, examples);
        assert_eq!(reparsed[0].body, entry.body);
    }

    #[test]
    fn text_includes_key_and_provenance() {
        let text = render_text(&entry_with(vec![example("jsx", "useState(0);")]));
        assert!(text.starts_with("React > Hooks\n=============\n"));
        assert!(text.contains("[jsx]\nuseState(0);"));
        assert!(text.ends_with("(source: react.md @ abcdef012345)\n"));
    }

    #[test]
    fn backtick_language_uses_tilde_fence() {
        let md = render_markdown(&entry_with(vec![example("a`b", "let x = 1;")]));
        assert!(md.ends_with("~~~a`b\nlet x = 1;\n~~~\n"));

        let reparsed = ingest("a.md", &md, &IngestOptions::default()).unwrap();
        assert_eq!(reparsed[0].examples[0].language, "a`b");
    }

    #[test]
    fn marker_runs() {
        assert_eq!(longest_run("no ticks", '`'), 0);
        assert_eq!(longest_run("a `b` ```c````", '`'), 4);
        assert_eq!(longest_run("~~ ~~~~~", '~'), 5);
    }
}
