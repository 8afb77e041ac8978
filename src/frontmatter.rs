//! Frontmatter extraction for markdown documents.
//!
//! A document optionally begins with a header block delimited by `---` lines.
//! Header lines are `key: value` pairs with an open field set; the `chapters`
//! field of a multi-document book is a list of inline `id`/`title`/`file`
//! triples. Extraction is total: malformed lines degrade to partial metadata
//! and are never an error.
//!
//! ```text
//! ---
//! title: 'Attention Is Not All You Need'
//! date: 2024-06-01
//! chapters:
//!   - id: 'c1', title: 'One', file: 'c1.md'
//! ---
//! Body text...
//! ```

use tracing::warn;

use crate::models::{ChapterRef, FieldValue, Metadata};

/// Maximum excerpt length in characters before truncation.
const EXCERPT_MAX_CHARS: usize = 150;

/// Extract the header block from a document.
///
/// Returns the metadata record and the body text with the header removed.
/// If the document does not open with a `---` delimiter line, the whole
/// document is body text and the record is empty. Pure and deterministic:
/// no I/O, identical output for identical input.
pub fn extract(document: &str) -> (Metadata, String) {
    let lines: Vec<&str> = document.split('\n').collect();

    if !is_delimiter(lines[0]) {
        return (Metadata::new(), document.to_string());
    }
    let close = match lines[1..].iter().position(|l| is_delimiter(l)) {
        Some(offset) => offset + 1,
        None => return (Metadata::new(), document.to_string()),
    };

    let mut meta = Metadata::new();
    let mut i = 1;
    while i < close {
        let line = lines[i];

        // Stray list lines outside a chapters block are dropped, never
        // misread as `- id: ...` keys.
        if line.trim_start().starts_with('-') {
            warn!(line = %line.trim(), "dropping unattached list line in header");
            i += 1;
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            i += 1;
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        // `chapters:` opening a list block overrides plain scalar handling.
        if key == "chapters" && value.is_empty() {
            let mut entries = Vec::new();
            let mut j = i + 1;
            while j < close && lines[j].trim_start().starts_with('-') {
                match parse_chapter_line(lines[j]) {
                    Some(entry) => entries.push(entry),
                    None => {
                        warn!(line = %lines[j].trim(), "dropping malformed chapter entry")
                    }
                }
                j += 1;
            }
            if j > i + 1 {
                meta.insert("chapters".to_string(), FieldValue::Chapters(entries));
                i = j;
                continue;
            }
        }

        meta.insert(
            key.to_string(),
            FieldValue::Scalar(strip_quotes(value).to_string()),
        );
        i += 1;
    }

    let body = lines[close + 1..].join("\n").trim().to_string();

    if !meta.contains("excerpt") {
        meta.insert(
            "excerpt".to_string(),
            FieldValue::Scalar(synthesize_excerpt(&body)),
        );
    }

    (meta, body)
}

/// A header delimiter is a line of exactly `---` (tolerating a CR).
fn is_delimiter(line: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line) == "---"
}

/// Strip one layer of matching wrapping quotes. No escape processing.
fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Parse one `- id: 'x', title: 'y', file: 'z'` chapter line.
///
/// Returns `None` for lines that do not carry all three quoted fields in
/// order; such lines are dropped from the sequence by the caller.
fn parse_chapter_line(line: &str) -> Option<ChapterRef> {
    let rest = line.trim_start().strip_prefix('-')?;
    let (id, rest) = quoted_field(rest, "id")?;
    let (title, rest) = quoted_field(rest, "title")?;
    let (file, _) = quoted_field(rest, "file")?;
    Some(ChapterRef { id, title, file })
}

/// Find `key:` in `s` and read the quoted value that follows.
/// Returns the unquoted value and the remainder after the closing quote.
fn quoted_field<'a>(s: &'a str, key: &str) -> Option<(String, &'a str)> {
    let pattern = format!("{key}:");
    let start = s.find(&pattern)? + pattern.len();
    let rest = s[start..].trim_start();
    let quote = rest.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let inner = &rest[quote.len_utf8()..];
    let end = inner.find(quote)?;
    if end == 0 {
        return None;
    }
    Some((inner[..end].to_string(), &inner[end + quote.len_utf8()..]))
}

/// First paragraph of the body, truncated to [`EXCERPT_MAX_CHARS`] characters
/// with a `...` marker when truncation occurred.
fn synthesize_excerpt(body: &str) -> String {
    let first_paragraph = body.split("\n\n").next().unwrap_or_default();
    let mut excerpt: String = first_paragraph.chars().take(EXCERPT_MAX_CHARS).collect();
    if first_paragraph.chars().count() > EXCERPT_MAX_CHARS {
        excerpt.push_str("...");
    }
    excerpt
}
