//! Collection indexing: markdown directories in, JSON lookup files out.
//!
//! Scans the direct children of a collection directory, extracts each
//! document's header, and persists a date-sorted list of [`SummaryRecord`]s
//! at `<output.dir>/<collection>.json`. List views consume the persisted
//! lookups; detail views go back to the source documents.

use std::cmp::Reverse;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::Config;
use crate::frontmatter;
use crate::models::SummaryRecord;

/// Index one collection directory into an ordered list of summary records.
///
/// A plain `<id>.md` file becomes one record; a subdirectory becomes one
/// record only if it holds an `index.md` (a multi-document book), with the
/// directory name as both `id` and `filename`. Other entries are skipped.
///
/// An unreadable source directory logs a warning and yields an empty list so
/// the remaining collections still index.
pub fn index_collection(config: &Config, name: &str) -> Vec<SummaryRecord> {
    let dir = config.content.root.join(name);
    let ext = config.content.extension.as_str();
    let index_file = format!("index.{ext}");
    let suffix = format!(".{ext}");

    if !dir.is_dir() {
        warn!(collection = name, path = %dir.display(), "collection directory unreadable, skipping");
        return Vec::new();
    }

    let mut records = Vec::new();

    // Direct children only; sorted walk keeps enumeration deterministic.
    let walker = WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(collection = name, error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().to_string();

        if entry.file_type().is_dir() {
            // Multi-document member: only directories with an index document.
            let index_path = path.join(&index_file);
            if !index_path.is_file() {
                warn!(collection = name, dir = %file_name, "subdirectory has no index document, skipping");
                continue;
            }
            if let Some(record) = summarize(&index_path, &file_name, &file_name) {
                records.push(record);
            }
        } else if let Some(stem) = file_name.strip_suffix(suffix.as_str()) {
            if let Some(record) = summarize(path, stem, &file_name) {
                records.push(record);
            }
        }
    }

    sort_newest_first(&mut records);
    records
}

/// Read one document and project its header into a summary record.
fn summarize(path: &Path, id: &str, filename: &str) -> Option<SummaryRecord> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable document");
            return None;
        }
    };
    let (fields, _body) = frontmatter::extract(&text);
    Some(SummaryRecord {
        id: id.to_string(),
        fields,
        filename: filename.to_string(),
    })
}

/// Sort descending by date; missing or unparsable dates sort as earliest and
/// float to the end. Ties break ascending by id for a stable, reproducible
/// output file.
fn sort_newest_first(records: &mut [SummaryRecord]) {
    records.sort_by(|a, b| {
        let da = a.fields.date().unwrap_or(NaiveDate::MIN);
        let db = b.fields.date().unwrap_or(NaiveDate::MIN);
        Reverse(da).cmp(&Reverse(db)).then_with(|| a.id.cmp(&b.id))
    });
}

/// Persist a collection's summary list as pretty-printed JSON.
///
/// Creates missing parent directories first. Output is byte-identical across
/// re-runs with unchanged inputs.
pub fn write_collection(config: &Config, name: &str, records: &[SummaryRecord]) -> Result<()> {
    let out_path = config.output.dir.join(format!("{name}.json"));
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(&out_path, json)
        .with_context(|| format!("Failed to write lookup file: {}", out_path.display()))?;
    Ok(())
}

/// CLI entry point for `folio index [collection]`.
pub fn run_index(config: &Config, collection: Option<String>, dry_run: bool) -> Result<()> {
    let names: Vec<String> = match collection {
        Some(name) => vec![name],
        None => config.content.collections.clone(),
    };

    for name in &names {
        let records = index_collection(config, name);
        if dry_run {
            println!("index {} (dry-run)", name);
            println!("  documents: {}", records.len());
            continue;
        }
        write_collection(config, name, &records)?;
        println!("index {}", name);
        println!("  documents: {}", records.len());
        println!(
            "  wrote: {}",
            config.output.dir.join(format!("{name}.json")).display()
        );
    }
    println!("ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    fn test_config(root: &Path, out: &Path) -> Config {
        Config::for_content_tree(root, out, &["publications", "talks", "books"])
    }

    fn doc(date: Option<&str>, title: &str) -> String {
        match date {
            Some(d) => format!("---\ntitle: '{title}'\ndate: {d}\n---\nBody of {title}."),
            None => format!("---\ntitle: '{title}'\n---\nBody of {title}."),
        }
    }

    #[test]
    fn indexes_files_newest_first() {
        let tmp = TempDir::new().unwrap();
        let pubs = tmp.path().join("content/publications");
        fs::create_dir_all(&pubs).unwrap();
        fs::write(pubs.join("a.md"), doc(Some("2024-01-01"), "A")).unwrap();
        fs::write(pubs.join("b.md"), doc(Some("2024-06-01"), "B")).unwrap();

        let config = test_config(&tmp.path().join("content"), &tmp.path().join("data"));
        let records = index_collection(&config, "publications");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "b");
        assert_eq!(records[1].id, "a");
        assert_eq!(records[0].filename, "b.md");
    }

    #[test]
    fn undated_documents_float_to_the_end() {
        let tmp = TempDir::new().unwrap();
        let talks = tmp.path().join("content/talks");
        fs::create_dir_all(&talks).unwrap();
        fs::write(talks.join("dated.md"), doc(Some("2023-03-03"), "Dated")).unwrap();
        fs::write(talks.join("undated.md"), doc(None, "Undated")).unwrap();
        fs::write(talks.join("garbled.md"), doc(Some("someday"), "Garbled")).unwrap();

        let config = test_config(&tmp.path().join("content"), &tmp.path().join("data"));
        let records = index_collection(&config, "talks");

        assert_eq!(records[0].id, "dated");
        // Invalid and missing dates tie at the end, ordered by id.
        assert_eq!(records[1].id, "garbled");
        assert_eq!(records[2].id, "undated");
    }

    #[test]
    fn subdirectory_with_index_becomes_a_record() {
        let tmp = TempDir::new().unwrap();
        let books = tmp.path().join("content/books");
        fs::create_dir_all(books.join("serial-novel")).unwrap();
        fs::create_dir_all(books.join("drafts")).unwrap();
        fs::write(
            books.join("serial-novel/index.md"),
            "---\ntitle: 'Serial'\ndate: 2024-02-02\nchapters:\n  - id: 'c1', title: 'One', file: 'c1.md'\n---\nAbout.",
        )
        .unwrap();
        fs::write(books.join("standalone.md"), doc(Some("2024-01-01"), "Solo")).unwrap();
        // `drafts/` has no index document and must be skipped.

        let config = test_config(&tmp.path().join("content"), &tmp.path().join("data"));
        let records = index_collection(&config, "books");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "serial-novel");
        assert_eq!(records[0].filename, "serial-novel");
        assert!(records[0].fields.chapters().is_some());
        assert_eq!(records[1].id, "standalone");
    }

    #[test]
    fn non_markdown_files_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let pubs = tmp.path().join("content/publications");
        fs::create_dir_all(&pubs).unwrap();
        fs::write(pubs.join("notes.txt"), "not markdown").unwrap();
        fs::write(pubs.join("paper.md"), doc(Some("2024-01-01"), "P")).unwrap();

        let config = test_config(&tmp.path().join("content"), &tmp.path().join("data"));
        let records = index_collection(&config, "publications");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "paper");
    }

    #[test]
    fn missing_collection_directory_yields_empty_list() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp.path().join("content"), &tmp.path().join("data"));
        let records = index_collection(&config, "publications");
        assert!(records.is_empty());
    }

    #[test]
    fn persisted_output_is_byte_identical_across_runs() {
        let tmp = TempDir::new().unwrap();
        let pubs = tmp.path().join("content/publications");
        fs::create_dir_all(&pubs).unwrap();
        fs::write(pubs.join("a.md"), doc(Some("2024-01-01"), "A")).unwrap();
        fs::write(pubs.join("b.md"), doc(Some("2024-06-01"), "B")).unwrap();

        let config = test_config(&tmp.path().join("content"), &tmp.path().join("data"));

        let records = index_collection(&config, "publications");
        write_collection(&config, "publications", &records).unwrap();
        let first = fs::read(tmp.path().join("data/publications.json")).unwrap();

        let records = index_collection(&config, "publications");
        write_collection(&config, "publications", &records).unwrap();
        let second = fs::read(tmp.path().join("data/publications.json")).unwrap();

        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
