//! Read side of the content tree: persisted lookups, document details, and
//! chapter navigation for multi-document books.
//!
//! List views read the JSON lookups the indexer wrote; detail views go back
//! to the markdown sources and extract on demand. Every miss is a contained,
//! descriptive error — nothing here is fatal to the rest of the process.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::frontmatter;
use crate::models::{ChapterRef, DetailRecord, Metadata, SummaryRecord};

/// Read a collection's persisted lookup resource.
pub fn get_collection(config: &Config, name: &str) -> Result<Vec<SummaryRecord>> {
    let path = config.output.dir.join(format!("{name}.json"));
    let json = std::fs::read_to_string(&path).with_context(|| {
        format!(
            "Failed to load {} data: {} (run `folio index` first?)",
            name,
            path.display()
        )
    })?;
    let records: Vec<SummaryRecord> = serde_json::from_str(&json)
        .with_context(|| format!("Malformed lookup file: {}", path.display()))?;
    Ok(records)
}

/// Resolve a collection member's source document.
///
/// Plain members live at `<root>/<collection>/<id>.md`; multi-document
/// members at `<root>/<collection>/<id>/index.md`.
fn document_path(config: &Config, collection: &str, id: &str) -> Result<PathBuf> {
    let ext = &config.content.extension;
    let flat = config
        .content
        .root
        .join(collection)
        .join(format!("{id}.{ext}"));
    if flat.is_file() {
        return Ok(flat);
    }
    let nested = config
        .content
        .root
        .join(collection)
        .join(id)
        .join(format!("index.{ext}"));
    if nested.is_file() {
        return Ok(nested);
    }
    bail!("document not found: {}/{}", collection, id);
}

/// Load one document and extract its header on demand.
pub fn load_detail(config: &Config, collection: &str, id: &str) -> Result<DetailRecord> {
    let path = document_path(config, collection, id)?;
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let (fields, content) = frontmatter::extract(&text);
    Ok(DetailRecord {
        id: id.to_string(),
        fields,
        content,
    })
}

/// One chapter of a multi-document book, with its reading-order context.
#[derive(Debug)]
pub struct ChapterView {
    pub book_id: String,
    pub book_title: Option<String>,
    pub chapter: ChapterRef,
    /// Zero-based position in the book's chapter list.
    pub position: usize,
    pub total: usize,
    pub prev: Option<ChapterRef>,
    pub next: Option<ChapterRef>,
    pub fields: Metadata,
    pub content: String,
}

/// Load a chapter by id, navigating through the book's index document.
pub fn load_chapter(config: &Config, book_id: &str, chapter_id: &str) -> Result<ChapterView> {
    let index = load_detail(config, "books", book_id)?;
    let chapters = index
        .fields
        .chapters()
        .with_context(|| format!("book '{book_id}' has no chapter list"))?;

    let position = chapters
        .iter()
        .position(|c| c.id == chapter_id)
        .with_context(|| format!("chapter not found: {book_id}/{chapter_id}"))?;
    let chapter = chapters[position].clone();

    let path = config
        .content
        .root
        .join("books")
        .join(book_id)
        .join(&chapter.file);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read chapter: {}", path.display()))?;
    let (fields, content) = frontmatter::extract(&text);

    Ok(ChapterView {
        book_id: book_id.to_string(),
        book_title: index.fields.scalar("title").map(String::from),
        prev: position.checked_sub(1).map(|i| chapters[i].clone()),
        next: chapters.get(position + 1).cloned(),
        total: chapters.len(),
        position,
        chapter,
        fields,
        content,
    })
}

/// CLI entry point for `folio list <collection>`.
pub fn run_list(config: &Config, name: &str) -> Result<()> {
    let records = get_collection(config, name)?;

    println!("{:<24} {:<12} TITLE", "ID", "DATE");
    for record in &records {
        println!(
            "{:<24} {:<12} {}",
            record.id,
            record.fields.scalar("date").unwrap_or("-"),
            record.fields.scalar("title").unwrap_or("(untitled)")
        );
    }
    println!("{} documents", records.len());
    Ok(())
}

/// CLI entry point for `folio show <collection> <id>`.
pub fn run_show(config: &Config, collection: &str, id: &str) -> Result<()> {
    let detail = load_detail(config, collection, id)?;
    print_metadata(&detail.fields);
    println!();
    println!("--- Body ---");
    println!("{}", detail.content);
    Ok(())
}

/// CLI entry point for `folio chapter <book> <chapter>`.
pub fn run_chapter(config: &Config, book_id: &str, chapter_id: &str) -> Result<()> {
    let view = load_chapter(config, book_id, chapter_id)?;

    println!("--- Chapter ---");
    println!(
        "book:     {}",
        view.book_title.as_deref().unwrap_or(&view.book_id)
    );
    println!(
        "chapter:  {} ({} of {})",
        view.chapter.title,
        view.position + 1,
        view.total
    );
    if let Some(ref prev) = view.prev {
        println!("previous: {}", prev.id);
    }
    if let Some(ref next) = view.next {
        println!("next:     {}", next.id);
    }
    println!();
    println!("{}", view.content);
    Ok(())
}

/// CLI entry point for `folio extract <path>` — the extractor debug surface.
pub fn run_extract(path: &std::path::Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let (fields, body) = frontmatter::extract(&text);
    print_metadata(&fields);
    println!();
    println!("--- Body ---");
    println!("{body}");
    Ok(())
}

fn print_metadata(fields: &Metadata) {
    println!("--- Metadata ---");
    for (key, value) in &fields.0 {
        match value {
            crate::models::FieldValue::Scalar(s) => println!("{key}: {s}"),
            crate::models::FieldValue::Chapters(chapters) => {
                println!("{key}:");
                for chapter in chapters {
                    println!("  - {} ({}, {})", chapter.id, chapter.title, chapter.file);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer;
    use std::fs;
    use tempfile::TempDir;

    fn book_tree() -> (TempDir, Config) {
        let tmp = TempDir::new().unwrap();
        let books = tmp.path().join("content/books");
        fs::create_dir_all(books.join("serial")).unwrap();
        fs::write(
            books.join("serial/index.md"),
            "---\ntitle: 'Serial Novel'\ndate: 2024-02-02\nchapters:\n  - id: 'c1', title: 'One', file: 'c1.md'\n  - id: 'c2', title: 'Two', file: 'c2.md'\n  - id: 'c3', title: 'Three', file: 'c3.md'\n---\nAbout the serial.",
        )
        .unwrap();
        fs::write(
            books.join("serial/c2.md"),
            "---\ntitle: 'Two'\n---\nChapter two text.",
        )
        .unwrap();
        fs::write(
            books.join("solo.md"),
            "---\ntitle: 'Solo'\ndate: 2024-01-01\n---\nA standalone book.",
        )
        .unwrap();

        let config = Config::for_content_tree(
            &tmp.path().join("content"),
            &tmp.path().join("data"),
            &["books"],
        );
        (tmp, config)
    }

    #[test]
    fn get_collection_round_trips_through_the_lookup_file() {
        let (_tmp, config) = book_tree();
        let written = indexer::index_collection(&config, "books");
        indexer::write_collection(&config, "books", &written).unwrap();

        let read = get_collection(&config, "books").unwrap();
        assert_eq!(read, written);
        assert_eq!(read[0].id, "serial");
    }

    #[test]
    fn missing_lookup_is_a_descriptive_error() {
        let (_tmp, config) = book_tree();
        let err = get_collection(&config, "books").unwrap_err().to_string();
        assert!(err.contains("books"), "unhelpful error: {err}");
    }

    #[test]
    fn load_detail_prefers_flat_file_then_index() {
        let (_tmp, config) = book_tree();

        let solo = load_detail(&config, "books", "solo").unwrap();
        assert_eq!(solo.fields.scalar("title"), Some("Solo"));
        assert_eq!(solo.content, "A standalone book.");

        let serial = load_detail(&config, "books", "serial").unwrap();
        assert_eq!(serial.fields.scalar("title"), Some("Serial Novel"));
        assert_eq!(serial.fields.chapters().unwrap().len(), 3);

        assert!(load_detail(&config, "books", "ghost").is_err());
    }

    #[test]
    fn load_chapter_reports_reading_order_context() {
        let (_tmp, config) = book_tree();
        let view = load_chapter(&config, "serial", "c2").unwrap();

        assert_eq!(view.book_title.as_deref(), Some("Serial Novel"));
        assert_eq!(view.chapter.title, "Two");
        assert_eq!(view.position, 1);
        assert_eq!(view.total, 3);
        assert_eq!(view.prev.as_ref().unwrap().id, "c1");
        assert_eq!(view.next.as_ref().unwrap().id, "c3");
        assert_eq!(view.content, "Chapter two text.");
    }

    #[test]
    fn unknown_chapter_is_an_error() {
        let (_tmp, config) = book_tree();
        assert!(load_chapter(&config, "serial", "c9").is_err());
        assert!(load_chapter(&config, "ghost", "c1").is_err());
        // Standalone books have no chapter list.
        assert!(load_chapter(&config, "solo", "c1").is_err());
    }
}
