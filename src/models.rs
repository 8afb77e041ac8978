//! Core data models used throughout Folio.
//!
//! These types represent the metadata records, collection summaries, and chat
//! messages that flow through the indexing and chat pipelines.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single metadata field value: either a plain scalar or, for the
/// `chapters` field of a multi-document book, an ordered chapter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Chapters(Vec<ChapterRef>),
    Scalar(String),
}

/// One chapter entry from a book's index header. Sequence order is the
/// canonical reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRef {
    pub id: String,
    pub title: String,
    pub file: String,
}

/// Open-field-set metadata record extracted from a document header.
///
/// Keys are unique (last occurrence wins). Typed accessors are layered over
/// the generic mapping for the fields the rest of the system recognizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub BTreeMap<String, FieldValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: FieldValue) {
        self.0.insert(key, value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Scalar value of a field, if present and scalar.
    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(FieldValue::Scalar(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The ordered chapter list, if this record describes a multi-document book.
    pub fn chapters(&self) -> Option<&[ChapterRef]> {
        match self.0.get("chapters") {
            Some(FieldValue::Chapters(c)) => Some(c.as_slice()),
            _ => None,
        }
    }

    /// The `date` field parsed as a calendar date. `%Y-%m-%d` is the
    /// canonical format; a full RFC 3339 timestamp is accepted as a fallback.
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.scalar("date")?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.date_naive())
            })
    }
}

/// Metadata-only projection of one collection member, persisted in the
/// per-collection lookup file and consumed by list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: Metadata,
    pub filename: String,
}

/// A full document loaded on demand: metadata plus the body text with the
/// header block removed. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DetailRecord {
    pub id: String,
    pub fields: Metadata,
    pub content: String,
}

/// Role of a chat message in the provider wire vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a chat session's history.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Monotonic, time-derived id.
    pub id: i64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Model that produced this message (assistant replies only).
    pub model: Option<String>,
    /// True for assistant-role messages that surface a failed request.
    pub is_error: bool,
}
