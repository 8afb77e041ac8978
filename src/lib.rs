//! # Folio
//!
//! A markdown content pipeline and chat gateway for personal sites.
//!
//! Folio indexes collections of frontmatter-headed markdown documents
//! (publications, talks, books, project write-ups) into JSON lookup files
//! consumed by list views, loads individual documents and book chapters on
//! demand, and manages a small multi-provider chat session.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────┐
//! │ content tree │──▶│  Indexer     │──▶│ JSON lookups │
//! │ <root>/<col> │   │ (build-time)│   │ <out>/<col>  │
//! └──────┬───────┘   └─────────────┘   └──────┬───────┘
//!        │                                    │
//!        ▼                                    ▼
//!  ┌───────────┐                        ┌───────────┐
//!  │  Detail / │                        │   List    │
//!  │  Chapter  │                        │   views   │
//!  └───────────┘                        └───────────┘
//!
//!  ┌──────────────┐   ┌─────────────────────────────┐
//!  │ ChatSession  │──▶│ OpenRouter / DeepSeek HTTP  │
//!  └──────────────┘   └─────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! folio index                   # build lookup files for every collection
//! folio list publications       # read a persisted lookup
//! folio show talks rustconf-24  # metadata + body of one document
//! folio chapter serial c2       # one chapter of a multi-document book
//! folio chat                    # interactive chat session
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`frontmatter`] | Header-block extraction |
//! | [`indexer`] | Collection scan and lookup persistence |
//! | [`store`] | Lookup reads, details, chapter navigation |
//! | [`chat`] | Chat session state machine and providers |

pub mod chat;
pub mod config;
pub mod frontmatter;
pub mod indexer;
pub mod models;
pub mod store;
