//! # Folio CLI (`folio`)
//!
//! The `folio` binary drives the content pipeline and the chat client. All
//! commands accept a `--config` flag pointing to a TOML configuration file.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `folio index [collection]` | Build the JSON lookup files |
//! | `folio list <collection>` | Print a collection's summary records |
//! | `folio show <collection> <id>` | Print one document's metadata and body |
//! | `folio chapter <book> <chapter>` | Print one chapter of a multi-document book |
//! | `folio extract <path>` | Run the frontmatter extractor on a single file |
//! | `folio chat` | Start an interactive chat session |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use folio::{chat, config, indexer, store};

/// Folio — a markdown content pipeline and chat gateway for personal sites.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/folio.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "folio",
    about = "Folio — a markdown content pipeline and chat gateway for personal sites",
    version,
    long_about = "Folio indexes collections of frontmatter-headed markdown documents into \
    JSON lookup files, serves document and chapter reads over the same conventions, and \
    manages a multi-provider chat session (OpenRouter, DeepSeek)."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/folio.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Build the per-collection JSON lookup files.
    ///
    /// Scans each configured collection directory, extracts every document's
    /// header, and writes a date-sorted summary list. This command is
    /// idempotent — unchanged inputs produce byte-identical output.
    Index {
        /// Index only this collection (default: all configured collections).
        collection: Option<String>,

        /// Show document counts without writing lookup files.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print a collection's summary records from its persisted lookup.
    List {
        /// Collection name (e.g. `publications`).
        collection: String,
    },

    /// Print one document's metadata and body.
    Show {
        /// Collection name.
        collection: String,
        /// Document id (file stem or book directory name).
        id: String,
    },

    /// Print one chapter of a multi-document book, with reading-order context.
    Chapter {
        /// Book id (directory name under the books collection).
        book: String,
        /// Chapter id from the book's index header.
        chapter: String,
    },

    /// Run the frontmatter extractor on a single file (debug surface).
    Extract {
        /// Path to a markdown document.
        path: PathBuf,
    },

    /// Start an interactive chat session.
    ///
    /// Credentials are read from the selected provider's environment
    /// variable (OPENROUTER_API_KEY or DEEPSEEK_API_KEY).
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // The extractor needs no configuration.
    if let Commands::Extract { path } = &cli.command {
        store::run_extract(path)?;
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Index {
            collection,
            dry_run,
        } => {
            indexer::run_index(&cfg, collection, dry_run)?;
        }
        Commands::List { collection } => {
            store::run_list(&cfg, &collection)?;
        }
        Commands::Show { collection, id } => {
            store::run_show(&cfg, &collection, &id)?;
        }
        Commands::Chapter { book, chapter } => {
            store::run_chapter(&cfg, &book, &chapter)?;
        }
        Commands::Extract { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
        Commands::Chat => {
            chat::run_chat(&cfg).await?;
        }
    }

    Ok(())
}
