//! # Topical CLI
//!
//! The `topical` binary runs the topic-modeling pipeline over a batch
//! of preprocessed documents stored in SQLite.
//!
//! ## Usage
//!
//! ```bash
//! topical --config ./config/topical.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `topical init` | Create the input tables (documents, query information) |
//! | `topical load <file>` | Replace the documents table with a JSON document file |
//! | `topical stats` | Print corpus statistics (documents, vocabulary, top terms) |
//! | `topical model` | Fit LDA and write the doc-topic and topic-term tables |
//! | `topical explain` | Generate per-topic descriptions via an Ollama-compatible API |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use topical_core::lda::GibbsLda;

use topical::explain_cmd::OllamaGenerator;
use topical::{config, db, explain_cmd, load, model_cmd, stats_cmd, tables};

/// Topical — an LDA topic-modeling pipeline for tokenized documents.
#[derive(Parser)]
#[command(
    name = "topical",
    about = "Topical — an LDA topic-modeling pipeline for tokenized documents",
    version,
    long_about = "Topical ingests tokenized documents from a SQL table, builds a deterministic \
    vocabulary and document-term matrix, fits a Latent Dirichlet Allocation topic model, and \
    writes per-document topic distributions and per-topic top-term listings. An optional second \
    stage asks a text-generation service to describe each topic in natural language."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/topical.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the input tables.
    ///
    /// Creates the documents and query-information tables if they do
    /// not exist. Idempotent — running it multiple times is safe.
    Init,

    /// Load documents from a JSON file into the documents table.
    ///
    /// The file must contain a JSON array of `{"doc_id": ..., "tokens": [...]}`
    /// records. Replaces any previously loaded documents.
    Load {
        /// Path to the JSON document file.
        file: PathBuf,
    },

    /// Print corpus statistics.
    ///
    /// Shows document, token, and vocabulary counts plus the
    /// highest-frequency words and n-grams.
    Stats,

    /// Fit the topic model and write the output tables.
    ///
    /// Builds the vocabulary and document-term matrix, fits LDA with
    /// the configured topic count, iterations, learning method, and
    /// random seed, then replaces the doc-topic and topic-term tables
    /// in a single transaction.
    Model,

    /// Generate natural-language topic descriptions.
    ///
    /// Reads the topic-term table and query metadata, asks the
    /// configured text-generation model to describe each topic, and
    /// replaces the explanations table. Requires the topic-term table
    /// to exist (run `topical model` first).
    Explain,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&config.db.path).await?;
            tables::init_schema(&pool, &config.tables).await?;
            println!("initialized schema at {}", config.db.path.display());
            Ok(())
        }
        Commands::Load { file } => load::run_load(&config, &file).await,
        Commands::Stats => stats_cmd::run_stats(&config).await,
        Commands::Model => model_cmd::run_model(&config, &GibbsLda::default()).await,
        Commands::Explain => {
            let generator = Arc::new(OllamaGenerator::new(&config.explain));
            explain_cmd::run_explain(&config, generator).await
        }
    }
}
