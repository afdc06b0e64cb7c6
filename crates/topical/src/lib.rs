//! # Topical
//!
//! An LDA topic-modeling pipeline over tokenized documents.
//!
//! Topical reads preprocessed documents from a SQL table, builds a
//! deterministic vocabulary and document-term matrix, fits a topic
//! model, and writes per-document topic distributions and per-topic
//! top-term listings back to the database. A second, loosely coupled
//! stage asks a text-generation service for a human-readable
//! description of each topic.
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌────────────┐   ┌───────────┐
//! │ documents │──▶│  vectorizer  │──▶│ LDA adapter │──▶│  SQLite   │
//! │  (table)  │   │ vocab + DTM  │   │ fit+extract │   │  tables   │
//! └───────────┘   └──────────────┘   └────────────┘   └─────┬─────┘
//!                                                           │
//!                                     ┌────────────┐        ▼
//!                                     │  explainer │◀── topic_terms
//!                                     │ (LLM chat) │──▶ explanations
//!                                     └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | SQLite connection |
//! | [`tables`] | Tabular source/sink with replace semantics |
//! | [`model_cmd`] | Modeling pipeline orchestration |
//! | [`explain_cmd`] | Ollama generator and explanation stage |
//! | [`load`] | JSON document loading |
//! | [`stats_cmd`] | Corpus statistics |

pub mod config;
pub mod db;
pub mod explain_cmd;
pub mod load;
pub mod model_cmd;
pub mod stats_cmd;
pub mod tables;
