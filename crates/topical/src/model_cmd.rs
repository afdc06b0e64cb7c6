//! Topic-modeling pipeline orchestration.
//!
//! Coordinates the full modeling flow: read documents → build
//! vocabulary and document-term matrix → fit the injected topic model →
//! extract the doc-topic and topic-term tables → write both atomically.

use anyhow::{Context, Result};

use topical_core::lda::{extract_doc_topics, extract_topic_terms, TopicModel};
use topical_core::vectorizer::{Dtm, Vocabulary};

use crate::config::Config;
use crate::db;
use crate::tables;

/// Run the modeling pipeline with the given decomposition capability.
pub async fn run_model(config: &Config, model: &dyn TopicModel) -> Result<()> {
    let pool = db::connect(&config.db.path).await?;

    let docs = tables::read_documents(&pool, &config.tables.documents).await?;
    println!(
        "read {} documents from '{}'",
        docs.len(),
        config.tables.documents
    );

    let vocab = Vocabulary::build(&docs);
    let dtm = Dtm::build(&docs, &vocab)
        .context("document collection produced no usable document-term matrix")?;
    println!(
        "built document-term matrix: {} docs x {} terms",
        dtm.n_docs(),
        dtm.n_terms()
    );

    let params = config.model.fit_params()?;
    let fitted = model.fit(&dtm, &params)?;
    println!(
        "fitted topic model: {} topics, {} iterations",
        params.n_topics, params.max_iter
    );

    let doc_ids: Vec<String> = docs.iter().map(|doc| doc.doc_id.clone()).collect();
    let doc_topics = extract_doc_topics(&fitted, &doc_ids)?;
    let topic_terms = extract_topic_terms(&fitted, &vocab, config.model.n_top_words)?;

    tables::write_model_tables(
        &pool,
        &config.tables,
        &doc_topics,
        &topic_terms,
        params.n_topics,
    )
    .await?;
    println!(
        "wrote {} rows to '{}' and {} rows to '{}'",
        doc_topics.len(),
        config.tables.doc_topic,
        topic_terms.len(),
        config.tables.topic_term
    );

    Ok(())
}
