//! Document loading from a JSON file into the documents table.
//!
//! Accepts a JSON array of `{doc_id, tokens}` records and replaces the
//! configured documents table with them, storing the token list as a
//! JSON string array.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;

use topical_core::models::PreprocessedDocument;

use crate::config::Config;
use crate::db;
use crate::tables;

pub async fn run_load(config: &Config, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read document file: {}", file.display()))?;

    let docs: Vec<PreprocessedDocument> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse document file: {}", file.display()))?;

    let mut seen: HashSet<&str> = HashSet::new();
    for doc in &docs {
        if !seen.insert(&doc.doc_id) {
            bail!("duplicate doc_id in document file: {:?}", doc.doc_id);
        }
    }

    let pool = db::connect(&config.db.path).await?;
    tables::init_schema(&pool, &config.tables).await?;

    let loaded_at = Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DELETE FROM {}", config.tables.documents))
        .execute(&mut *tx)
        .await?;

    let insert = format!(
        "INSERT INTO {} (doc_id, tokens, loaded_at) VALUES (?, ?, ?)",
        config.tables.documents
    );
    for doc in &docs {
        let tokens_json = serde_json::to_string(&doc.tokens)?;
        sqlx::query(&insert)
            .bind(&doc.doc_id)
            .bind(tokens_json)
            .bind(loaded_at)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    println!(
        "loaded {} documents into '{}'",
        docs.len(),
        config.tables.documents
    );

    Ok(())
}
