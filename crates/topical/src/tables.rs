//! Tabular source and sink over SQLite.
//!
//! The pipeline reads its input documents and query metadata from named
//! tables and writes each output table with replace semantics: drop,
//! recreate, insert, all inside one transaction. The doc-topic and
//! topic-term tables are written in the *same* transaction so a failure
//! between the two can never leave the pair inconsistent.

use anyhow::{bail, Context, Result};
use sqlx::{Row, SqlitePool};

use topical_core::models::{
    parse_tokens, DocTopicRow, PreprocessedDocument, QueryInfo, TopicExplanation, TopicTermRow,
};

use crate::config::TablesConfig;

/// Create the input-side tables if they do not exist.
pub async fn init_schema(pool: &SqlitePool, tables: &TablesConfig) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            doc_id TEXT PRIMARY KEY,
            tokens TEXT NOT NULL,
            loaded_at INTEGER NOT NULL DEFAULT 0
        )
        "#,
        tables.documents
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            query TEXT NOT NULL,
            source TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
        tables.query_information
    ))
    .execute(pool)
    .await?;

    Ok(())
}

/// Read all preprocessed documents, in insertion order.
///
/// A document whose token encoding cannot be parsed fails the whole
/// read — there is no per-document skip.
pub async fn read_documents(pool: &SqlitePool, table: &str) -> Result<Vec<PreprocessedDocument>> {
    let rows = sqlx::query(&format!(
        "SELECT doc_id, tokens FROM {} ORDER BY rowid",
        table
    ))
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to read documents from table {:?}", table))?;

    let mut docs = Vec::with_capacity(rows.len());
    for row in rows {
        let doc_id: String = row.get("doc_id");
        let raw_tokens: String = row.get("tokens");
        let tokens = parse_tokens(&raw_tokens)
            .with_context(|| format!("malformed tokens for document {:?}", doc_id))?;
        docs.push(PreprocessedDocument { doc_id, tokens });
    }

    Ok(docs)
}

/// Read the query metadata row for the explanation stage.
pub async fn read_query_info(pool: &SqlitePool, table: &str) -> Result<QueryInfo> {
    let row = sqlx::query(&format!(
        "SELECT query, source, created_at FROM {} LIMIT 1",
        table
    ))
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to read query information from table {:?}", table))?;

    let row = match row {
        Some(row) => row,
        None => bail!("query information table {:?} is empty", table),
    };

    Ok(QueryInfo {
        query: row.get("query"),
        source: row.get("source"),
        created_at: row.get("created_at"),
    })
}

/// Read the topic-term table, ordered by topic id then weight.
pub async fn read_topic_terms(pool: &SqlitePool, table: &str) -> Result<Vec<TopicTermRow>> {
    let rows = sqlx::query(&format!(
        "SELECT topic_id, term, weight FROM {} ORDER BY topic_id ASC, weight DESC",
        table
    ))
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to read topic terms from table {:?}", table))?;

    Ok(rows
        .iter()
        .map(|row| TopicTermRow {
            topic_id: row.get("topic_id"),
            term: row.get("term"),
            weight: row.get("weight"),
        })
        .collect())
}

/// Write the doc-topic and topic-term tables atomically.
///
/// Both tables are replaced inside a single transaction: either both
/// outputs land, or neither does.
pub async fn write_model_tables(
    pool: &SqlitePool,
    tables: &TablesConfig,
    doc_topics: &[DocTopicRow],
    topic_terms: &[TopicTermRow],
    n_topics: usize,
) -> Result<()> {
    for row in doc_topics {
        if row.weights.len() != n_topics {
            bail!(
                "document {:?} has {} topic weights, expected {}",
                row.doc_id,
                row.weights.len(),
                n_topics
            );
        }
    }

    let mut tx = pool.begin().await?;

    // doc_topic: doc_id plus one REAL column per topic
    let topic_columns: Vec<String> = (0..n_topics)
        .map(|i| format!("topic_{} REAL NOT NULL", i))
        .collect();
    let placeholders: Vec<&str> = std::iter::repeat("?").take(n_topics + 1).collect();

    sqlx::query(&format!("DROP TABLE IF EXISTS {}", tables.doc_topic))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!(
        "CREATE TABLE {} (doc_id TEXT NOT NULL, {})",
        tables.doc_topic,
        topic_columns.join(", ")
    ))
    .execute(&mut *tx)
    .await?;

    let insert_doc_topic = format!(
        "INSERT INTO {} VALUES ({})",
        tables.doc_topic,
        placeholders.join(", ")
    );
    for row in doc_topics {
        let mut query = sqlx::query(&insert_doc_topic).bind(&row.doc_id);
        for &weight in &row.weights {
            query = query.bind(weight);
        }
        query.execute(&mut *tx).await?;
    }

    // topic_term
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", tables.topic_term))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!(
        "CREATE TABLE {} (topic_id INTEGER NOT NULL, term TEXT NOT NULL, weight REAL NOT NULL)",
        tables.topic_term
    ))
    .execute(&mut *tx)
    .await?;

    let insert_topic_term = format!("INSERT INTO {} VALUES (?, ?, ?)", tables.topic_term);
    for row in topic_terms {
        sqlx::query(&insert_topic_term)
            .bind(row.topic_id)
            .bind(&row.term)
            .bind(row.weight)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Replace the explanations table with the given rows.
pub async fn write_explanations(
    pool: &SqlitePool,
    table: &str,
    explanations: &[TopicExplanation],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!(
        "CREATE TABLE {} (topic_id INTEGER NOT NULL, description TEXT NOT NULL)",
        table
    ))
    .execute(&mut *tx)
    .await?;

    let insert = format!("INSERT INTO {} VALUES (?, ?)", table);
    for explanation in explanations {
        sqlx::query(&insert)
            .bind(explanation.topic_id)
            .bind(&explanation.description)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}
