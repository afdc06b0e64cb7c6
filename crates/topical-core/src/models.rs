//! Core data models used throughout Topical.
//!
//! These types represent the documents, output table rows, and query
//! metadata that flow through the modeling and explanation pipeline.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A tokenized document as produced by an upstream preprocessing step.
///
/// Tokens are either single words or n-grams; an n-gram is any token
/// containing an internal space (e.g. `"bike accident"`). Tokens may
/// repeat within a document — repetition carries frequency information.
/// Once constructed a document is never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessedDocument {
    /// Unique, stable document identifier.
    pub doc_id: String,
    /// Ordered token sequence.
    pub tokens: Vec<String>,
}

/// One row of the document-topic output table.
///
/// `weights` has exactly one entry per topic, in topic order. The
/// `doc_id` is mandatory: a positional-only table loses document
/// identity the moment a downstream consumer reorders rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DocTopicRow {
    pub doc_id: String,
    pub weights: Vec<f64>,
}

/// One row of the topic-term output table: a single top term for a
/// topic, with the topic's affinity weight for that term.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicTermRow {
    pub topic_id: i64,
    pub term: String,
    pub weight: f64,
}

/// A natural-language description of a single topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicExplanation {
    pub topic_id: i64,
    pub description: String,
}

/// Contextual metadata for the explanation stage: the search query that
/// produced the corpus, a human-readable source label, and the corpus
/// creation date.
#[derive(Debug, Clone)]
pub struct QueryInfo {
    pub query: String,
    pub source: String,
    pub created_at: String,
}

/// Parse a stored token encoding into a token list.
///
/// Two encodings are accepted:
/// - a JSON string array: `["bike", "bike accident", "weather"]`
/// - a legacy brace/bracket comma-delimited form as exported from a
///   Postgres text array: `{bike,"bike accident",weather}`
///
/// Anything else is malformed and fails the run — a document whose
/// tokens cannot be recovered must never be silently skipped.
pub fn parse_tokens(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("empty token encoding");
    }

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        if let Ok(tokens) = serde_json::from_str::<Vec<String>>(trimmed) {
            return Ok(tokens);
        }
        return parse_delimited(&trimmed[1..trimmed.len() - 1]);
    }

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return parse_delimited(&trimmed[1..trimmed.len() - 1]);
    }

    bail!("unparseable token encoding: {:?}", truncate(trimmed, 64));
}

fn parse_delimited(inner: &str) -> Result<Vec<String>> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut tokens = Vec::new();
    for part in inner.split(',') {
        let token = part.trim().trim_matches('"').trim_matches('\'');
        if token.is_empty() {
            bail!("empty token in delimited encoding: {:?}", truncate(inner, 64));
        }
        tokens.push(token.to_string());
    }
    Ok(tokens)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
