//! Topic explanation: the text-generation trait, topic grouping, and
//! prompt construction.
//!
//! Concrete generator implementations (Ollama-compatible chat APIs)
//! live in the `topical` app crate; this module only defines the
//! capability boundary and the pure prompt-building logic, so both can
//! be tested without any network access.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{QueryInfo, TopicTermRow};

/// The text-generation capability.
///
/// One prompt in, one trimmed completion out. Implementations are
/// created by the application and injected into the explanation stage.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-oss:120b"`).
    fn model_name(&self) -> &str;

    /// Generate a completion for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Group topic-term rows by topic id, terms ordered by descending
/// weight within each topic (ties broken by term).
///
/// The `BTreeMap` key order gives ascending topic ids for free, which
/// is the iteration order the explanation stage must preserve.
pub fn group_topic_terms(rows: &[TopicTermRow]) -> BTreeMap<i64, Vec<String>> {
    let mut weighted: BTreeMap<i64, Vec<(String, f64)>> = BTreeMap::new();
    for row in rows {
        weighted
            .entry(row.topic_id)
            .or_default()
            .push((row.term.clone(), row.weight));
    }

    weighted
        .into_iter()
        .map(|(topic_id, mut terms)| {
            terms.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            (topic_id, terms.into_iter().map(|(term, _)| term).collect())
        })
        .collect()
}

/// Build the natural-language prompt for one topic.
///
/// Embeds the corpus source label, the originating search query, the
/// creation date, the topic id, and the comma-joined top terms
/// (highest weight first), and asks for a 1–2 sentence description.
pub fn build_topic_prompt(topic_id: i64, terms: &[String], info: &QueryInfo) -> String {
    let terms_joined = terms.join(", ");

    format!(
        "Context:\n\
         The documents come from {source}\n\
         \n\
         Search Query:\n\
         \"{query}\"\n\
         Creation date: {created_at}\n\
         \n\
         Topic ID: {topic_id}\n\
         \n\
         Top keywords for this topic:\n\
         {terms}\n\
         \n\
         Task:\n\
         Describe in 1-2 concise sentences what this topic represents.\n\
         Focus on the research subfield or thematic area.\n\
         Do not list the keywords explicitly.",
        source = info.source,
        query = info.query,
        created_at = info.created_at,
        topic_id = topic_id,
        terms = terms_joined,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(topic_id: i64, term: &str, weight: f64) -> TopicTermRow {
        TopicTermRow {
            topic_id,
            term: term.to_string(),
            weight,
        }
    }

    fn info() -> QueryInfo {
        QueryInfo {
            query: "ALL=(bike accident)".to_string(),
            source: "Web Of Science".to_string(),
            created_at: "2024-01-01".to_string(),
        }
    }

    #[test]
    fn test_group_topic_terms_orders_topics_and_weights() {
        let rows = vec![
            row(1, "weather", 0.2),
            row(0, "bike", 0.6),
            row(1, "storm", 0.5),
            row(0, "accident", 0.3),
        ];

        let grouped = group_topic_terms(&rows);

        let topic_ids: Vec<i64> = grouped.keys().copied().collect();
        assert_eq!(topic_ids, vec![0, 1]);
        assert_eq!(grouped[&0], vec!["bike", "accident"]);
        assert_eq!(grouped[&1], vec!["storm", "weather"]);
    }

    #[test]
    fn test_group_topic_terms_tie_breaks_by_term() {
        let rows = vec![row(0, "zebra", 0.5), row(0, "apple", 0.5)];
        let grouped = group_topic_terms(&rows);
        assert_eq!(grouped[&0], vec!["apple", "zebra"]);
    }

    #[test]
    fn test_build_topic_prompt_contents() {
        let terms = vec!["bike".to_string(), "accident".to_string()];
        let prompt = build_topic_prompt(3, &terms, &info());

        assert!(prompt.contains("The documents come from Web Of Science"));
        assert!(prompt.contains("\"ALL=(bike accident)\""));
        assert!(prompt.contains("Creation date: 2024-01-01"));
        assert!(prompt.contains("Topic ID: 3"));
        assert!(prompt.contains("bike, accident"));
        assert!(prompt.contains("1-2 concise sentences"));
    }

    #[test]
    fn test_build_topic_prompt_preserves_term_order() {
        let terms = vec!["first".to_string(), "second".to_string(), "third".to_string()];
        let prompt = build_topic_prompt(0, &terms, &info());
        assert!(prompt.contains("first, second, third"));
    }
}
