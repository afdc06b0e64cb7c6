//! Topic explanation stage: Ollama-backed text generation and
//! per-topic dispatch.
//!
//! Reads the topic-term table and query metadata, builds one prompt per
//! topic, and asks the generator for a short description of each. The
//! per-topic requests are independent, so they are dispatched
//! concurrently on a [`JoinSet`]; output order is restored by sorting
//! on topic id. Any single failure aborts the whole run — partial
//! explanation tables are never persisted.
//!
//! # Retry Strategy
//!
//! The Ollama generator uses exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::task::JoinSet;

use topical_core::explain::{build_topic_prompt, group_topic_terms, TextGenerator};
use topical_core::models::TopicExplanation;

use crate::config::{Config, ExplainConfig};
use crate::db;
use crate::tables;

/// Text generator backed by an Ollama-compatible `/api/chat` endpoint.
pub struct OllamaGenerator {
    model: String,
    url: String,
    api_key: Option<String>,
    timeout_secs: u64,
    max_retries: u32,
}

impl OllamaGenerator {
    /// Create a generator from configuration. The API key is read from
    /// the environment variable named by `api_key_env`; when unset the
    /// requests go out unauthenticated (local Ollama instances).
    pub fn new(config: &ExplainConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.is_empty());

        Self {
            model: config.model.clone(),
            url: config.url.trim_end_matches('/').to_string(),
            api_key,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let mut request = client
                .post(format!("{}/api/chat", self.url))
                .header("Content-Type", "application/json")
                .json(&body);
            if let Some(key) = &self.api_key {
                request = request.header("Authorization", format!("Bearer {}", key));
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_chat_response(&json);
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("Ollama API error {}: {}", status, body_text));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Ollama API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Text generation failed after retries")))
    }
}

/// Pull the assistant message text out of an `/api/chat` response.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str());

    match content {
        Some(text) => Ok(text.trim().to_string()),
        None => bail!("malformed chat response: missing message.content"),
    }
}

/// Run the explanation stage with the given text-generation capability.
pub async fn run_explain(config: &Config, generator: Arc<dyn TextGenerator>) -> Result<()> {
    let pool = db::connect(&config.db.path).await?;

    let topic_terms = tables::read_topic_terms(&pool, &config.tables.topic_term).await?;
    if topic_terms.is_empty() {
        bail!(
            "topic-term table '{}' is empty — run `topical model` first",
            config.tables.topic_term
        );
    }

    let info = tables::read_query_info(&pool, &config.tables.query_information).await?;
    let grouped = group_topic_terms(&topic_terms);
    println!(
        "generating explanations for {} topics with model '{}'",
        grouped.len(),
        generator.model_name()
    );

    let mut requests: JoinSet<Result<TopicExplanation>> = JoinSet::new();
    for (topic_id, terms) in grouped {
        let prompt = build_topic_prompt(topic_id, &terms, &info);
        let generator = Arc::clone(&generator);
        requests.spawn(async move {
            let description = generator.generate(&prompt).await?.trim().to_string();
            Ok(TopicExplanation {
                topic_id,
                description,
            })
        });
    }

    let mut explanations = Vec::new();
    while let Some(joined) = requests.join_next().await {
        explanations.push(joined??);
    }
    explanations.sort_by_key(|explanation| explanation.topic_id);

    tables::write_explanations(&pool, &config.tables.explanations, &explanations).await?;
    println!(
        "wrote {} explanations to '{}'",
        explanations.len(),
        config.tables.explanations
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_response() {
        let json = serde_json::json!({
            "message": { "role": "assistant", "content": "  Urban cycling safety.  " }
        });
        assert_eq!(parse_chat_response(&json).unwrap(), "Urban cycling safety.");
    }

    #[test]
    fn test_parse_chat_response_malformed() {
        let json = serde_json::json!({ "choices": [] });
        assert!(parse_chat_response(&json).is_err());
    }
}
