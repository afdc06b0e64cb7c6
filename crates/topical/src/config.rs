use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use topical_core::lda::FitParams;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub explain: ExplainConfig,
    #[serde(default)]
    pub tables: TablesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_n_topics")]
    pub n_topics: usize,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    #[serde(default = "default_learning_method")]
    pub learning_method: String,
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
    #[serde(default = "default_n_top_words")]
    pub n_top_words: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_topics: default_n_topics(),
            max_iter: default_max_iter(),
            learning_method: default_learning_method(),
            random_seed: default_random_seed(),
            n_top_words: default_n_top_words(),
        }
    }
}

fn default_n_topics() -> usize {
    5
}
fn default_max_iter() -> usize {
    10
}
fn default_learning_method() -> String {
    "batch".to_string()
}
fn default_random_seed() -> u64 {
    42
}
fn default_n_top_words() -> usize {
    10
}

impl ModelConfig {
    /// Translate the config into fit parameters, rejecting an unknown
    /// learning method up front rather than at fit time.
    pub fn fit_params(&self) -> Result<FitParams> {
        Ok(FitParams {
            n_topics: self.n_topics,
            max_iter: self.max_iter,
            learning_method: self.learning_method.parse()?,
            random_seed: self.random_seed,
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExplainConfig {
    #[serde(default = "default_explain_model")]
    pub model: String,
    #[serde(default = "default_explain_url")]
    pub url: String,
    /// Name of the environment variable holding the API key. The key
    /// itself never lives in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            model: default_explain_model(),
            url: default_explain_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_explain_model() -> String {
    "gpt-oss:120b".to_string()
}
fn default_explain_url() -> String {
    "https://ollama.com".to_string()
}
fn default_api_key_env() -> String {
    "OLLAMA_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct TablesConfig {
    #[serde(default = "default_documents_table")]
    pub documents: String,
    #[serde(default = "default_query_information_table")]
    pub query_information: String,
    #[serde(default = "default_doc_topic_table")]
    pub doc_topic: String,
    #[serde(default = "default_topic_term_table")]
    pub topic_term: String,
    #[serde(default = "default_explanations_table")]
    pub explanations: String,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            documents: default_documents_table(),
            query_information: default_query_information_table(),
            doc_topic: default_doc_topic_table(),
            topic_term: default_topic_term_table(),
            explanations: default_explanations_table(),
        }
    }
}

fn default_documents_table() -> String {
    "norm_docs".to_string()
}
fn default_query_information_table() -> String {
    "query_information".to_string()
}
fn default_doc_topic_table() -> String {
    "doc_topic".to_string()
}
fn default_topic_term_table() -> String {
    "topic_terms".to_string()
}
fn default_explanations_table() -> String {
    "topic_explanations".to_string()
}

impl TablesConfig {
    /// Table names are interpolated into SQL statements, so only plain
    /// identifiers are accepted.
    pub fn validate(&self) -> Result<()> {
        for name in [
            &self.documents,
            &self.query_information,
            &self.doc_topic,
            &self.topic_term,
            &self.explanations,
        ] {
            validate_table_name(name)?;
        }
        Ok(())
    }
}

fn validate_table_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.chars().next().unwrap().is_ascii_digit();
    if !valid {
        bail!("invalid table name: {:?}", name);
    }
    Ok(())
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    config.tables.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use topical_core::lda::LearningMethod;

    #[test]
    fn test_minimal_config_defaults() {
        let config: Config = toml::from_str(
            r#"
            [db]
            path = "./data/topical.sqlite"
            "#,
        )
        .unwrap();

        assert_eq!(config.model.n_topics, 5);
        assert_eq!(config.model.max_iter, 10);
        assert_eq!(config.model.n_top_words, 10);
        assert_eq!(config.model.random_seed, 42);
        assert_eq!(config.explain.model, "gpt-oss:120b");
        assert_eq!(config.explain.timeout_secs, 60);
        assert_eq!(config.tables.documents, "norm_docs");
        assert_eq!(config.tables.topic_term, "topic_terms");
    }

    #[test]
    fn test_fit_params_parsing() {
        let model = ModelConfig {
            learning_method: "online".to_string(),
            ..ModelConfig::default()
        };
        let params = model.fit_params().unwrap();
        assert_eq!(params.learning_method, LearningMethod::Online);

        let bad = ModelConfig {
            learning_method: "stochastic".to_string(),
            ..ModelConfig::default()
        };
        assert!(bad.fit_params().is_err());
    }

    #[test]
    fn test_table_name_validation() {
        assert!(validate_table_name("topic_terms").is_ok());
        assert!(validate_table_name("t2").is_ok());
        assert!(validate_table_name("2fast").is_err());
        assert!(validate_table_name("drop table;--").is_err());
        assert!(validate_table_name("").is_err());
    }

    #[test]
    fn test_overrides() {
        let config: Config = toml::from_str(
            r#"
            [db]
            path = "./x.sqlite"

            [model]
            n_topics = 8
            learning_method = "online"

            [tables]
            documents = "my_docs"
            "#,
        )
        .unwrap();

        assert_eq!(config.model.n_topics, 8);
        assert_eq!(config.model.learning_method, "online");
        assert_eq!(config.tables.documents, "my_docs");
        // untouched sections keep their defaults
        assert_eq!(config.tables.doc_topic, "doc_topic");
        assert_eq!(config.explain.max_retries, 5);
    }
}
