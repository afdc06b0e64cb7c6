//! Corpus statistics overview.
//!
//! Gives a quick summary of the loaded document collection: document
//! and vocabulary counts, word/n-gram split, and the highest-frequency
//! terms. Used by `topical stats` to sanity-check a corpus before
//! fitting.

use anyhow::Result;

use topical_core::vectorizer::{analyze_frequencies, Vocabulary};

use crate::config::Config;
use crate::db;
use crate::tables;

pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(&config.db.path).await?;
    let docs = tables::read_documents(&pool, &config.tables.documents).await?;

    let freqs = analyze_frequencies(&docs);
    let vocab = Vocabulary::build(&docs);
    let total_tokens: usize = docs.iter().map(|doc| doc.tokens.len()).sum();

    println!("Topical — Corpus Stats");
    println!("======================");
    println!();
    println!("  Database:       {}", config.db.path.display());
    println!("  Documents:      {}", docs.len());
    println!("  Total tokens:   {}", total_tokens);
    println!("  Vocabulary:     {}", vocab.len());
    println!("  Distinct words: {}", freqs.word_freq.len());
    println!("  Distinct ngrams:{}", freqs.ngram_freq.len());

    print_top("Top words", &freqs.word_freq);
    print_top("Top n-grams", &freqs.ngram_freq);

    Ok(())
}

fn print_top(label: &str, freq: &std::collections::HashMap<String, u64>) {
    if freq.is_empty() {
        return;
    }

    let mut entries: Vec<(&str, u64)> = freq.iter().map(|(t, &c)| (t.as_str(), c)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    println!();
    println!("  {}:", label);
    for (term, count) in entries.iter().take(10) {
        println!("    {:<32} {}", term, count);
    }
}
