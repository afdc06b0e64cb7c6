//! Vocabulary, frequency statistics, and document-term matrix
//! construction.
//!
//! The vocabulary assigns column indices to the **sorted** set of all
//! distinct terms across the corpus, so the term→index mapping is
//! identical for any permutation of the input documents. The matrix
//! builder and the topic-term extraction in [`crate::lda`] both decode
//! through this one mapping; they must never disagree.

use std::collections::{BTreeSet, HashMap, HashSet};

use anyhow::{bail, Result};
use serde::Serialize;

use crate::models::PreprocessedDocument;

/// Returns true when a token is a multi-word phrase.
pub fn is_ngram(term: &str) -> bool {
    term.contains(' ')
}

/// Corpus-wide frequency statistics, split by term kind.
///
/// `*_freq` counts total occurrences across all documents; `*_doc_freq`
/// counts how many documents contain the term at least once. Built by
/// [`analyze_frequencies`] as plain local aggregation — there is no
/// shared mutable counter state anywhere.
#[derive(Debug, Default)]
pub struct CorpusFrequencies {
    pub word_freq: HashMap<String, u64>,
    pub word_doc_freq: HashMap<String, u64>,
    pub ngram_freq: HashMap<String, u64>,
    pub ngram_doc_freq: HashMap<String, u64>,
}

impl CorpusFrequencies {
    /// Total corpus occurrences of `term`, whichever kind it is.
    pub fn freq_of(&self, term: &str) -> u64 {
        if is_ngram(term) {
            self.ngram_freq.get(term).copied().unwrap_or(0)
        } else {
            self.word_freq.get(term).copied().unwrap_or(0)
        }
    }

    /// Number of documents containing `term` at least once.
    pub fn doc_count_of(&self, term: &str) -> u64 {
        if is_ngram(term) {
            self.ngram_doc_freq.get(term).copied().unwrap_or(0)
        } else {
            self.word_doc_freq.get(term).copied().unwrap_or(0)
        }
    }
}

/// Compute corpus frequency statistics for a document collection.
pub fn analyze_frequencies(docs: &[PreprocessedDocument]) -> CorpusFrequencies {
    let mut freqs = CorpusFrequencies::default();

    for doc in docs {
        let mut seen: HashSet<&str> = HashSet::new();
        for token in &doc.tokens {
            if is_ngram(token) {
                *freqs.ngram_freq.entry(token.clone()).or_insert(0) += 1;
            } else {
                *freqs.word_freq.entry(token.clone()).or_insert(0) += 1;
            }
            if seen.insert(token) {
                if is_ngram(token) {
                    *freqs.ngram_doc_freq.entry(token.clone()).or_insert(0) += 1;
                } else {
                    *freqs.word_doc_freq.entry(token.clone()).or_insert(0) += 1;
                }
            }
        }
    }

    freqs
}

/// Whether a bag-of-words entry is a single word or an n-gram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    Word,
    Ngram,
}

/// One enriched bag-of-words entry for a term within a document.
#[derive(Debug, Clone, Serialize)]
pub struct BowEntry {
    pub term: String,
    pub kind: TermKind,
    /// Number of words the term spans (1 for a plain word).
    pub span: usize,
    /// Total corpus occurrences.
    pub freq: u64,
    /// Number of documents containing the term.
    pub doc_count: u64,
}

/// Build the enriched bag-of-words view of the corpus.
///
/// One entry per distinct term per document, in first-occurrence order.
/// This is an auxiliary view — the topic-modeling path does not depend
/// on it — but its output must be reproducible for a given corpus.
pub fn bag_of_words(
    docs: &[PreprocessedDocument],
    freqs: &CorpusFrequencies,
) -> Vec<Vec<BowEntry>> {
    docs.iter()
        .map(|doc| {
            let mut seen: HashSet<&str> = HashSet::new();
            let mut entries = Vec::new();
            for token in &doc.tokens {
                if !seen.insert(token) {
                    continue;
                }
                let kind = if is_ngram(token) {
                    TermKind::Ngram
                } else {
                    TermKind::Word
                };
                entries.push(BowEntry {
                    term: token.clone(),
                    kind,
                    span: token.split(' ').count(),
                    freq: freqs.freq_of(token),
                    doc_count: freqs.doc_count_of(token),
                });
            }
            entries
        })
        .collect()
}

/// Deterministic term→index mapping over the corpus vocabulary.
///
/// Indices `0..V-1` are assigned to the distinct terms in lexicographic
/// order, so the mapping depends only on the term *set*, never on
/// document traversal order. Immutable once built.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build the vocabulary from the sorted distinct terms of `docs`.
    pub fn build(docs: &[PreprocessedDocument]) -> Self {
        let distinct: BTreeSet<&str> = docs
            .iter()
            .flat_map(|doc| doc.tokens.iter().map(|t| t.as_str()))
            .collect();

        let terms: Vec<String> = distinct.into_iter().map(|t| t.to_string()).collect();
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        Self { terms, index }
    }

    /// Column index for `term`, if the term is in the vocabulary.
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    /// Term string for a column index. Panics on an out-of-range index,
    /// which can only arise from a vocabulary/matrix mismatch that the
    /// callers guard against.
    pub fn term_at(&self, index: usize) -> &str {
        &self.terms[index]
    }

    /// All terms in index order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Dense document-term matrix: `get(i, j)` is the occurrence count of
/// vocabulary term `j` in document `i`. Row order matches the input
/// document order; column order matches the vocabulary.
#[derive(Debug, Clone)]
pub struct Dtm {
    counts: Vec<u64>,
    n_docs: usize,
    n_terms: usize,
}

impl Dtm {
    /// Count token occurrences into a `(docs × terms)` matrix.
    ///
    /// Fails on an empty document collection or an empty vocabulary —
    /// fitting a model on a degenerate matrix must be rejected up
    /// front, not discovered as a garbage result later. A token absent
    /// from the vocabulary is a programming error (the vocabulary was
    /// built from a different document set) and fails loudly.
    pub fn build(docs: &[PreprocessedDocument], vocab: &Vocabulary) -> Result<Self> {
        if docs.is_empty() {
            bail!("cannot build a document-term matrix from zero documents");
        }
        if vocab.is_empty() {
            bail!("cannot build a document-term matrix over an empty vocabulary");
        }

        let n_docs = docs.len();
        let n_terms = vocab.len();
        let mut counts = vec![0u64; n_docs * n_terms];

        for (i, doc) in docs.iter().enumerate() {
            for token in &doc.tokens {
                let j = match vocab.index_of(token) {
                    Some(j) => j,
                    None => bail!(
                        "token {:?} in document {:?} is not in the vocabulary",
                        token,
                        doc.doc_id
                    ),
                };
                counts[i * n_terms + j] += 1;
            }
        }

        Ok(Self {
            counts,
            n_docs,
            n_terms,
        })
    }

    pub fn n_docs(&self) -> usize {
        self.n_docs
    }

    pub fn n_terms(&self) -> usize {
        self.n_terms
    }

    pub fn get(&self, doc: usize, term: usize) -> u64 {
        self.counts[doc * self.n_terms + term]
    }

    /// Full count row for one document.
    pub fn row(&self, doc: usize) -> &[u64] {
        &self.counts[doc * self.n_terms..(doc + 1) * self.n_terms]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, tokens: &[&str]) -> PreprocessedDocument {
        PreprocessedDocument {
            doc_id: id.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn bike_corpus() -> Vec<PreprocessedDocument> {
        vec![
            doc("d1", &["bike", "bike", "accident"]),
            doc("d2", &["bike", "weather"]),
        ]
    }

    #[test]
    fn test_vocabulary_sorted_indices() {
        let vocab = Vocabulary::build(&bike_corpus());
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.index_of("accident"), Some(0));
        assert_eq!(vocab.index_of("bike"), Some(1));
        assert_eq!(vocab.index_of("weather"), Some(2));
        assert_eq!(vocab.term_at(0), "accident");
        assert_eq!(vocab.term_at(2), "weather");
    }

    #[test]
    fn test_vocabulary_permutation_invariant() {
        let docs = bike_corpus();
        let reversed: Vec<_> = docs.iter().rev().cloned().collect();

        let a = Vocabulary::build(&docs);
        let b = Vocabulary::build(&reversed);

        assert_eq!(a.terms(), b.terms());
        for term in a.terms() {
            assert_eq!(a.index_of(term), b.index_of(term));
        }
    }

    #[test]
    fn test_vocabulary_empty_corpus() {
        let vocab = Vocabulary::build(&[]);
        assert!(vocab.is_empty());
        assert_eq!(vocab.len(), 0);
    }

    #[test]
    fn test_dtm_counts() {
        let docs = bike_corpus();
        let vocab = Vocabulary::build(&docs);
        let dtm = Dtm::build(&docs, &vocab).unwrap();

        assert_eq!(dtm.n_docs(), 2);
        assert_eq!(dtm.n_terms(), 3);
        // accident, bike, weather
        assert_eq!(dtm.row(0), &[1, 2, 0]);
        assert_eq!(dtm.row(1), &[0, 1, 1]);
    }

    #[test]
    fn test_dtm_counts_ngrams_as_units() {
        let docs = vec![doc("d1", &["bike accident", "bike accident", "bike"])];
        let vocab = Vocabulary::build(&docs);
        let dtm = Dtm::build(&docs, &vocab).unwrap();

        // "bike" sorts before "bike accident"
        assert_eq!(dtm.get(0, vocab.index_of("bike").unwrap()), 1);
        assert_eq!(dtm.get(0, vocab.index_of("bike accident").unwrap()), 2);
    }

    #[test]
    fn test_dtm_rejects_empty_inputs() {
        let docs = bike_corpus();
        let vocab = Vocabulary::build(&docs);

        assert!(Dtm::build(&[], &vocab).is_err());

        let empty_vocab = Vocabulary::build(&[]);
        assert!(Dtm::build(&docs, &empty_vocab).is_err());
    }

    #[test]
    fn test_dtm_rejects_out_of_vocabulary_token() {
        let docs = bike_corpus();
        let vocab = Vocabulary::build(&docs[..1]);

        let err = Dtm::build(&docs, &vocab).unwrap_err();
        assert!(err.to_string().contains("not in the vocabulary"));
    }

    #[test]
    fn test_analyze_frequencies() {
        let docs = vec![
            doc("d1", &["bike", "bike", "bike accident"]),
            doc("d2", &["bike", "bike accident", "bike accident"]),
            doc("d3", &["weather"]),
        ];
        let freqs = analyze_frequencies(&docs);

        assert_eq!(freqs.word_freq["bike"], 3);
        assert_eq!(freqs.word_doc_freq["bike"], 2);
        assert_eq!(freqs.ngram_freq["bike accident"], 3);
        assert_eq!(freqs.ngram_doc_freq["bike accident"], 2);
        assert_eq!(freqs.word_freq["weather"], 1);
        assert_eq!(freqs.word_doc_freq["weather"], 1);
        assert!(!freqs.word_freq.contains_key("bike accident"));
    }

    #[test]
    fn test_bag_of_words_dedup_and_order() {
        let docs = vec![doc("d1", &["bike", "bike accident", "bike", "accident"])];
        let freqs = analyze_frequencies(&docs);
        let bow = bag_of_words(&docs, &freqs);

        assert_eq!(bow.len(), 1);
        let entries = &bow[0];
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].term, "bike");
        assert_eq!(entries[0].kind, TermKind::Word);
        assert_eq!(entries[0].span, 1);
        assert_eq!(entries[0].freq, 2);
        assert_eq!(entries[1].term, "bike accident");
        assert_eq!(entries[1].kind, TermKind::Ngram);
        assert_eq!(entries[1].span, 2);
        assert_eq!(entries[2].term, "accident");
    }
}
