//! Topic model adapter: fit parameters, the decomposition capability
//! trait, the collapsed-Gibbs default implementation, and extraction of
//! the two output tables.
//!
//! The adapter owns the translation between the matrix/vocabulary index
//! space and human-readable output. [`extract_topic_terms`] decodes
//! term indices through the same [`Vocabulary`] that encoded the
//! matrix; if those two mappings ever diverged, every topic's term list
//! would be silently wrong while still looking plausible, so the
//! function cross-checks the weight-matrix width against the vocabulary
//! size before decoding anything.

use anyhow::{bail, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{DocTopicRow, TopicTermRow};
use crate::vectorizer::{Dtm, Vocabulary};

/// Document sweep scheduling for the fitting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LearningMethod {
    /// Sweep documents in input order every iteration.
    #[default]
    Batch,
    /// Visit documents in a (seeded) random order per iteration.
    Online,
}

impl std::str::FromStr for LearningMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "batch" => Ok(Self::Batch),
            "online" => Ok(Self::Online),
            other => bail!("unknown learning method: {:?} (expected \"batch\" or \"online\")", other),
        }
    }
}

/// Parameters for one fitting run. With a fixed `random_seed` the fit
/// is fully deterministic.
#[derive(Debug, Clone)]
pub struct FitParams {
    pub n_topics: usize,
    pub max_iter: usize,
    pub learning_method: LearningMethod,
    pub random_seed: u64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            n_topics: 5,
            max_iter: 10,
            learning_method: LearningMethod::Batch,
            random_seed: 42,
        }
    }
}

/// The two artifacts of a fitted topic model.
#[derive(Debug, Clone)]
pub struct FittedTopics {
    /// `(docs × topics)` membership weights, rows in input order.
    pub doc_topic: Vec<Vec<f64>>,
    /// `(topics × terms)` affinity weights, columns in vocabulary order.
    pub topic_term: Vec<Vec<f64>>,
}

impl FittedTopics {
    pub fn n_docs(&self) -> usize {
        self.doc_topic.len()
    }

    pub fn n_topics(&self) -> usize {
        self.topic_term.len()
    }
}

/// The topic-decomposition capability.
///
/// Implementations are injected into the pipeline so the orchestration
/// code never depends on a concrete algorithm; [`GibbsLda`] is the
/// in-tree default, and tests can substitute a canned implementation.
pub trait TopicModel: Send + Sync {
    /// Fit the model and return both weight matrices.
    ///
    /// Must be deterministic for a fixed `params.random_seed`. Fails on
    /// an empty matrix, `n_topics == 0`, or `n_topics` exceeding the
    /// document or term count — never clamps silently.
    fn fit(&self, dtm: &Dtm, params: &FitParams) -> Result<FittedTopics>;
}

/// Latent Dirichlet Allocation via collapsed Gibbs sampling with
/// symmetric Dirichlet priors.
///
/// `alpha` is the document-topic prior, `beta` the topic-term prior.
/// Document-topic weights are the smoothed distribution
/// `θ[d][t] = (n_dt + α) / (N_d + K·α)`; topic-term weights are
/// `φ[t][w] = (n_tw + β) / (N_t + V·β)`, so each row of both outputs
/// sums to 1.
#[derive(Debug, Clone)]
pub struct GibbsLda {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for GibbsLda {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            beta: 0.01,
        }
    }
}

impl TopicModel for GibbsLda {
    fn fit(&self, dtm: &Dtm, params: &FitParams) -> Result<FittedTopics> {
        let n_docs = dtm.n_docs();
        let n_terms = dtm.n_terms();
        let k = params.n_topics;

        if n_docs == 0 || n_terms == 0 {
            bail!("cannot fit a topic model on an empty document-term matrix");
        }
        if k == 0 {
            bail!("n_topics must be positive");
        }
        if k > n_docs {
            bail!("n_topics ({}) exceeds the number of documents ({})", k, n_docs);
        }
        if k > n_terms {
            bail!("n_topics ({}) exceeds the vocabulary size ({})", k, n_terms);
        }

        // Expand each matrix row into a flat term-id sequence; counts
        // carry per-document frequency.
        let docs: Vec<Vec<usize>> = (0..n_docs)
            .map(|i| {
                let mut ids = Vec::new();
                for (j, &count) in dtm.row(i).iter().enumerate() {
                    for _ in 0..count {
                        ids.push(j);
                    }
                }
                ids
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(params.random_seed);

        // Count tables: [doc][topic], [topic][term], [topic].
        let mut ndk = vec![vec![0usize; k]; n_docs];
        let mut nkw = vec![vec![0usize; n_terms]; k];
        let mut nk = vec![0usize; k];
        let mut z: Vec<Vec<usize>> = docs.iter().map(|d| vec![0usize; d.len()]).collect();

        for (di, doc) in docs.iter().enumerate() {
            for (pi, &w) in doc.iter().enumerate() {
                let topic = rng.gen_range(0..k);
                z[di][pi] = topic;
                ndk[di][topic] += 1;
                nkw[topic][w] += 1;
                nk[topic] += 1;
            }
        }

        let vb = n_terms as f64 * self.beta;
        let mut order: Vec<usize> = (0..n_docs).collect();
        let mut weights = vec![0.0f64; k];

        for _ in 0..params.max_iter {
            if params.learning_method == LearningMethod::Online {
                order.shuffle(&mut rng);
            }
            for &di in &order {
                for pi in 0..docs[di].len() {
                    let w = docs[di][pi];
                    let old = z[di][pi];

                    ndk[di][old] -= 1;
                    nkw[old][w] -= 1;
                    nk[old] -= 1;

                    // p(t) ∝ (n_dt + α) · (n_tw + β) / (N_t + V·β)
                    for (t, weight) in weights.iter_mut().enumerate() {
                        *weight = (ndk[di][t] as f64 + self.alpha)
                            * ((nkw[t][w] as f64 + self.beta) / (nk[t] as f64 + vb));
                    }

                    let sum: f64 = weights.iter().sum();
                    let new = if sum <= f64::EPSILON {
                        rng.gen_range(0..k)
                    } else {
                        WeightedIndex::new(&weights)?.sample(&mut rng)
                    };

                    z[di][pi] = new;
                    ndk[di][new] += 1;
                    nkw[new][w] += 1;
                    nk[new] += 1;
                }
            }
        }

        let doc_topic = (0..n_docs)
            .map(|d| {
                let denom = docs[d].len() as f64 + k as f64 * self.alpha;
                (0..k)
                    .map(|t| (ndk[d][t] as f64 + self.alpha) / denom)
                    .collect()
            })
            .collect();

        let topic_term = (0..k)
            .map(|t| {
                let denom = nk[t] as f64 + vb;
                (0..n_terms)
                    .map(|w| (nkw[t][w] as f64 + self.beta) / denom)
                    .collect()
            })
            .collect();

        Ok(FittedTopics {
            doc_topic,
            topic_term,
        })
    }
}

/// Build the document-topic table rows, one per input document.
///
/// `doc_ids` must have exactly one entry per matrix row — a length
/// mismatch means identity and weights would be silently mis-paired,
/// so it fails fast instead. Weights are passed through as produced by
/// the fitting capability, with no renormalization.
pub fn extract_doc_topics(fitted: &FittedTopics, doc_ids: &[String]) -> Result<Vec<DocTopicRow>> {
    if doc_ids.len() != fitted.doc_topic.len() {
        bail!(
            "document id count ({}) does not match document-topic row count ({})",
            doc_ids.len(),
            fitted.doc_topic.len()
        );
    }

    Ok(doc_ids
        .iter()
        .zip(fitted.doc_topic.iter())
        .map(|(doc_id, weights)| DocTopicRow {
            doc_id: doc_id.clone(),
            weights: weights.clone(),
        })
        .collect())
}

/// Build the topic-term table: the `n_top_words` highest-weight terms
/// per topic, ordered by topic id ascending then weight descending.
///
/// Term indices are decoded through `vocab`, which must be the exact
/// vocabulary that encoded the matrix the model was fitted on; the
/// weight-matrix width is checked against the vocabulary size to catch
/// a mismatched pairing. Equal weights are broken lexicographically by
/// term, so the selection is deterministic regardless of sort
/// internals.
pub fn extract_topic_terms(
    fitted: &FittedTopics,
    vocab: &Vocabulary,
    n_top_words: usize,
) -> Result<Vec<TopicTermRow>> {
    let mut rows = Vec::new();

    for (topic_id, topic) in fitted.topic_term.iter().enumerate() {
        if topic.len() != vocab.len() {
            bail!(
                "topic {} has {} term weights but the vocabulary has {} terms",
                topic_id,
                topic.len(),
                vocab.len()
            );
        }

        let mut ranked: Vec<(usize, f64)> = topic.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| vocab.term_at(a.0).cmp(vocab.term_at(b.0)))
        });

        for (index, weight) in ranked.into_iter().take(n_top_words) {
            rows.push(TopicTermRow {
                topic_id: topic_id as i64,
                term: vocab.term_at(index).to_string(),
                weight,
            });
        }
    }

    Ok(rows)
}
