//! Negative-keyword extraction and improvement-area generation.
//!
//! Candidates are 1–3 word phrases drawn from the (already normalized) text
//! of low-rated reviews. A [`KeywordModel`] ranks them by relevance; a
//! similarity pass then suppresses near-duplicates ("crash" / "crashes" /
//! "app crash") before the list is truncated to the requested size.

use std::collections::HashMap;
use std::future::Future;

use serde::Serialize;
use strsim::normalized_levenshtein;

use crate::error::ModelError;

/// Two candidates closer than this (normalized Levenshtein) are considered
/// the same complaint.
const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Upper bound on candidates handed to the ranking model per batch.
const MAX_CANDIDATES: usize = 200;

/// Contract for the external keyword-relevance model: given the full document
/// and a candidate list, return one relevance score per candidate, same order.
///
/// Process-wide, read-only after construction, shared across tasks.
pub trait KeywordModel: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ModelError`] when ranking fails; the extractor falls back to
    /// frequency ranking rather than failing the batch.
    fn rank(
        &self,
        document: &str,
        candidates: &[String],
    ) -> impl Future<Output = Result<Vec<f64>, ModelError>> + Send;
}

/// Extract up to `top_n` salient keywords from `text`.
///
/// `text` is expected to be the concatenated normalized body of reviews rated
/// 2 stars or lower; empty input yields an empty list, never an error.
pub async fn extract_keywords<M: KeywordModel>(
    model: &M,
    text: &str,
    top_n: usize,
) -> Vec<String> {
    if text.trim().is_empty() || top_n == 0 {
        return Vec::new();
    }

    let candidates = candidate_phrases(text);
    if candidates.is_empty() {
        return Vec::new();
    }

    let scores = match model.rank(text, &candidates).await {
        Ok(scores) if scores.len() == candidates.len() => scores,
        Ok(scores) => {
            tracing::warn!(
                expected = candidates.len(),
                got = scores.len(),
                "keyword model returned a mismatched score count, using frequency fallback"
            );
            frequency_scores(text, &candidates)
        }
        Err(error) => {
            tracing::warn!(error = %error, "keyword model failed, using frequency fallback");
            frequency_scores(text, &candidates)
        }
    };

    // Stable sort by score descending; candidate generation order (first
    // occurrence in the text) breaks ties deterministically.
    let mut ranked: Vec<(String, f64)> = candidates.into_iter().zip(scores).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<String> = Vec::with_capacity(top_n);
    for (candidate, _) in ranked {
        if kept.iter().any(|k| is_near_duplicate(k, &candidate)) {
            tracing::trace!(candidate, "suppressing near-duplicate keyword");
            continue;
        }
        kept.push(candidate);
        if kept.len() == top_n {
            break;
        }
    }

    tracing::info!(keywords = kept.len(), "extracted negative keywords");
    kept
}

/// One generated statement per keyword, same order as the keywords.
#[must_use]
pub fn improvement_areas(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|kw| format!("Address issues related to '{kw}'"))
        .collect()
}

/// Build candidate phrases of 1–3 words, first-occurrence order, capped at
/// [`MAX_CANDIDATES`] by frequency.
///
/// Unigrams must be content words (not stopwords, longer than 2 chars);
/// multi-word phrases must start and end on content words so candidates like
/// "of the" never surface.
fn candidate_phrases(text: &str) -> Vec<String> {
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for len in 1..=3usize {
        for window in words.windows(len) {
            let first = window[0];
            let last = window[len - 1];
            if !is_content_word(first) || !is_content_word(last) {
                continue;
            }
            // Interior stopwords are fine ("waste of money").
            let phrase = window.join(" ");
            match counts.entry(phrase) {
                std::collections::hash_map::Entry::Vacant(entry) => {
                    order.push(entry.key().clone());
                    entry.insert(1);
                }
                std::collections::hash_map::Entry::Occupied(mut entry) => {
                    *entry.get_mut() += 1;
                }
            }
        }
    }

    if order.len() > MAX_CANDIDATES {
        // Keep the most frequent candidates; ties keep first-occurrence order.
        let mut indexed: Vec<(usize, String)> = order.into_iter().enumerate().collect();
        indexed.sort_by(|a, b| counts[&b.1].cmp(&counts[&a.1]).then(a.0.cmp(&b.0)));
        indexed.truncate(MAX_CANDIDATES);
        indexed.sort_by_key(|(idx, _)| *idx);
        order = indexed.into_iter().map(|(_, phrase)| phrase).collect();
        return order;
    }
    order
}

fn is_content_word(word: &str) -> bool {
    word.len() > 2 && !STOPWORDS.contains(&word)
}

/// Occurrence counts as relevance scores; the local fallback ranking.
fn frequency_scores(text: &str, candidates: &[String]) -> Vec<f64> {
    candidates
        .iter()
        .map(|candidate| {
            #[allow(clippy::cast_precision_loss)]
            let count = text.matches(candidate.as_str()).count() as f64;
            // Longer phrases are rarer; weight by word count so "app crash"
            // can compete with its unigram parts.
            #[allow(clippy::cast_precision_loss)]
            let words = candidate.split(' ').count() as f64;
            count * words.sqrt()
        })
        .collect()
}

/// Near-duplicate test: high edit similarity, or one phrase's content tokens
/// all subsumed by the other's (token prefix match covers simple inflection,
/// so "crash" subsumes "crashes" and "app crash").
fn is_near_duplicate(a: &str, b: &str) -> bool {
    if normalized_levenshtein(a, b) >= SIMILARITY_THRESHOLD {
        return true;
    }
    tokens_subsumed(a, b) || tokens_subsumed(b, a)
}

fn tokens_subsumed(needle: &str, haystack: &str) -> bool {
    needle.split(' ').filter(|t| is_content_word(t)).all(|t| {
        haystack
            .split(' ')
            .any(|h| shares_stem(t, h))
    })
}

fn shares_stem(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    long.len() - short.len() <= 2 && long.starts_with(short)
}

// ---------------------------------------------------------------------------
// Rankers
// ---------------------------------------------------------------------------

/// Local frequency-based ranker, used when no embeddings server is configured.
#[derive(Debug, Clone, Default)]
pub struct FrequencyRanker;

impl KeywordModel for FrequencyRanker {
    fn rank(
        &self,
        document: &str,
        candidates: &[String],
    ) -> impl Future<Output = Result<Vec<f64>, ModelError>> + Send {
        let scores = frequency_scores(document, candidates);
        async move { Ok(scores) }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: Vec<&'a str>,
}

/// Embedding-based ranker backed by a text-embeddings inference server.
///
/// Scores each candidate by cosine similarity between its embedding and the
/// whole document's embedding, one `/embed` call per batch.
#[derive(Debug, Clone)]
pub struct EmbeddingRanker {
    client: reqwest::Client,
    url: String,
}

impl EmbeddingRanker {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/embed", base_url.trim_end_matches('/')),
        }
    }

    async fn embed(&self, inputs: Vec<&str>) -> Result<Vec<Vec<f32>>, ModelError> {
        let expected = inputs.len();
        let response = self
            .client
            .post(&self.url)
            .json(&EmbedRequest { inputs })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ModelError::Inference(format!(
                "embeddings server returned status {}",
                response.status()
            )));
        }

        let embeddings: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| ModelError::Inference(format!("embeddings response parse error: {e}")))?;

        if embeddings.len() != expected {
            return Err(ModelError::Inference(format!(
                "embeddings server returned {} vectors for {} inputs",
                embeddings.len(),
                expected
            )));
        }
        Ok(embeddings)
    }
}

impl KeywordModel for EmbeddingRanker {
    fn rank(
        &self,
        document: &str,
        candidates: &[String],
    ) -> impl Future<Output = Result<Vec<f64>, ModelError>> + Send {
        async move {
            let mut inputs: Vec<&str> = Vec::with_capacity(candidates.len() + 1);
            inputs.push(document);
            inputs.extend(candidates.iter().map(String::as_str));

            let mut embeddings = self.embed(inputs).await?;
            let doc_embedding = embeddings.remove(0);

            Ok(embeddings
                .iter()
                .map(|candidate| cosine_similarity(&doc_embedding, candidate))
                .collect())
        }
    }
}

/// Ranker selected at startup from configuration. Keeps the pipeline free of
/// trait objects while supporting both backends.
#[derive(Debug, Clone)]
pub enum KeywordRanker {
    Frequency(FrequencyRanker),
    Embedding(EmbeddingRanker),
}

impl KeywordRanker {
    /// Embedding-backed when a server URL is configured, frequency otherwise.
    #[must_use]
    pub fn from_config(embeddings_url: Option<&str>) -> Self {
        match embeddings_url {
            Some(url) => Self::Embedding(EmbeddingRanker::new(url)),
            None => Self::Frequency(FrequencyRanker),
        }
    }
}

impl KeywordModel for KeywordRanker {
    fn rank(
        &self,
        document: &str,
        candidates: &[String],
    ) -> impl Future<Output = Result<Vec<f64>, ModelError>> + Send {
        async move {
            match self {
                Self::Frequency(ranker) => ranker.rank(document, candidates).await,
                Self::Embedding(ranker) => ranker.rank(document, candidates).await,
            }
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// English stopwords excluded from candidate-phrase boundaries.
const STOPWORDS: &[&str] = &[
    "the", "and", "but", "for", "nor", "yet", "with", "this", "that", "these", "those", "was",
    "were", "are", "been", "being", "have", "has", "had", "does", "did", "doing", "will", "would",
    "should", "could", "can", "cannot", "not", "you", "your", "yours", "they", "them", "their",
    "there", "here", "where", "when", "what", "which", "who", "whom", "how", "why", "all", "any",
    "both", "each", "few", "more", "most", "other", "some", "such", "only", "own", "same", "than",
    "too", "very", "just", "about", "after", "again", "against", "because", "before", "between",
    "down", "during", "from", "further", "into", "once", "out", "over", "then", "through",
    "under", "until", "while", "its", "his", "her", "hers", "him", "she", "our", "ours", "get",
    "got", "also", "app",
];
