//! Sentiment classification adapter.
//!
//! [`SentimentModel`] is the contract an external binary classifier must
//! satisfy: text in, label + confidence out. [`SentimentAdapter`] wraps any
//! model with the guarantees the pipeline needs — deterministic truncation,
//! a per-call timeout, an "unknown" sentinel instead of failures, and a
//! signed score whose sign encodes polarity so downstream averaging stays
//! polarity-aware.

use std::future::Future;
use std::time::Duration;

use appvox_core::SentimentLabel;

use crate::error::ModelError;

/// Raw model output: a label plus an unsigned confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: SentimentLabel,
    pub confidence: f64,
}

/// Contract for a binary sentiment classifier.
///
/// Implementations are process-wide, read-only after construction, and safe
/// to share across concurrent per-review tasks.
pub trait SentimentModel: Send + Sync {
    /// Classify one piece of text.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when inference fails; the adapter converts any
    /// error into the unknown sentinel rather than surfacing it.
    fn classify(&self, text: &str) -> impl Future<Output = Result<Prediction, ModelError>> + Send;
}

/// Wraps a [`SentimentModel`] behind the pipeline's stability guarantees.
#[derive(Debug, Clone)]
pub struct SentimentAdapter<M> {
    model: M,
    max_chars: usize,
    timeout: Duration,
}

impl<M: SentimentModel> SentimentAdapter<M> {
    #[must_use]
    pub fn new(model: M, max_chars: usize, timeout: Duration) -> Self {
        Self {
            model,
            max_chars,
            timeout,
        }
    }

    /// Classify `text`, returning `None` (the "unknown" sentinel) for empty
    /// input, model errors, and timeouts. Callers must exclude `None` from
    /// aggregation denominators — it is not a neutral data point.
    ///
    /// The returned score is signed: NEGATIVE predictions are negated so a
    /// batch of strongly negative reviews averages close to -1.
    pub async fn classify(&self, text: &str) -> Option<(SentimentLabel, f64)> {
        if text.is_empty() {
            return None;
        }

        let truncated = truncate_chars(text, self.max_chars);

        let prediction = match tokio::time::timeout(self.timeout, self.model.classify(truncated))
            .await
        {
            Ok(Ok(prediction)) => prediction,
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "sentiment model failed, marking review unknown");
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis(),
                    "sentiment model timed out, marking review unknown"
                );
                return None;
            }
        };

        let magnitude = prediction.confidence.abs().clamp(0.0, 1.0);
        let score = match prediction.label {
            SentimentLabel::Positive => magnitude,
            SentimentLabel::Negative => -magnitude,
        };
        tracing::trace!(label = ?prediction.label, score, "classified review");
        Some((prediction.label, score))
    }
}

/// Keep the first `max_chars` characters of `text`, cutting at a char
/// boundary. Stable across runs for the same input.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// In-process lexicon classifier, the default when no remote model is
/// configured. Word weights are tuned for app-review vocabulary; a negator
/// within the three preceding tokens flips a word's polarity ("not great").
#[derive(Debug, Clone, Default)]
pub struct LexiconModel;

impl LexiconModel {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn score_text(text: &str) -> f64 {
        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect();

        let mut score = 0.0_f64;
        for (i, token) in tokens.iter().enumerate() {
            let base = word_weight(token);
            if base == 0.0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(&tokens[i - k]));
            score += if negated { -base } else { base };
        }
        score.clamp(-1.0, 1.0)
    }
}

impl SentimentModel for LexiconModel {
    fn classify(&self, text: &str) -> impl Future<Output = Result<Prediction, ModelError>> + Send {
        let score = Self::score_text(text);
        let label = if score < 0.0 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Positive
        };
        let prediction = Prediction {
            label,
            confidence: score.abs(),
        };
        async move { Ok(prediction) }
    }
}

/// App-review word weights. Positive in `(0, 1]`, negative in `[-1, 0)`.
const LEXICON: &[(&str, f64)] = &[
    // Positive signals
    ("love", 0.5),
    ("loved", 0.5),
    ("amazing", 0.5),
    ("awesome", 0.5),
    ("excellent", 0.5),
    ("perfect", 0.5),
    ("fantastic", 0.5),
    ("best", 0.5),
    ("great", 0.4),
    ("helpful", 0.4),
    ("useful", 0.4),
    ("fun", 0.4),
    ("recommend", 0.4),
    ("beautiful", 0.4),
    ("good", 0.3),
    ("nice", 0.3),
    ("easy", 0.3),
    ("smooth", 0.3),
    ("intuitive", 0.3),
    ("reliable", 0.3),
    // Negative signals
    ("unusable", -0.7),
    ("scam", -0.7),
    ("crash", -0.6),
    ("crashes", -0.6),
    ("crashing", -0.6),
    ("crashed", -0.6),
    ("buggy", -0.6),
    ("broken", -0.6),
    ("terrible", -0.6),
    ("awful", -0.6),
    ("worst", -0.6),
    ("useless", -0.6),
    ("bug", -0.5),
    ("bugs", -0.5),
    ("freeze", -0.5),
    ("freezes", -0.5),
    ("laggy", -0.5),
    ("hate", -0.5),
    ("annoying", -0.5),
    ("waste", -0.5),
    ("refund", -0.5),
    ("uninstall", -0.5),
    ("uninstalled", -0.5),
    ("disappointing", -0.5),
    ("disappointed", -0.5),
    ("spam", -0.5),
    ("bad", -0.4),
    ("slow", -0.4),
    ("lag", -0.4),
    ("error", -0.4),
    ("errors", -0.4),
    ("fails", -0.4),
    ("failed", -0.4),
    ("stuck", -0.4),
    ("confusing", -0.4),
    ("ads", -0.3),
    ("expensive", -0.3),
];

fn word_weight(word: &str) -> f64 {
    LEXICON
        .iter()
        .find(|(w, _)| *w == word)
        .map_or(0.0, |(_, weight)| *weight)
}

fn is_negator(token: &str) -> bool {
    matches!(
        token,
        "not" | "no" | "never" | "isn" | "wasn" | "aren" | "won" | "can" | "cannot" | "without"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingModel;

    impl SentimentModel for FailingModel {
        fn classify(
            &self,
            _text: &str,
        ) -> impl Future<Output = Result<Prediction, ModelError>> + Send {
            async { Err(ModelError::Inference("model exploded".to_string())) }
        }
    }

    struct SlowModel;

    impl SentimentModel for SlowModel {
        fn classify(
            &self,
            _text: &str,
        ) -> impl Future<Output = Result<Prediction, ModelError>> + Send {
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Prediction {
                    label: SentimentLabel::Positive,
                    confidence: 1.0,
                })
            }
        }
    }

    /// Records the text it was handed, so truncation can be asserted.
    struct EchoLenModel(std::sync::Mutex<Vec<usize>>);

    impl SentimentModel for EchoLenModel {
        fn classify(
            &self,
            text: &str,
        ) -> impl Future<Output = Result<Prediction, ModelError>> + Send {
            self.0.lock().unwrap().push(text.chars().count());
            async {
                Ok(Prediction {
                    label: SentimentLabel::Positive,
                    confidence: 0.5,
                })
            }
        }
    }

    fn adapter<M: SentimentModel>(model: M) -> SentimentAdapter<M> {
        SentimentAdapter::new(model, 512, Duration::from_millis(100))
    }

    #[tokio::test]
    async fn empty_input_is_unknown() {
        assert!(adapter(LexiconModel::new()).classify("").await.is_none());
    }

    #[tokio::test]
    async fn model_error_is_unknown_not_neutral() {
        assert!(adapter(FailingModel).classify("anything").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_unknown() {
        assert!(adapter(SlowModel).classify("anything").await.is_none());
    }

    #[tokio::test]
    async fn negative_label_gets_negative_score() {
        let (label, score) = adapter(LexiconModel::new())
            .classify("crashes constantly, very buggy")
            .await
            .unwrap();
        assert_eq!(label, SentimentLabel::Negative);
        assert!(score < 0.0, "expected negative score, got {score}");
    }

    #[tokio::test]
    async fn positive_label_gets_positive_score() {
        let (label, score) = adapter(LexiconModel::new())
            .classify("great app!")
            .await
            .unwrap();
        assert_eq!(label, SentimentLabel::Positive);
        assert!(score >= 0.0, "expected non-negative score, got {score}");
    }

    #[tokio::test]
    async fn sign_always_matches_label() {
        let texts = [
            "love it",
            "worst app",
            "good but slow",
            "nothing in the lexicon here",
        ];
        let adapter = adapter(LexiconModel::new());
        for text in texts {
            let (label, score) = adapter.classify(text).await.unwrap();
            match label {
                SentimentLabel::Positive => assert!(score >= 0.0, "{text}"),
                SentimentLabel::Negative => assert!(score <= 0.0, "{text}"),
            }
        }
    }

    #[tokio::test]
    async fn long_input_is_truncated_to_char_budget() {
        let model = EchoLenModel(std::sync::Mutex::new(Vec::new()));
        let adapter = SentimentAdapter::new(model, 10, Duration::from_millis(100));
        adapter.classify(&"x".repeat(100)).await.unwrap();
        // Multibyte chars must not split; the budget counts chars, not bytes.
        adapter.classify(&"é".repeat(100)).await.unwrap();
        let seen = adapter.model.0.lock().unwrap();
        assert_eq!(*seen, vec![10, 10]);
    }

    #[test]
    fn negation_flips_polarity() {
        assert!(LexiconModel::score_text("not great at all") < 0.0);
        assert!(LexiconModel::score_text("great") > 0.0);
    }

    #[test]
    fn score_is_clamped() {
        let pile = "crash crashes crashing broken buggy terrible awful worst useless scam";
        assert!((LexiconModel::score_text(pile) - (-1.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn strongly_negative_batch_averages_near_minus_one() {
        // A pile of strong negatives must not look like noisy positives.
        let texts = [
            "unusable scam terrible awful",
            "crash crashes broken buggy worst",
            "hate it, useless waste, uninstalled",
        ];
        let avg: f64 = texts
            .iter()
            .map(|t| LexiconModel::score_text(t))
            .sum::<f64>()
            / texts.len() as f64;
        assert!(avg < -0.8, "expected strongly negative average, got {avg}");
    }
}
