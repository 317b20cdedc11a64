//! Batch orchestration: raw reviews in, one complete report out.

use std::time::Duration;

use appvox_core::{AppConfig, AppReport, ProcessedReview, RawReview};
use futures::stream::{self, StreamExt};

use crate::compose::compose;
use crate::keywords::{extract_keywords, KeywordModel};
use crate::mapper::map_reviews;
use crate::metrics::{aggregate, summarize_sentiment};
use crate::sentiment::{SentimentAdapter, SentimentModel};

/// Ratings at or below this mark a review as dissatisfied; only those feed
/// keyword extraction.
const NEGATIVE_RATING_CEILING: i32 = 2;

/// Tunables for one analysis run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub classifier_max_chars: usize,
    pub classifier_timeout: Duration,
    /// Worker-pool bound for concurrent classification. Classification calls
    /// are the only suspending work in the pipeline; everything else is pure
    /// and CPU-bound.
    pub max_concurrency: usize,
    pub keyword_top_n: usize,
    /// Opaque handle to an externally rendered word-cloud artifact, empty
    /// when none was produced.
    pub wordcloud: String,
}

impl PipelineOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            classifier_max_chars: config.classifier_max_chars,
            classifier_timeout: Duration::from_millis(config.classifier_timeout_ms),
            max_concurrency: config.classifier_max_concurrency.max(1),
            keyword_top_n: config.keyword_top_n,
            wordcloud: String::new(),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            classifier_max_chars: 512,
            classifier_timeout: Duration::from_secs(5),
            max_concurrency: 8,
            keyword_top_n: 10,
            wordcloud: String::new(),
        }
    }
}

/// Everything one pipeline run produces: the classified reviews that
/// survived filtering plus the composed report.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub processed: Vec<ProcessedReview>,
    pub report: AppReport,
}

/// Run the full review-to-insight pipeline over one batch.
///
/// 1. Map raw reviews into processed ones (drops empty/markup-only bodies).
/// 2. Classify sentiment per review, concurrently but bounded, preserving
///    input order — keyword extraction assumes the negative subset is stable.
/// 3. Aggregate rating metrics and the sentiment summary.
/// 4. Extract negative keywords from reviews rated ≤ 2.
/// 5. Compose the report.
///
/// Per-record defects degrade locally (dropped record or unknown sentiment);
/// this function itself is infallible and always yields a complete,
/// internally consistent report — the empty batch produces the documented
/// zero/`N/A` shape.
pub async fn run_analysis<S, K>(
    model: S,
    keyword_model: &K,
    raw: Vec<RawReview>,
    options: &PipelineOptions,
) -> AnalysisRun
where
    S: SentimentModel,
    K: KeywordModel,
{
    let batch_size = raw.len();
    tracing::info!(batch_size, "starting analysis run");

    let mut reviews = map_reviews(raw);

    let adapter = SentimentAdapter::new(
        model,
        options.classifier_max_chars,
        options.classifier_timeout,
    );
    classify_batch(&adapter, &mut reviews, options.max_concurrency).await;

    let metrics = aggregate(&reviews);
    let summary = summarize_sentiment(&reviews);

    let negative_text = negative_review_text(&reviews);
    let negative_keywords =
        extract_keywords(keyword_model, &negative_text, options.keyword_top_n).await;

    let insights = compose(&summary, negative_keywords, options.wordcloud.clone());

    tracing::info!(
        processed = metrics.total_reviews,
        overall = ?insights.overall_sentiment,
        keywords = insights.negative_keywords.len(),
        "analysis run complete"
    );

    AnalysisRun {
        processed: reviews,
        report: AppReport { metrics, insights },
    }
}

/// Classify every review with a bounded worker pool.
///
/// `buffered` (rather than `buffer_unordered`) keeps completion order equal
/// to input order, so results can be zipped straight back onto the batch.
async fn classify_batch<M: SentimentModel>(
    adapter: &SentimentAdapter<M>,
    reviews: &mut [ProcessedReview],
    max_concurrency: usize,
) {
    // Futures are collected eagerly so each one carries a concrete lifetime;
    // mapping lazily over the borrowing iterator trips rustc's higher-ranked
    // `Send` inference (rust-lang/rust#102211) in `Send` callers.
    let futures: Vec<_> = reviews
        .iter()
        .map(|review| adapter.classify(&review.review_text))
        .collect();
    let results: Vec<_> = stream::iter(futures)
        .buffered(max_concurrency.max(1))
        .collect()
        .await;

    for (review, outcome) in reviews.iter_mut().zip(results) {
        if let Some((label, score)) = outcome {
            review.sentiment = Some(label);
            review.sentiment_score = Some(score);
        }
    }
}

/// Concatenated normalized text of dissatisfied reviews, input order.
fn negative_review_text(reviews: &[ProcessedReview]) -> String {
    reviews
        .iter()
        .filter(|r| r.rating <= NEGATIVE_RATING_CEILING)
        .map(|r| r.review_text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use appvox_core::{OverallSentiment, SentimentLabel};

    use crate::keywords::FrequencyRanker;
    use crate::sentiment::LexiconModel;

    use super::*;

    fn raw(rating: i32, body: &str) -> RawReview {
        RawReview {
            rating,
            title: String::new(),
            review: body.to_string(),
            date: None,
        }
    }

    #[tokio::test]
    async fn empty_batch_produces_na_report() {
        let run = run_analysis(
            LexiconModel::new(),
            &FrequencyRanker,
            Vec::new(),
            &PipelineOptions::default(),
        )
        .await;
        let report = run.report;

        assert!(run.processed.is_empty());
        assert_eq!(report.metrics.total_reviews, 0);
        assert!(report
            .metrics
            .rating_distribution
            .values()
            .all(|&v| v.abs() < f64::EPSILON));
        assert_eq!(report.insights.overall_sentiment, OverallSentiment::Na);
        assert!(report.insights.negative_keywords.is_empty());
        assert!(report.insights.improvement_areas.is_empty());
    }

    #[tokio::test]
    async fn spec_scenario_end_to_end() {
        let batch = vec![
            raw(5, "Great app!"),
            raw(1, "Crashes constantly, very buggy"),
        ];
        let run = run_analysis(
            LexiconModel::new(),
            &FrequencyRanker,
            batch,
            &PipelineOptions::default(),
        )
        .await;
        let report = run.report;

        assert_eq!(run.processed.len(), 2);
        assert_eq!(report.metrics.total_reviews, 2);
        assert!((report.metrics.average_rating - 3.0).abs() < f64::EPSILON);
        assert!((report.metrics.rating_distribution[&1] - 50.0).abs() < f64::EPSILON);
        assert!((report.metrics.rating_distribution[&5] - 50.0).abs() < f64::EPSILON);

        // Keywords come from the 1-star review only.
        assert!(!report.insights.negative_keywords.is_empty());
        assert!(report
            .insights
            .negative_keywords
            .iter()
            .any(|k| k.contains("crash") || k.contains("buggy")));
        assert!(!report
            .insights
            .negative_keywords
            .iter()
            .any(|k| k.contains("great")));
        assert_eq!(
            report.insights.improvement_areas.len(),
            report.insights.negative_keywords.len()
        );
    }

    #[tokio::test]
    async fn markup_only_reviews_are_dropped_before_metrics() {
        let batch = vec![raw(5, "<b>😀😀</b>"), raw(4, "works well")];
        let run = run_analysis(
            LexiconModel::new(),
            &FrequencyRanker,
            batch,
            &PipelineOptions::default(),
        )
        .await;
        assert_eq!(run.report.metrics.total_reviews, 1);
        assert_eq!(run.processed.len(), 1);
    }

    #[tokio::test]
    async fn classification_results_line_up_with_input_order() {
        let batch = vec![
            raw(5, "love it, fantastic"),
            raw(1, "terrible, crashes, worst app"),
            raw(5, "amazing and helpful"),
        ];
        let mut reviews = map_reviews(batch);
        let adapter = SentimentAdapter::new(LexiconModel::new(), 512, Duration::from_secs(1));
        classify_batch(&adapter, &mut reviews, 2).await;

        assert_eq!(reviews[0].sentiment, Some(SentimentLabel::Positive));
        assert_eq!(reviews[1].sentiment, Some(SentimentLabel::Negative));
        assert_eq!(reviews[2].sentiment, Some(SentimentLabel::Positive));
        assert!(reviews[1].sentiment_score.unwrap() <= 0.0);
    }

    #[tokio::test]
    async fn negative_text_only_covers_low_ratings() {
        let reviews = map_reviews(vec![
            raw(5, "wonderful"),
            raw(2, "slow and laggy"),
            raw(1, "ads everywhere"),
            raw(3, "average experience"),
        ]);
        let text = negative_review_text(&reviews);
        assert_eq!(text, "slow and laggy ads everywhere");
    }
}
