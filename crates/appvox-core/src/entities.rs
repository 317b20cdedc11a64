//! Domain entities shared across the pipeline, store, and API layers.
//!
//! Field names on the report-facing types (`ReviewMetrics`, `InsightsReport`,
//! `AppReport`) are a wire contract: they serialize exactly as consumed by the
//! HTTP layer and stored in the document collections. Renaming a field here is
//! a breaking change for stored reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A review as delivered by the App Store feed, before any cleaning.
///
/// `review` may carry HTML markup, emoji, or be empty entirely; the
/// filter/mapper decides what survives. Immutable once scraped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReview {
    /// Star rating 1..=5 as reported by the store. `0` when absent upstream.
    #[serde(default)]
    pub rating: i32,
    /// Review headline; often empty.
    #[serde(default)]
    pub title: String,
    /// Review body as scraped. Possibly HTML-laden, possibly empty.
    #[serde(default)]
    pub review: String,
    /// When the review was posted, if the feed provided it.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Binary sentiment polarity produced by the classifier.
///
/// There is deliberately no `Neutral` variant: the underlying model is a
/// binary classifier, and records it cannot score carry `None` instead
/// (the "unknown" sentinel) so they can be excluded from aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
}

/// A cleaned review ready for aggregation.
///
/// Invariant: `review_text` is non-empty — records that normalize to nothing
/// are dropped by the mapper before this type is constructed. `rating` is
/// clamped to 0..=5 (0 means "missing rating").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedReview {
    pub rating: i32,
    pub title: String,
    pub review_text: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// `None` when classification did not produce a usable result.
    #[serde(default)]
    pub sentiment: Option<SentimentLabel>,
    /// Signed score in [-1, 1]; sign encodes polarity, magnitude encodes
    /// model confidence. `None` together with `sentiment`.
    #[serde(default)]
    pub sentiment_score: Option<f64>,
}

/// Character-length statistics over normalized review text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewLengthStats {
    pub min: usize,
    pub max: usize,
    pub avg: f64,
}

/// Aggregate metrics over one batch of processed reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewMetrics {
    /// Arithmetic mean of ratings, rounded half away from zero to 2 decimals.
    pub average_rating: f64,
    /// Percentage of the batch per rating value. Keys 0..=5 are always
    /// present, zero-filled; values sum to 100 (± rounding) when the batch
    /// is non-empty and are all 0.0 when it is empty.
    pub rating_distribution: BTreeMap<u8, f64>,
    pub total_reviews: usize,
    pub review_length_stats: ReviewLengthStats,
}

/// Seven-level overall-sentiment ladder, plus `NA` for batches where nothing
/// could be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallSentiment {
    #[serde(rename = "VERY_POSITIVE")]
    VeryPositive,
    #[serde(rename = "POSITIVE")]
    Positive,
    #[serde(rename = "SLIGHTLY_POSITIVE")]
    SlightlyPositive,
    #[serde(rename = "NEUTRAL")]
    Neutral,
    #[serde(rename = "SLIGHTLY_NEGATIVE")]
    SlightlyNegative,
    #[serde(rename = "NEGATIVE")]
    Negative,
    #[serde(rename = "VERY_NEGATIVE")]
    VeryNegative,
    #[serde(rename = "N/A")]
    Na,
}

/// Raw counts of classified reviews per polarity. Unknown-sentiment records
/// are excluded from both counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub negative: usize,
}

/// Batch-level sentiment summary produced by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub overall_sentiment: OverallSentiment,
    /// Signed average over classified reviews; 0.0 when nothing classified.
    pub sentiment_score: f64,
    pub sentiment_distribution: SentimentDistribution,
}

/// Insights for one app, composed once per analysis run. Subsequent runs for
/// the same app overwrite the stored document wholesale (upsert semantics).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsReport {
    pub overall_sentiment: OverallSentiment,
    pub sentiment_score: f64,
    pub sentiment_distribution: SentimentDistribution,
    /// Most salient first; drawn from reviews rated 2 stars or lower.
    pub negative_keywords: Vec<String>,
    /// One generated statement per negative keyword, same order.
    pub improvement_areas: Vec<String>,
    /// Opaque handle to an externally rendered word-cloud artifact.
    /// Empty when no artifact was produced.
    #[serde(default)]
    pub wordcloud: String,
}

/// The complete per-app analysis product: metrics plus insights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppReport {
    pub metrics: ReviewMetrics,
    pub insights: InsightsReport,
}
