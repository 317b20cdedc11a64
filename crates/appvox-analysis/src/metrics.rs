//! Batch aggregation: rating metrics, length statistics, and the
//! overall-sentiment ladder.

use std::collections::BTreeMap;

use appvox_core::{
    OverallSentiment, ProcessedReview, ReviewLengthStats, ReviewMetrics, SentimentDistribution,
    SentimentLabel, SentimentSummary,
};

use crate::normalize::normalize;

/// Round half away from zero to two decimal places. `f64::round` already
/// rounds half away from zero; tests pin the exact values.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute rating and length metrics over one batch.
///
/// The empty batch is not an error: it yields zeroed stats with all six
/// distribution keys present at 0.0. Length statistics are computed over
/// re-normalized text — normalization is idempotent, so this is safe, and it
/// keeps the stats consistent even if a caller hands in text that skipped
/// the mapper.
#[must_use]
pub fn aggregate(reviews: &[ProcessedReview]) -> ReviewMetrics {
    let mut rating_distribution: BTreeMap<u8, f64> = (0u8..=5).map(|r| (r, 0.0)).collect();

    if reviews.is_empty() {
        tracing::info!("aggregating empty batch, returning zeroed metrics");
        return ReviewMetrics {
            average_rating: 0.0,
            rating_distribution,
            total_reviews: 0,
            review_length_stats: ReviewLengthStats {
                min: 0,
                max: 0,
                avg: 0.0,
            },
        };
    }

    let total = reviews.len();
    #[allow(clippy::cast_precision_loss)]
    let total_f = total as f64;

    let rating_sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
    #[allow(clippy::cast_precision_loss)]
    let average_rating = round2(rating_sum as f64 / total_f);

    for review in reviews {
        // Ratings are clamped to 0..=5 by the mapper, so every one of them
        // lands on an existing key.
        let key = u8::try_from(review.rating.clamp(0, 5)).unwrap_or(0);
        if let Some(slot) = rating_distribution.get_mut(&key) {
            *slot += 1.0;
        }
    }
    for value in rating_distribution.values_mut() {
        *value = round2(*value * 100.0 / total_f);
    }

    let lengths: Vec<usize> = reviews
        .iter()
        .map(|r| normalize(&r.review_text).chars().count())
        .collect();
    #[allow(clippy::cast_precision_loss)]
    let avg_len = lengths.iter().sum::<usize>() as f64 / total_f;
    let review_length_stats = ReviewLengthStats {
        min: lengths.iter().copied().min().unwrap_or(0),
        max: lengths.iter().copied().max().unwrap_or(0),
        avg: round2(avg_len),
    };

    tracing::info!(total, average_rating, "aggregated review metrics");

    ReviewMetrics {
        average_rating,
        rating_distribution,
        total_reviews: total,
        review_length_stats,
    }
}

/// Summarize sentiment over the classified subset of a batch.
///
/// Reviews carrying the unknown sentinel are excluded from counts and the
/// signed average. The overall label follows a fixed ladder:
/// - nothing classified → `N/A`;
/// - majority label wins, escalating to `VERY_` when `|avg| > 0.8`;
/// - a tie falls through to magnitude: `> 0.8` → `VERY_`, `> 0.6` → plain,
///   otherwise `SLIGHTLY_`, suffixed by the sign of the average; a tie with
///   an average of exactly zero is `NEUTRAL`.
#[must_use]
pub fn summarize_sentiment(reviews: &[ProcessedReview]) -> SentimentSummary {
    let mut distribution = SentimentDistribution::default();
    let mut score_sum = 0.0_f64;

    for review in reviews {
        match (review.sentiment, review.sentiment_score) {
            (Some(SentimentLabel::Positive), Some(score)) => {
                distribution.positive += 1;
                score_sum += score;
            }
            (Some(SentimentLabel::Negative), Some(score)) => {
                distribution.negative += 1;
                score_sum += score;
            }
            _ => {}
        }
    }

    let classified = distribution.positive + distribution.negative;
    if classified == 0 {
        return SentimentSummary {
            overall_sentiment: OverallSentiment::Na,
            sentiment_score: 0.0,
            sentiment_distribution: distribution,
        };
    }

    #[allow(clippy::cast_precision_loss)]
    let avg = score_sum / classified as f64;
    let overall_sentiment = overall_label(&distribution, avg);

    tracing::info!(
        positive = distribution.positive,
        negative = distribution.negative,
        avg_score = avg,
        overall = ?overall_sentiment,
        "summarized batch sentiment"
    );

    SentimentSummary {
        overall_sentiment,
        sentiment_score: round2(avg),
        sentiment_distribution: distribution,
    }
}

fn overall_label(distribution: &SentimentDistribution, avg: f64) -> OverallSentiment {
    use std::cmp::Ordering;

    match distribution.positive.cmp(&distribution.negative) {
        Ordering::Greater => {
            if avg.abs() > 0.8 {
                OverallSentiment::VeryPositive
            } else {
                OverallSentiment::Positive
            }
        }
        Ordering::Less => {
            if avg.abs() > 0.8 {
                OverallSentiment::VeryNegative
            } else {
                OverallSentiment::Negative
            }
        }
        Ordering::Equal => {
            if avg == 0.0 {
                return OverallSentiment::Neutral;
            }
            let magnitude = avg.abs();
            match (magnitude > 0.8, magnitude > 0.6, avg > 0.0) {
                (true, _, true) => OverallSentiment::VeryPositive,
                (true, _, false) => OverallSentiment::VeryNegative,
                (false, true, true) => OverallSentiment::Positive,
                (false, true, false) => OverallSentiment::Negative,
                (false, false, true) => OverallSentiment::SlightlyPositive,
                (false, false, false) => OverallSentiment::SlightlyNegative,
            }
        }
    }
}
