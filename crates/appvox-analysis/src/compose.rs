//! Final report assembly.

use appvox_core::{InsightsReport, SentimentSummary};

use crate::keywords::improvement_areas;

/// Assemble the per-app insights report from already-computed parts.
///
/// Pure assembly: no new computation beyond deriving one improvement-area
/// statement per keyword. Empty or all-unknown batches arrive here with an
/// `N/A` summary and an empty keyword list, and compose passes those defaults
/// through so the report is always complete and internally consistent.
#[must_use]
pub fn compose(
    summary: &SentimentSummary,
    negative_keywords: Vec<String>,
    wordcloud: String,
) -> InsightsReport {
    let improvement_areas = improvement_areas(&negative_keywords);
    InsightsReport {
        overall_sentiment: summary.overall_sentiment,
        sentiment_score: summary.sentiment_score,
        sentiment_distribution: summary.sentiment_distribution,
        negative_keywords,
        improvement_areas,
        wordcloud,
    }
}
