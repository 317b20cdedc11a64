//! Raw-to-processed review mapping and filtering.

use appvox_core::{ProcessedReview, RawReview};

use crate::normalize::normalize;

/// Convert raw reviews into [`ProcessedReview`]s, dropping records with no
/// analyzable content.
///
/// Policy:
/// - a review whose body is empty before normalization is dropped;
/// - a review whose body normalizes to the empty string (markup-only,
///   emoji-only) is dropped;
/// - a missing rating defaults to 0, and out-of-range values are clamped to
///   0..=5 so every counted rating stays visible in the rating distribution;
/// - `date` passes through untouched.
///
/// Sentiment fields are left unset; the classification pass fills them in.
/// Total over any input, including the empty batch.
#[must_use]
pub fn map_reviews(raw: Vec<RawReview>) -> Vec<ProcessedReview> {
    let total = raw.len();
    let mut processed = Vec::with_capacity(total);

    for review in raw {
        if review.review.is_empty() {
            tracing::trace!("dropping review with empty body");
            continue;
        }

        let review_text = normalize(&review.review);
        if review_text.is_empty() {
            tracing::trace!(raw = %truncate_for_log(&review.review), "dropping review that normalized to empty");
            continue;
        }

        processed.push(ProcessedReview {
            rating: review.rating.clamp(0, 5),
            title: normalize(&review.title),
            review_text,
            date: review.date,
            sentiment: None,
            sentiment_score: None,
        });
    }

    tracing::info!(
        kept = processed.len(),
        dropped = total - processed.len(),
        "mapped raw reviews"
    );
    processed
}

fn truncate_for_log(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(80)
        .map_or(text.len(), |(idx, _)| idx);
    &text[..end]
}
