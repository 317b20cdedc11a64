//! Serde models for the App Store customer-review feed.
//!
//! The feed wraps every scalar in a `{"label": "..."}` object and encodes
//! ratings as strings, so the wire types here are deliberately loose; the
//! only strict conversion happens in [`FeedEntry::into_raw_review`].

use appvox_core::RawReview;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Top-level feed document: `{"feed": {...}}`.
#[derive(Debug, Deserialize)]
pub struct FeedDocument {
    pub feed: Feed,
}

/// The feed body. `entry` is absent entirely on pages past the last one.
#[derive(Debug, Deserialize)]
pub struct Feed {
    #[serde(default)]
    pub entry: Vec<FeedEntry>,
}

/// One feed entry. Entries without a rating are feed metadata (the app's
/// own summary entry), not reviews.
#[derive(Debug, Deserialize)]
pub struct FeedEntry {
    #[serde(rename = "im:rating")]
    pub rating: Option<Label>,
    pub title: Option<Label>,
    pub content: Option<Label>,
    pub updated: Option<Label>,
}

/// The feed's universal `{"label": "..."}` scalar wrapper.
#[derive(Debug, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub label: String,
}

impl FeedEntry {
    /// Convert a feed entry into a [`RawReview`], or `None` for non-review
    /// entries (no rating) and entries whose rating is not an integer.
    ///
    /// An unparseable `updated` timestamp degrades to `date: None` rather
    /// than discarding the review.
    #[must_use]
    pub fn into_raw_review(self) -> Option<RawReview> {
        let rating = self.rating?.label.trim().parse::<i32>().ok()?;
        let date = self
            .updated
            .and_then(|u| DateTime::parse_from_rfc3339(&u.label).ok())
            .map(|d| d.with_timezone(&Utc));

        Some(RawReview {
            rating,
            title: self.title.map(|t| t.label).unwrap_or_default(),
            review: self.content.map(|c| c.label).unwrap_or_default(),
            date,
        })
    }
}
