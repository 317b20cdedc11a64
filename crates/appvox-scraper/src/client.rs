//! HTTP client for the App Store customer-review feed.
//!
//! Wraps `reqwest` with feed-specific error handling, pagination, and retry
//! with back-off. The feed serves at most [`MAX_PAGES`] pages of roughly 50
//! reviews each; fetching fewer reviews than requested is a normal outcome,
//! not an error.

use std::time::Duration;

use appvox_core::{AppConfig, RawReview};
use reqwest::{Client, Url};

use crate::error::ScraperError;
use crate::retry::retry_with_backoff;
use crate::types::{FeedDocument, FeedEntry};

const DEFAULT_BASE_URL: &str = "https://itunes.apple.com";

/// The feed stops serving past this page regardless of how many reviews the
/// app has.
const MAX_PAGES: u32 = 10;

/// Validate an App Store app id: a non-empty string of ASCII digits.
///
/// Runs before any network or pipeline work so a malformed id fails fast.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidAppId`] otherwise.
pub fn validate_app_id(app_id: &str) -> Result<(), ScraperError> {
    if !app_id.is_empty() && app_id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ScraperError::InvalidAppId {
            app_id: app_id.to_owned(),
        })
    }
}

/// Client for the App Store customer-review feed.
///
/// Use [`ReviewFeedClient::new`] for production or
/// [`ReviewFeedClient::with_base_url`] to point at a mock server in tests.
pub struct ReviewFeedClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ReviewFeedClient {
    /// Creates a new client pointed at the production feed.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ScraperError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(config: &AppConfig, base_url: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.feed_request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.feed_user_agent.clone())
            .build()?;

        let trimmed = base_url.trim_end_matches('/');
        let base_url = Url::parse(trimmed).map_err(|e| ScraperError::InvalidBaseUrl {
            base_url: trimmed.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            max_retries: config.feed_max_retries,
            backoff_base_ms: config.feed_retry_backoff_base_ms,
        })
    }

    /// Fetch up to `count` of the most recent reviews for an app.
    ///
    /// Pages through the feed until `count` reviews are collected, the feed
    /// runs out, or the page cap is reached. The result may hold fewer than
    /// `count` reviews; no ordering is guaranteed beyond what the feed
    /// serves.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidAppId`] if `app_id` is not all digits.
    /// - [`ScraperError::Http`] on network failure or non-2xx status, after
    ///   retries are exhausted.
    /// - [`ScraperError::Deserialize`] if a page is not valid feed JSON.
    pub async fn fetch(
        &self,
        app_id: &str,
        country: &str,
        count: usize,
    ) -> Result<Vec<RawReview>, ScraperError> {
        validate_app_id(app_id)?;

        let mut reviews = Vec::new();
        for page in 1..=MAX_PAGES {
            if reviews.len() >= count {
                break;
            }

            let url = self.page_url(app_id, country, page)?;
            let document = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                self.request_page(url.clone())
            })
            .await?;

            let page_reviews: Vec<RawReview> = document
                .feed
                .entry
                .into_iter()
                .filter_map(FeedEntry::into_raw_review)
                .collect();

            tracing::debug!(app_id, page, fetched = page_reviews.len(), "feed page");

            if page_reviews.is_empty() {
                break;
            }
            reviews.extend(page_reviews);
        }

        reviews.truncate(count);
        tracing::info!(app_id, country, collected = reviews.len(), "feed fetch complete");
        Ok(reviews)
    }

    fn page_url(&self, app_id: &str, country: &str, page: u32) -> Result<Url, ScraperError> {
        let path = format!(
            "{}/rss/customerreviews/page={page}/id={app_id}/sortby=mostrecent/json",
            country.to_lowercase()
        );
        self.base_url
            .join(&path)
            .map_err(|e| ScraperError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn request_page(&self, url: Url) -> Result<FeedDocument, ScraperError> {
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ScraperError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}
