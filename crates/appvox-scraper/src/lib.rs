//! App Store customer-review feed client.

pub mod client;
pub mod error;
mod retry;
pub mod types;

pub use client::{validate_app_id, ReviewFeedClient};
pub use error::ScraperError;
pub use types::{Feed, FeedDocument, FeedEntry, Label};
