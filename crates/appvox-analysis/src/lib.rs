//! Review-to-insight pipeline for appvox.
//!
//! Takes a batch of raw app-store reviews through deterministic text
//! normalization, sentiment classification, metric aggregation, and
//! negative-keyword extraction, and composes one immutable per-app report.
//! Per-record defects (markup-only bodies, classifier timeouts) are recovered
//! locally; the batch as a whole never fails on a single bad review.

pub mod compose;
pub mod error;
pub mod keywords;
pub mod mapper;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod sentiment;

pub use compose::compose;
pub use error::ModelError;
pub use keywords::{
    extract_keywords, improvement_areas, EmbeddingRanker, FrequencyRanker, KeywordModel,
    KeywordRanker,
};
pub use mapper::map_reviews;
pub use metrics::{aggregate, summarize_sentiment};
pub use normalize::normalize;
pub use pipeline::{run_analysis, AnalysisRun, PipelineOptions};
pub use sentiment::{LexiconModel, Prediction, SentimentAdapter, SentimentModel};
