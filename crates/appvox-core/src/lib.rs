pub mod config;
pub mod entities;

mod app_config;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use entities::{
    AppReport, InsightsReport, OverallSentiment, ProcessedReview, RawReview, ReviewLengthStats,
    ReviewMetrics, SentimentDistribution, SentimentLabel, SentimentSummary,
};
