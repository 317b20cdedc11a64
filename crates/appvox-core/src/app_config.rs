use std::net::SocketAddr;

/// Application configuration, sourced from environment variables.
///
/// `Debug` redacts `database_url` so the struct can be logged at startup
/// without leaking credentials.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub log_level: String,

    /// Country storefront used when fetching reviews (ISO 3166-1 alpha-2).
    pub default_country: String,
    /// Default number of reviews collected per run.
    pub default_review_limit: usize,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    pub feed_request_timeout_secs: u64,
    pub feed_user_agent: String,
    pub feed_max_retries: u32,
    pub feed_retry_backoff_base_ms: u64,

    /// Character budget handed to the sentiment model; longer review text is
    /// truncated deterministically from the start.
    pub classifier_max_chars: usize,
    /// Per-review classification timeout. A stuck call degrades that one
    /// review to "unknown" rather than stalling the batch.
    pub classifier_timeout_ms: u64,
    /// Worker-pool bound for concurrent per-review classification.
    pub classifier_max_concurrency: usize,

    /// How many negative keywords (and improvement areas) to report.
    pub keyword_top_n: usize,
    /// Optional base URL of a text-embeddings inference server used for
    /// keyword ranking. When unset, the frequency-based ranker is used.
    pub embeddings_url: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("default_country", &self.default_country)
            .field("default_review_limit", &self.default_review_limit)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("feed_request_timeout_secs", &self.feed_request_timeout_secs)
            .field("feed_user_agent", &self.feed_user_agent)
            .field("feed_max_retries", &self.feed_max_retries)
            .field(
                "feed_retry_backoff_base_ms",
                &self.feed_retry_backoff_base_ms,
            )
            .field("classifier_max_chars", &self.classifier_max_chars)
            .field("classifier_timeout_ms", &self.classifier_timeout_ms)
            .field(
                "classifier_max_concurrency",
                &self.classifier_max_concurrency,
            )
            .field("keyword_top_n", &self.keyword_top_n)
            .field("embeddings_url", &self.embeddings_url)
            .finish()
    }
}
