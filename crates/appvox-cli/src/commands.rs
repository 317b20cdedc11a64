//! Command handlers for the CLI.
//!
//! These are called from `main` after the database pool and config are
//! established. They run the same pipeline and persistence code as the
//! server, printing progress to stdout instead of wrapping it in HTTP
//! envelopes.

use chrono::Utc;
use serde_json::json;

use appvox_analysis::{run_analysis, KeywordRanker, LexiconModel, PipelineOptions};
use appvox_core::AppConfig;
use appvox_db::{find_document, require_document, upsert_document, Collection, DbError};
use appvox_scraper::{validate_app_id, ReviewFeedClient};

/// Fetch reviews for one app, run the full analysis pipeline, and persist
/// raw, processed, metrics, and insights documents.
///
/// # Errors
///
/// Returns an error if the app id is invalid, the feed cannot be reached
/// after retries, or any document write fails. Per-review defects inside the
/// pipeline are recovered locally and never abort the run.
pub(crate) async fn run_collect(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    app_id: &str,
    country: Option<&str>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    validate_app_id(app_id)?;

    let country = country.unwrap_or(&config.default_country);
    let limit = limit.unwrap_or(config.default_review_limit).max(1);

    let client = ReviewFeedClient::new(config)
        .map_err(|e| anyhow::anyhow!("failed to build feed client: {e}"))?;

    println!("collecting up to {limit} reviews for app {app_id} ({country})...");
    let raw = client.fetch(app_id, country, limit).await?;
    let raw_count = raw.len();
    println!("fetched {raw_count} reviews");

    let raw_doc = json!({
        "app_id": app_id,
        "country": country,
        "fetched_at": Utc::now(),
        "reviews": &raw,
    });
    upsert_document(pool, Collection::RawReviews, app_id, &raw_doc).await?;

    let options = PipelineOptions::from_config(config);
    let ranker = KeywordRanker::from_config(config.embeddings_url.as_deref());
    let run = run_analysis(LexiconModel::new(), &ranker, raw, &options).await;

    let processed_doc = json!({
        "app_id": app_id,
        "processed_at": Utc::now(),
        "reviews": &run.processed,
    });
    upsert_document(pool, Collection::ProcessedReviews, app_id, &processed_doc).await?;

    let metrics_doc = serde_json::to_value(&run.report.metrics)?;
    upsert_document(pool, Collection::Metrics, app_id, &metrics_doc).await?;

    let insights_doc = serde_json::to_value(&run.report.insights)?;
    upsert_document(pool, Collection::Insights, app_id, &insights_doc).await?;

    println!(
        "processed {} reviews (dropped {})",
        run.processed.len(),
        raw_count.saturating_sub(run.processed.len())
    );
    println!("{}", serde_json::to_string_pretty(&run.report)?);
    Ok(())
}

/// Print the stored report for one app as pretty JSON.
///
/// # Errors
///
/// Returns an error if the app id is invalid, no metrics are stored for the
/// app, or the database cannot be reached.
pub(crate) async fn run_report(pool: &sqlx::PgPool, app_id: &str) -> anyhow::Result<()> {
    validate_app_id(app_id)?;

    let metrics = require_document(pool, Collection::Metrics, app_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => anyhow::anyhow!("no report stored for app {app_id}; run `appvox collect {app_id}` first"),
            other => anyhow::Error::from(other),
        })?;
    // Missing insights degrade to null, but a query failure must abort the
    // command rather than print a report with the section silently absent.
    let insights = find_document(pool, Collection::Insights, app_id)
        .await?
        .map(|row| row.document);

    let report = json!({
        "app_id": app_id,
        "updated_at": metrics.updated_at,
        "metrics": metrics.document,
        "insights": insights,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
