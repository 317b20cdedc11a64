//! Review collection and reporting endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use appvox_analysis::{run_analysis, KeywordRanker, LexiconModel, PipelineOptions};
use appvox_core::{AppReport, InsightsReport, ReviewMetrics};
use appvox_db::{find_document, require_document, upsert_document, Collection};
use appvox_scraper::validate_app_id;

use super::{
    map_db_error, map_scraper_error, normalize_limit, ApiError, ApiResponse, AppState,
    ResponseMeta,
};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct CollectParams {
    country: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawParams {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct CollectData {
    raw_reviews_count: usize,
    processed_reviews_count: usize,
    metrics: ReviewMetrics,
    insights: InsightsReport,
}

#[derive(Debug, Serialize)]
pub(super) struct ReportData {
    metrics: Value,
    insights: Value,
}

/// `POST /api/v1/reviews/{app_id}` — fetch reviews from the feed, run the
/// pipeline, persist every stage, and return counts plus the fresh report.
pub(super) async fn collect_reviews(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(app_id): Path<String>,
    Query(params): Query<CollectParams>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = req_id.0;
    validate_app_id(&app_id).map_err(|e| map_scraper_error(request_id.clone(), &e))?;

    let country = params
        .country
        .unwrap_or_else(|| state.config.default_country.clone());
    let limit = normalize_limit(params.limit, state.config.default_review_limit);

    let raw = state
        .feed
        .fetch(&app_id, &country, limit)
        .await
        .map_err(|e| map_scraper_error(request_id.clone(), &e))?;
    let raw_count = raw.len();

    let raw_doc = json!({
        "app_id": app_id,
        "country": country,
        "fetched_at": Utc::now(),
        "reviews": &raw,
    });
    upsert_document(&state.pool, Collection::RawReviews, &app_id, &raw_doc)
        .await
        .map_err(|e| map_db_error(request_id.clone(), &e))?;

    let options = PipelineOptions::from_config(&state.config);
    let ranker = KeywordRanker::from_config(state.config.embeddings_url.as_deref());
    let run = run_analysis(LexiconModel::new(), &ranker, raw, &options).await;

    let processed_doc = json!({
        "app_id": app_id,
        "processed_at": Utc::now(),
        "reviews": &run.processed,
    });
    upsert_document(&state.pool, Collection::ProcessedReviews, &app_id, &processed_doc)
        .await
        .map_err(|e| map_db_error(request_id.clone(), &e))?;

    let AppReport { metrics, insights } = run.report;

    let metrics_doc =
        serde_json::to_value(&metrics).map_err(|e| internal(request_id.clone(), &e))?;
    upsert_document(&state.pool, Collection::Metrics, &app_id, &metrics_doc)
        .await
        .map_err(|e| map_db_error(request_id.clone(), &e))?;

    let insights_doc =
        serde_json::to_value(&insights).map_err(|e| internal(request_id.clone(), &e))?;
    upsert_document(&state.pool, Collection::Insights, &app_id, &insights_doc)
        .await
        .map_err(|e| map_db_error(request_id.clone(), &e))?;

    tracing::info!(
        app_id,
        raw = raw_count,
        processed = run.processed.len(),
        "collection run persisted"
    );

    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: CollectData {
                raw_reviews_count: raw_count,
                processed_reviews_count: run.processed.len(),
                metrics,
                insights,
            },
            meta: ResponseMeta::new(request_id),
        }),
    ))
}

/// `GET /api/v1/reviews/{app_id}/raw` — the stored raw-review document,
/// with its review list truncated to `limit` (clamped the same way as
/// collection).
pub(super) async fn get_raw_reviews(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(app_id): Path<String>,
    Query(params): Query<RawParams>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = req_id.0;
    validate_app_id(&app_id).map_err(|e| map_scraper_error(request_id.clone(), &e))?;

    let row = require_document(&state.pool, Collection::RawReviews, &app_id)
        .await
        .map_err(|e| map_db_error(request_id.clone(), &e))?;

    let limit = normalize_limit(params.limit, state.config.default_review_limit);
    let mut document = row.document;
    if let Some(reviews) = document.get_mut("reviews").and_then(Value::as_array_mut) {
        reviews.truncate(limit);
    }

    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: document,
            meta: ResponseMeta::new(request_id),
        }),
    ))
}

/// `GET /api/v1/reviews/{app_id}/report` — the stored metrics and insights.
///
/// Metrics are required; a run always writes both, but insights degrade to
/// `null` rather than hiding an otherwise valid report.
pub(super) async fn get_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(app_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = req_id.0;
    validate_app_id(&app_id).map_err(|e| map_scraper_error(request_id.clone(), &e))?;

    let metrics = require_document(&state.pool, Collection::Metrics, &app_id)
        .await
        .map_err(|e| map_db_error(request_id.clone(), &e))?;
    let insights = find_document(&state.pool, Collection::Insights, &app_id)
        .await
        .map_err(|e| map_db_error(request_id.clone(), &e))?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: ReportData {
                metrics: metrics.document,
                insights: insights.map_or(Value::Null, |row| row.document),
            },
            meta: ResponseMeta::new(request_id),
        }),
    ))
}

fn internal(request_id: String, error: &serde_json::Error) -> ApiError {
    tracing::error!(error = %error, "report serialization failed");
    ApiError::new(request_id, "internal_error", "report serialization failed")
}
