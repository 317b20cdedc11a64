mod reviews;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use appvox_core::AppConfig;
use appvox_scraper::{ReviewFeedClient, ScraperError};

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub feed: Arc<ReviewFeedClient>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "invalid_app_id" | "bad_request" => StatusCode::BAD_REQUEST,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, 500)
}

/// A missing document is the caller's problem; anything else means the
/// database let us down.
pub(super) fn map_db_error(request_id: String, error: &appvox_db::DbError) -> ApiError {
    if error.is_not_found() {
        return ApiError::new(request_id, "not_found", "no data stored for this app");
    }
    tracing::error!(error = %error, "database query failed");
    if is_connectivity(error) {
        ApiError::new(request_id, "unavailable", "database is unavailable")
    } else {
        ApiError::new(request_id, "internal_error", "database query failed")
    }
}

fn is_connectivity(error: &appvox_db::DbError) -> bool {
    match error {
        appvox_db::DbError::Sqlx(e) => matches!(
            e,
            sqlx::Error::Io(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::Tls(_)
        ),
        _ => false,
    }
}

pub(super) fn map_scraper_error(request_id: String, error: &ScraperError) -> ApiError {
    match error {
        ScraperError::InvalidAppId { app_id } => ApiError::new(
            request_id,
            "invalid_app_id",
            format!("invalid app id \"{app_id}\": must be a non-empty string of digits"),
        ),
        ScraperError::Http(_) | ScraperError::Deserialize { .. } => {
            tracing::error!(error = %error, "review feed fetch failed");
            ApiError::new(request_id, "unavailable", "review feed is unavailable")
        }
        ScraperError::InvalidBaseUrl { .. } => {
            tracing::error!(error = %error, "review feed misconfigured");
            ApiError::new(request_id, "internal_error", "review feed misconfigured")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/reviews/{app_id}", post(reviews::collect_reviews))
        .route("/api/v1/reviews/{app_id}/raw", get(reviews::get_raw_reviews))
        .route("/api/v1/reviews/{app_id}/report", get(reviews::get_report))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match appvox_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None, 100), 100);
        assert_eq!(normalize_limit(Some(0), 100), 1);
        assert_eq!(normalize_limit(Some(10_000), 100), 500);
        assert_eq!(normalize_limit(Some(25), 100), 25);
    }

    #[test]
    fn api_error_invalid_app_id_maps_to_bad_request() {
        let response = ApiError::new("req-1", "invalid_app_id", "bad id").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_not_found_maps_to_404() {
        let response = ApiError::new("req-1", "not_found", "nothing here").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_error_unavailable_maps_to_503() {
        let response = ApiError::new("req-1", "unavailable", "db down").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn api_error_unknown_code_maps_to_500() {
        let response = ApiError::new("req-1", "internal_error", "boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_db_error_maps_to_not_found_code() {
        let err = map_db_error("req-1".to_owned(), &appvox_db::DbError::NotFound);
        assert_eq!(err.error.code, "not_found");
    }

    #[test]
    fn pool_timeout_maps_to_unavailable() {
        let err = map_db_error(
            "req-1".to_owned(),
            &appvox_db::DbError::from(sqlx::Error::PoolTimedOut),
        );
        assert_eq!(err.error.code, "unavailable");
    }

    #[test]
    fn invalid_app_id_scraper_error_maps_to_code() {
        let err = map_scraper_error(
            "req-1".to_owned(),
            &ScraperError::InvalidAppId {
                app_id: "abc".to_owned(),
            },
        );
        assert_eq!(err.error.code, "invalid_app_id");
    }
}
