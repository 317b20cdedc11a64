//! Per-app JSONB document storage.
//!
//! Each pipeline stage persists one document per app: the raw feed batch,
//! the processed batch, computed metrics, and the composed insights report.
//! Re-collecting an app replaces its documents wholesale, so every table
//! keys on `app_id` alone.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// The four document collections, one table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    RawReviews,
    ProcessedReviews,
    Metrics,
    Insights,
}

impl Collection {
    /// Table name backing this collection. Static strings only; `sqlx`
    /// cannot bind identifiers, so these are interpolated into the SQL.
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::RawReviews => "raw_review_docs",
            Self::ProcessedReviews => "processed_review_docs",
            Self::Metrics => "metrics_docs",
            Self::Insights => "insights_docs",
        }
    }
}

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from one of the document tables.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub app_id: String,
    pub document: Value,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert or replace the document for an app in the given collection.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_document(
    pool: &PgPool,
    collection: Collection,
    app_id: &str,
    document: &Value,
) -> Result<(), DbError> {
    let sql = format!(
        "INSERT INTO {} (app_id, document, updated_at) \
         VALUES ($1, $2, NOW()) \
         ON CONFLICT (app_id) \
         DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()",
        collection.table()
    );

    sqlx::query(&sql)
        .bind(app_id)
        .bind(document)
        .execute(pool)
        .await?;

    tracing::debug!(app_id, collection = collection.table(), "document upserted");
    Ok(())
}

/// Fetch the document for an app from the given collection, or `None` if the
/// app has no document there.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_document(
    pool: &PgPool,
    collection: Collection,
    app_id: &str,
) -> Result<Option<DocumentRow>, DbError> {
    let sql = format!(
        "SELECT app_id, document, updated_at FROM {} WHERE app_id = $1",
        collection.table()
    );

    let row = sqlx::query_as::<_, DocumentRow>(&sql)
        .bind(app_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Fetch the document for an app, treating absence as [`DbError::NotFound`].
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the app has no document in the
/// collection, or [`DbError::Sqlx`] if the query fails.
pub async fn require_document(
    pool: &PgPool,
    collection: Collection,
    app_id: &str,
) -> Result<DocumentRow, DbError> {
    find_document(pool, collection, app_id)
        .await?
        .ok_or(DbError::NotFound)
}
