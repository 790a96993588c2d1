//! HTTP endpoint modules.
//!
//! Each sub-module owns one area of the route table. The shared error
//! response types and the 404 fallback live here.

pub mod doc;
mod export;
mod health;
mod media;
mod records;

#[cfg(test)]
mod tests;

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use emogo_core::{EmogoError, FieldError, RecordQuery};
use emogo_storage::StorageError;

use crate::record_store::StoreError;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// 400 body for rejected submissions and query parameters.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub fields: Vec<FieldError>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct NotFoundResponse {
    pub error: String,
    pub path: String,
}

/// Handler error: an [`EmogoError`] rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError(pub EmogoError);

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match self.0 {
            EmogoError::Validation(fields) => (
                status,
                Json(ValidationErrorResponse {
                    error: "validation failed".to_string(),
                    fields,
                }),
            )
                .into_response(),
            other => (status, Json(ErrorResponse { error: other.to_string() })).into_response(),
        }
    }
}

impl From<EmogoError> for ApiError {
    fn from(e: EmogoError) -> Self {
        Self(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e.into())
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self(e.into())
    }
}

/// Unwrap the listing filters, turning a malformed query string into a
/// JSON validation error instead of axum's plain-text rejection.
pub(crate) fn record_query(query: Result<Query<RecordQuery>, QueryRejection>) -> Result<RecordQuery, EmogoError> {
    match query {
        Ok(Query(query)) => Ok(query),
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected query string");
            Err(EmogoError::Validation(vec![FieldError::new("query", rejection.body_text())]))
        }
    }
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            error: "Not found".to_string(),
            path: uri.path().to_string(),
        }),
    )
}

// ── Re-exports ───────────────────────────────────────────────────
// Flat `api::foo` paths for route registration in router.rs.

pub use export::{dashboard, export_csv, export_json};
pub use health::{health, root};
pub use media::{download_vlog, upload_vlog};
pub use records::{cleanup_records, create_record, delete_record, get_record, list_records};
