//! Record ingestion, lookup, listing and maintenance endpoints.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use emogo_core::{EmogoError, FieldError, Record, RecordId, RecordQuery, RecordSubmission};

use super::{record_query, ApiResult, ErrorResponse, ValidationErrorResponse};
use crate::record_store::RecordStore;
use crate::state::AppState;
use crate::{export, ingest};

// ── Response types ───────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RecordListResponse {
    pub records: Vec<Record>,
    /// Records on this page.
    pub count: usize,
    /// Records matching the filters, ignoring pagination.
    pub total: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DeleteResponse {
    pub status: &'static str,
    #[schema(value_type = String)]
    pub deleted: Uuid,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CleanupResponse {
    pub status: &'static str,
    pub deleted_count: u64,
}

fn parse_id(raw: &str) -> Result<RecordId, EmogoError> {
    Uuid::parse_str(raw.trim()).map_err(|_| EmogoError::InvalidId(raw.to_string()))
}

// ── Handlers ─────────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/record",
    tag = "Records",
    request_body = RecordSubmission,
    responses(
        (status = 201, description = "Record created", body = Record),
        (status = 400, description = "Validation failed", body = ValidationErrorResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RecordSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let Json(submission) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected record body");
        EmogoError::Validation(vec![FieldError::new("body", rejection.body_text())])
    })?;

    let record = ingest::submit(state.records.as_ref(), &state.ingest, submission).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/records",
    tag = "Records",
    params(RecordQuery),
    responses(
        (status = 200, description = "Records, newest first", body = RecordListResponse),
        (status = 400, description = "Invalid query parameters", body = ValidationErrorResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RecordQuery>, QueryRejection>,
) -> ApiResult<Json<RecordListResponse>> {
    let filter = record_query(query)?.resolve()?;
    let listing = export::listing(state.records.as_ref(), &filter).await?;
    Ok(Json(RecordListResponse {
        count: listing.records.len(),
        total: listing.total,
        records: listing.records,
    }))
}

#[utoipa::path(
    get,
    path = "/record/{id}",
    tag = "Records",
    params(
        ("id" = String, Path, description = "Record UUID")
    ),
    responses(
        (status = 200, description = "Record", body = Record),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Record>> {
    let id = parse_id(&id)?;
    match state.records.get(id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(EmogoError::NotFound(format!("record {id}")).into()),
    }
}

#[utoipa::path(
    delete,
    path = "/record/{id}",
    tag = "Records",
    params(
        ("id" = String, Path, description = "Record UUID")
    ),
    responses(
        (status = 200, description = "Record deleted", body = DeleteResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = parse_id(&id)?;
    if !state.records.delete(id).await? {
        return Err(EmogoError::NotFound(format!("record {id}")).into());
    }
    info!(%id, "Deleted record");
    Ok(Json(DeleteResponse { status: "success", deleted: id }))
}

/// Remove every record that has no vlog reference.
#[utoipa::path(
    delete,
    path = "/records/cleanup",
    tag = "Maintenance",
    responses(
        (status = 200, description = "Cleanup finished", body = CleanupResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn cleanup_records(State(state): State<Arc<AppState>>) -> ApiResult<Json<CleanupResponse>> {
    let deleted_count = state.records.delete_without_vlog().await?;
    info!(deleted_count, "Cleaned up records without vlog");
    Ok(Json(CleanupResponse { status: "success", deleted_count }))
}
