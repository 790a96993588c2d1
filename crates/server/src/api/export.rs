//! Admin dashboard and bulk downloads.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;
use tracing::{error, info};

use emogo_core::{EmogoError, RecordQuery};

use super::{record_query, ApiResult, ErrorResponse, ValidationErrorResponse};
use crate::dashboard::render_dashboard;
use crate::export::{self, ExportFormat};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/export",
    tag = "Export",
    params(RecordQuery),
    responses(
        (status = 200, description = "HTML dashboard", content_type = "text/html"),
        (status = 400, description = "Invalid filters", body = ValidationErrorResponse),
        (status = 500, description = "Store unavailable or render failure", body = ErrorResponse)
    )
)]
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RecordQuery>, QueryRejection>,
) -> ApiResult<Html<String>> {
    let query = record_query(query)?;
    let filter = query.resolve()?;
    let summary = export::summary(state.records.as_ref()).await?;
    let listing = export::listing(state.records.as_ref(), &filter).await?;

    let html = render_dashboard(&summary, &listing, &query, Utc::now()).map_err(|e| {
        error!(error = %e, "Dashboard render failed");
        EmogoError::Internal(format!("dashboard render failed: {e}"))
    })?;
    Ok(Html(html))
}

#[utoipa::path(
    get,
    path = "/export/records.csv",
    tag = "Export",
    params(RecordQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 400, description = "Invalid filters", body = ValidationErrorResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RecordQuery>, QueryRejection>,
) -> ApiResult<Response> {
    download(&state, &record_query(query)?, ExportFormat::Csv).await
}

#[utoipa::path(
    get,
    path = "/export/records.json",
    tag = "Export",
    params(RecordQuery),
    responses(
        (status = 200, description = "JSON attachment", content_type = "application/json"),
        (status = 400, description = "Invalid filters", body = ValidationErrorResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn export_json(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RecordQuery>, QueryRejection>,
) -> ApiResult<Response> {
    download(&state, &record_query(query)?, ExportFormat::Json).await
}

async fn download(state: &AppState, query: &RecordQuery, format: ExportFormat) -> ApiResult<Response> {
    let filter = query.resolve_unbounded()?;
    let listing = export::listing(state.records.as_ref(), &filter).await?;
    let now = Utc::now();

    let body = export::render(format, &listing.records, now).map_err(|e| {
        error!(error = %e, "Export serialization failed");
        EmogoError::Internal(format!("export failed: {e}"))
    })?;
    let file_name = export::file_name(format, now);
    info!(format = format.extension(), count = listing.records.len(), "Exported records");

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        body,
    )
        .into_response())
}
