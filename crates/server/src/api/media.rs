//! Vlog upload and download.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use emogo_core::{EmogoError, FieldError};
use emogo_storage::generate_name;

use super::{ApiResult, ErrorResponse, ValidationErrorResponse};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    /// Stored name, to be sent as `vlog` in `POST /record`.
    pub vlog: String,
    pub url: String,
}

/// Multipart upload form, for the OpenAPI document only.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadQuery {
    /// Serve as an attachment instead of inline.
    pub download: Option<String>,
}

impl DownloadQuery {
    fn as_attachment(&self) -> bool {
        matches!(self.download.as_deref(), Some("1" | "true" | "yes" | ""))
    }
}

fn upload_error(message: impl Into<String>) -> EmogoError {
    EmogoError::Validation(vec![FieldError::new(FILE_FIELD, message)])
}

fn multipart_error(e: MultipartError) -> EmogoError {
    warn!(error = %e, "Multipart error");
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        EmogoError::PayloadTooLarge(e.body_text())
    } else {
        upload_error(e.body_text())
    }
}

#[utoipa::path(
    post,
    path = "/videos",
    tag = "Media",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "Vlog file in the `file` field"),
    responses(
        (status = 201, description = "Vlog stored", body = UploadResponse),
        (status = 400, description = "No file provided", body = ValidationErrorResponse),
        (status = 413, description = "Upload exceeds MAX_UPLOAD_MB", body = ErrorResponse),
        (status = 500, description = "Media store failure", body = ErrorResponse)
    )
)]
pub async fn upload_vlog(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    loop {
        let field = multipart.next_field().await.map_err(multipart_error)?;
        let Some(field) = field else {
            return Err(upload_error("no file provided").into());
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = generate_name(field.file_name());
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(upload_error("file is empty").into());
        }

        state.media.put(&name, bytes).await?;
        let url = format!("/videos/{name}");
        return Ok((StatusCode::CREATED, Json(UploadResponse { vlog: name, url })));
    }
}

#[utoipa::path(
    get,
    path = "/videos/{name}",
    tag = "Media",
    params(
        ("name" = String, Path, description = "Stored vlog name"),
        DownloadQuery
    ),
    responses(
        (status = 200, description = "Vlog bytes", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid name", body = ValidationErrorResponse),
        (status = 404, description = "Vlog not found", body = ErrorResponse),
        (status = 500, description = "Media store failure", body = ErrorResponse)
    )
)]
pub async fn download_vlog(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let object = state.media.open(&name).await?;
    let disposition = if query.as_attachment() { "attachment" } else { "inline" };

    Ok((
        [
            (header::CONTENT_TYPE, object.content_type.to_string()),
            (header::CONTENT_LENGTH, object.size.to_string()),
            (header::CONTENT_DISPOSITION, format!("{disposition}; filename=\"{}\"", object.name)),
        ],
        Body::from_stream(object.stream),
    )
        .into_response())
}
