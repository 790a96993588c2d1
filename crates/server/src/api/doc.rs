//! OpenAPI documentation aggregator.
//!
//! Collects the `#[utoipa::path]`-annotated handlers and `ToSchema` types
//! into one OpenAPI 3.1 document, served raw at `/openapi.json` and through
//! the Scalar UI at `/docs`.

use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "EmoGo Backend API",
        version = "0.1.0",
        description = "Collects vlog, sentiment and GPS records from the EmoGo app and exports them for review.",
    ),
    tags(
        (name = "Health", description = "Service banner and store connectivity"),
        (name = "Records", description = "Record submission, lookup, listing and removal"),
        (name = "Maintenance", description = "Bulk cleanup of incomplete records"),
        (name = "Export", description = "Admin dashboard and CSV/JSON downloads"),
        (name = "Media", description = "Vlog upload and download"),
    ),
    paths(
        // Health
        crate::api::health::root,
        crate::api::health::health,
        // Records
        crate::api::records::create_record,
        crate::api::records::list_records,
        crate::api::records::get_record,
        crate::api::records::delete_record,
        crate::api::records::cleanup_records,
        // Export
        crate::api::export::dashboard,
        crate::api::export::export_csv,
        crate::api::export::export_json,
        // Media
        crate::api::media::upload_vlog,
        crate::api::media::download_vlog,
    ),
    components(schemas(
        emogo_core::Record,
        emogo_core::RecordSubmission,
        emogo_core::FieldError,
        crate::api::ErrorResponse,
        crate::api::ValidationErrorResponse,
        crate::api::NotFoundResponse,
        crate::api::health::RootResponse,
        crate::api::health::HealthResponse,
        crate::api::records::RecordListResponse,
        crate::api::records::DeleteResponse,
        crate::api::records::CleanupResponse,
        crate::api::media::UploadForm,
        crate::api::media::UploadResponse,
    ))
)]
pub struct ApiDoc;

/// Machine-readable OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
