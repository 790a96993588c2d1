//! HTTP router construction.
//!
//! Assembles the routes, middleware and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use emogo_core::config::ServerConfig;

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let app = Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health))
        .route("/record", post(api::create_record))
        .route("/records", get(api::list_records))
        // /records/cleanup is a literal path, so it never collides with /record/{id}
        .route("/records/cleanup", delete(api::cleanup_records))
        .route("/record/{id}", get(api::get_record).delete(api::delete_record))
        .route("/export", get(api::dashboard))
        .route("/export/records.csv", get(api::export_csv))
        .route("/export/records.json", get(api::export_json))
        .route(
            "/videos",
            post(api::upload_vlog).layer(DefaultBodyLimit::max(server.max_upload_bytes())),
        )
        .route("/videos/{*name}", get(api::download_vlog))
        .route("/openapi.json", get(api::doc::openapi_json))
        .fallback(api::not_found);

    app.layer(cors_layer(&server.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}

/// `*` (the default) allows any origin; anything else is a single allowed origin.
fn cors_layer(origin: &str) -> CorsLayer {
    if origin.trim() == "*" {
        return CorsLayer::permissive();
    }
    match HeaderValue::from_str(origin.trim()) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!(origin, error = %e, "Invalid CORS_ORIGIN, falling back to permissive CORS");
            CorsLayer::permissive()
        }
    }
}
