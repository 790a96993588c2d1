use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use emogo_core::config::{IngestConfig, ServerConfig};
use emogo_core::{Record, RecordFilter, RecordId};
use emogo_storage::MediaStore;

use crate::record_store::{MemoryRecordStore, MoodCount, RecordStore, StoreError};
use crate::router::build_router;
use crate::state::AppState;

// ── Harness ──────────────────────────────────────────────────────

/// Store whose every call fails, as if the database were unreachable.
struct FailingStore;

fn down() -> StoreError {
    StoreError::Unavailable("connection refused".into())
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn insert(&self, _record: Record) -> Result<Record, StoreError> {
        Err(down())
    }
    async fn list(&self, _filter: &RecordFilter) -> Result<Vec<Record>, StoreError> {
        Err(down())
    }
    async fn count(&self, _filter: &RecordFilter) -> Result<u64, StoreError> {
        Err(down())
    }
    async fn get(&self, _id: RecordId) -> Result<Option<Record>, StoreError> {
        Err(down())
    }
    async fn delete(&self, _id: RecordId) -> Result<bool, StoreError> {
        Err(down())
    }
    async fn delete_without_vlog(&self) -> Result<u64, StoreError> {
        Err(down())
    }
    async fn mood_counts(&self) -> Result<Vec<MoodCount>, StoreError> {
        Err(down())
    }
    async fn ping(&self) -> Result<(), StoreError> {
        Err(down())
    }
    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

struct TestApp {
    router: Router,
    _media_dir: TempDir,
}

fn server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origin: "*".into(),
        max_upload_mb: 1,
    }
}

fn app_with(records: Arc<dyn RecordStore>) -> TestApp {
    let media_dir = TempDir::new().unwrap();
    let state = Arc::new(AppState {
        records,
        media: Arc::new(MediaStore::local(media_dir.path()).unwrap()),
        ingest: IngestConfig::default(),
    });
    TestApp {
        router: build_router(state, &server_config()),
        _media_dir: media_dir,
    }
}

fn app() -> TestApp {
    app_with(Arc::new(MemoryRecordStore::new()))
}

struct TestResponse {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }

    fn header(&self, name: header::HeaderName) -> &str {
        self.headers.get(name).unwrap().to_str().unwrap()
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        TestResponse { status, headers, body }
    }

    async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Request::delete(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.post_raw(uri, body.to_string()).await
    }

    async fn post_raw(&self, uri: &str, body: String) -> TestResponse {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn listed_ids(&self) -> Vec<String> {
        let listing = self.get("/export/records.json").await;
        assert_eq!(listing.status, StatusCode::OK);
        listing.json()["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect()
    }
}

fn multipart_request(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let boundary = "emogo-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n").as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: video/mp4\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post("/videos")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

// ── Health ───────────────────────────────────────────────────────

#[tokio::test]
async fn root_reports_live() {
    let app = app();
    let res = app.get("/").await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["message"], "EmoGo Backend is Live!");
    assert_eq!(body["status"], "operational");
}

#[tokio::test]
async fn health_reflects_store_connectivity() {
    let healthy = app().get("/health").await;
    assert_eq!(healthy.status, StatusCode::OK);
    assert_eq!(healthy.json()["store"], "memory");

    let degraded = app_with(Arc::new(FailingStore)).get("/health").await;
    assert_eq!(degraded.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(degraded.json()["status"], "degraded");
}

// ── Ingestion ────────────────────────────────────────────────────

#[tokio::test]
async fn valid_submission_appears_in_export_exactly_once() {
    let app = app();
    let res = app
        .post_json("/record", json!({"sentiment": "happy", "lat": 12.9, "lon": 77.6, "vlog": "v1"}))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let created = res.json();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["mood"], "happy");

    let listing = app.get("/export/records.json").await.json();
    let matches: Vec<&Value> = listing["records"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["id"] == id.as_str())
        .collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["latitude"], 12.9);
    assert_eq!(matches[0]["longitude"], 77.6);
    assert_eq!(matches[0]["vlog"], "v1");
}

#[tokio::test]
async fn out_of_range_latitude_is_rejected_and_export_unchanged() {
    let app = app();
    let before = app.listed_ids().await;

    let res = app.post_json("/record", json!({"sentiment": "happy", "lat": 999, "lon": 77.6})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    assert_eq!(body["error"], "validation failed");
    assert!(body["fields"].as_array().unwrap().iter().any(|f| f["field"] == "latitude"));

    assert_eq!(app.listed_ids().await, before);
}

#[tokio::test]
async fn out_of_range_longitude_is_rejected() {
    let res = app().post_json("/record", json!({"mood": "calm", "latitude": 10.0, "longitude": -181.0})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()["fields"].as_array().unwrap().iter().any(|f| f["field"] == "longitude"));
}

#[tokio::test]
async fn missing_mood_is_rejected_and_nothing_written() {
    let app = app();
    let res = app.post_json("/record", json!({"latitude": 10.0, "longitude": 20.0})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()["fields"].as_array().unwrap().iter().any(|f| f["field"] == "mood"));
    assert!(app.listed_ids().await.is_empty());
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let app = app();
    let res = app.post_raw("/record", "{not json".into()).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["fields"][0]["field"], "body");

    let wrong_type = app.post_json("/record", json!({"mood": "happy", "latitude": "north", "longitude": 1.0})).await;
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_failure_on_submit_is_500() {
    let res = app_with(Arc::new(FailingStore))
        .post_json("/record", json!({"mood": "happy", "latitude": 1.0, "longitude": 2.0}))
        .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.json()["error"].as_str().unwrap().contains("connection refused"));
}

// ── Listing & lookup ─────────────────────────────────────────────

#[tokio::test]
async fn repeated_exports_are_identical() {
    let app = app();
    for mood in ["happy", "sad", "calm"] {
        let res = app.post_json("/record", json!({"mood": mood, "latitude": 1.0, "longitude": 2.0})).await;
        assert_eq!(res.status, StatusCode::CREATED);
    }
    let first = app.listed_ids().await;
    let second = app.listed_ids().await;
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let app = app();
    for mood in ["happy", "happy", "happy", "sad"] {
        app.post_json("/record", json!({"mood": mood, "latitude": 1.0, "longitude": 2.0})).await;
    }

    let page = app.get("/records?mood=happy&limit=2").await;
    assert_eq!(page.status, StatusCode::OK);
    let body = page.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["total"], 3);

    let bad = app.get("/records?since=yesterday").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.json()["fields"][0]["field"], "since");
}

#[tokio::test]
async fn malformed_query_string_is_a_json_validation_error() {
    let app = app();
    for uri in [
        "/records?limit=abc",
        "/export?skip=-1",
        "/export/records.csv?has_vlog=maybe",
        "/export/records.json?limit=ten",
    ] {
        let res = app.get(uri).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(res.header(header::CONTENT_TYPE).starts_with("application/json"), "{uri}");
        assert_eq!(res.json()["fields"][0]["field"], "query", "{uri}");
    }
}

#[tokio::test]
async fn date_only_until_includes_records_from_that_day() {
    let app = app();
    let created = app.post_json("/record", json!({"mood": "happy", "latitude": 1.0, "longitude": 2.0})).await;
    let created_at: chrono::DateTime<chrono::Utc> = created.json()["created_at"].as_str().unwrap().parse().unwrap();
    let today = created_at.date_naive();

    let res = app.get(&format!("/records?until={today}")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["total"], 1);

    let yesterday = today.pred_opt().unwrap();
    let res = app.get(&format!("/records?until={yesterday}")).await;
    assert_eq!(res.json()["total"], 0);
}

#[tokio::test]
async fn store_failure_on_export_is_500_not_empty() {
    let app = app_with(Arc::new(FailingStore));
    for uri in ["/records", "/export", "/export/records.csv", "/export/records.json"] {
        let res = app.get(uri).await;
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
    }
}

#[tokio::test]
async fn record_lookup_by_id() {
    let app = app();
    let created = app.post_json("/record", json!({"mood": "happy", "latitude": 1.0, "longitude": 2.0})).await.json();
    let id = created["id"].as_str().unwrap();

    let found = app.get(&format!("/record/{id}")).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.json()["mood"], "happy");

    assert_eq!(app.get("/record/not-a-uuid").await.status, StatusCode::BAD_REQUEST);
    let missing = app.get("/record/00000000-0000-0000-0000-000000000001").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_record() {
    let app = app();
    let created = app.post_json("/record", json!({"mood": "happy", "latitude": 1.0, "longitude": 2.0})).await.json();
    let uri = format!("/record/{}", created["id"].as_str().unwrap());

    let res = app.delete(&uri).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["status"], "success");
    assert_eq!(app.get(&uri).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&uri).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cleanup_removes_only_records_without_vlog() {
    let app = app();
    let kept = app
        .post_json("/record", json!({"mood": "happy", "latitude": 1.0, "longitude": 2.0, "vlog_file": "a.mp4"}))
        .await
        .json();
    app.post_json("/record", json!({"mood": "sad", "latitude": 1.0, "longitude": 2.0})).await;
    app.post_json("/record", json!({"mood": "calm", "latitude": 1.0, "longitude": 2.0})).await;

    let res = app.delete("/records/cleanup").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["deleted_count"], 2);
    assert_eq!(app.listed_ids().await, vec![kept["id"].as_str().unwrap().to_string()]);
}

// ── Export ───────────────────────────────────────────────────────

#[tokio::test]
async fn csv_download_is_an_escaped_attachment() {
    let app = app();
    app.post_json(
        "/record",
        json!({"mood": "happy", "latitude": 1.0, "longitude": 2.0, "note": "sun, \"wind\""}),
    )
    .await;

    let res = app.get("/export/records.csv").await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.header(header::CONTENT_TYPE).starts_with("text/csv"));
    assert!(res.header(header::CONTENT_DISPOSITION).starts_with("attachment; filename=\"emogo-records-"));

    let text = res.text();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("id,created_at,recorded_at,mood,latitude,longitude,vlog,note"));
    assert!(lines.next().unwrap().ends_with(",happy,1,2,,\"sun, \"\"wind\"\"\""));
}

#[tokio::test]
async fn dashboard_renders_records() {
    let app = app();
    app.post_json("/record", json!({"mood": "ecstatic", "latitude": 1.0, "longitude": 2.0, "vlog": "a.mp4"}))
        .await;

    let res = app.get("/export?mood=ecstatic").await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.header(header::CONTENT_TYPE).starts_with("text/html"));
    let html = res.text();
    assert!(html.contains("ecstatic"));
    assert!(html.contains("records.csv?mood=ecstatic"));
    assert!(html.contains("href=\"?mood=ecstatic\""));

    app.post_json("/record", json!({"mood": "very happy", "latitude": 1.0, "longitude": 2.0})).await;
    let res = app.get("/export").await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.text().contains("href=\"?mood=very%20happy\""));

    assert_eq!(app.get("/export?since=2025-13-40").await.status, StatusCode::BAD_REQUEST);
}

// ── Docs & fallback ──────────────────────────────────────────────

#[tokio::test]
async fn openapi_documents_record_and_export() {
    let res = app().get("/openapi.json").await;
    assert_eq!(res.status, StatusCode::OK);
    let paths = &res.json()["paths"];
    assert!(paths.get("/record").is_some());
    assert!(paths.get("/export").is_some());
    assert!(paths.get("/record/{id}").is_some());

    let id = &res.json()["components"]["schemas"]["Record"]["properties"]["id"];
    assert_eq!(id["type"], "string");
    assert_eq!(id["format"], "uuid");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let res = app().get("/nope").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let body = res.json();
    assert_eq!(body["error"], "Not found");
    assert_eq!(body["path"], "/nope");
}

// ── Media ────────────────────────────────────────────────────────

#[tokio::test]
async fn uploaded_vlog_can_be_downloaded() {
    let app = app();
    let res = app.send(multipart_request("file", "clip.MP4", b"fake video bytes")).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let body = res.json();
    let name = body["vlog"].as_str().unwrap().to_string();
    assert!(name.ends_with(".mp4"));
    assert_eq!(body["url"], format!("/videos/{name}"));

    let inline = app.get(&format!("/videos/{name}")).await;
    assert_eq!(inline.status, StatusCode::OK);
    assert_eq!(inline.header(header::CONTENT_TYPE), "video/mp4");
    assert!(inline.header(header::CONTENT_DISPOSITION).starts_with("inline"));
    assert_eq!(inline.body, b"fake video bytes");

    let attachment = app.get(&format!("/videos/{name}?download=1")).await;
    assert!(attachment.header(header::CONTENT_DISPOSITION).starts_with("attachment"));
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let res = app().send(multipart_request("other", "clip.mp4", b"bytes")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["fields"][0]["field"], "file");
}

#[tokio::test]
async fn missing_or_unsafe_media_names() {
    let app = app();
    assert_eq!(app.get("/videos/missing.mp4").await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/videos/..%2Fsecret.mp4").await.status, StatusCode::BAD_REQUEST);
}
