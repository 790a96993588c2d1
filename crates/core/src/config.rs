use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Key lookup used to build a [`Config`]. Production reads the process
/// environment; tests pass a fixed map.
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled key: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_opt(lookup: Lookup<'_>, profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = lookup(&prefixed).filter(|s| !s.is_empty()) {
            return Some(v);
        }
    }
    lookup(key).filter(|s| !s.is_empty())
}

fn profiled_or(lookup: Lookup<'_>, profile: &str, key: &str, default: &str) -> String {
    profiled_opt(lookup, profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_parse<T: std::str::FromStr>(lookup: Lookup<'_>, profile: &str, key: &str, default: T) -> T {
    profiled_opt(lookup, profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_bool(lookup: Lookup<'_>, profile: &str, key: &str, default: bool) -> bool {
    match profiled_opt(lookup, profile, key).as_deref() {
        Some("1") | Some("true") | Some("TRUE") | Some("yes") => true,
        Some("0") | Some("false") | Some("FALSE") | Some("no") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub media: MediaConfig,
    pub ingest: IngestConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `EMOGO_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = process_env("EMOGO_PROFILE").unwrap_or_default();
        Self::from_lookup(&profile, &process_env)
    }

    /// Build config for a profile using an arbitrary key lookup.
    pub fn from_lookup(profile: &str, lookup: Lookup<'_>) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_lookup(lookup, p),
            store: StoreConfig::from_lookup(lookup, p),
            media: MediaConfig::from_lookup(lookup, p),
            ingest: IngestConfig::from_lookup(lookup, p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:  {}:{}, cors={}", self.server.host, self.server.port, self.server.cors_origin);
        tracing::info!(
            "  store:   backend={}, host={}, db={}",
            self.store.backend.as_str(),
            self.store.host,
            self.store.database
        );
        match &self.media.s3_bucket {
            Some(bucket) => tracing::info!("  media:   s3://{}/{}", bucket, self.media.s3_prefix.as_deref().unwrap_or("")),
            None => tracing::info!("  media:   dir={}", self.media.dir.display()),
        }
        tracing::info!("  ingest:  require_vlog={}", self.ingest.require_vlog);
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// Upper bound for a single vlog upload, in megabytes.
    pub max_upload_mb: usize,
}

impl ServerConfig {
    fn from_lookup(lookup: Lookup<'_>, p: &str) -> Self {
        Self {
            host: profiled_or(lookup, p, "HOST", "0.0.0.0"),
            port: profiled_parse(lookup, p, "PORT", 8000),
            cors_origin: profiled_or(lookup, p, "CORS_ORIGIN", "*"),
            max_upload_mb: profiled_parse(lookup, p, "MAX_UPLOAD_MB", 200),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

// ── Document store ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Full connection URL; takes precedence over the individual `PG_*` parts.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: String,
    pub max_connections: u32,
}

impl StoreConfig {
    fn from_lookup(lookup: Lookup<'_>, p: &str) -> Self {
        let backend = match profiled_or(lookup, p, "STORE_BACKEND", "postgres").to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            _ => StoreBackend::Postgres,
        };
        Self {
            backend,
            database_url: profiled_opt(lookup, p, "DATABASE_URL"),
            host: profiled_or(lookup, p, "PG_HOST", "localhost"),
            port: profiled_parse(lookup, p, "PG_PORT", 5432),
            database: profiled_or(lookup, p, "PG_DATABASE", "emogo"),
            username: profiled_opt(lookup, p, "PG_USERNAME"),
            password: profiled_opt(lookup, p, "PG_PASSWORD"),
            ssl_mode: profiled_or(lookup, p, "PG_SSL_MODE", "prefer"),
            max_connections: profiled_parse(lookup, p, "PG_MAX_CONNECTIONS", 10),
        }
    }

    pub fn connection_string(&self) -> String {
        if let Some(url) = &self.database_url {
            return url.clone();
        }
        let user = self.username.as_deref().unwrap_or("postgres");
        let pass = self.password.as_deref().unwrap_or("");
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            user, pass, self.host, self.port, self.database, self.ssl_mode
        )
    }

    pub fn is_configured(&self) -> bool {
        self.database_url.is_some() || self.username.is_some()
    }
}

// ── Vlog media ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Local directory for vlog files when no bucket is configured.
    pub dir: PathBuf,
    pub s3_bucket: Option<String>,
    pub s3_prefix: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub endpoint_url: Option<String>,
}

impl MediaConfig {
    fn from_lookup(lookup: Lookup<'_>, p: &str) -> Self {
        Self {
            dir: PathBuf::from(profiled_or(lookup, p, "MEDIA_DIR", "videos")),
            s3_bucket: profiled_opt(lookup, p, "S3_BUCKET"),
            s3_prefix: profiled_opt(lookup, p, "S3_PREFIX"),
            region: profiled_or(lookup, p, "AWS_REGION", "us-east-1"),
            access_key_id: profiled_opt(lookup, p, "AWS_ACCESS_KEY_ID"),
            secret_access_key: profiled_opt(lookup, p, "AWS_SECRET_ACCESS_KEY"),
            session_token: profiled_opt(lookup, p, "AWS_SESSION_TOKEN"),
            endpoint_url: profiled_opt(lookup, p, "AWS_ENDPOINT_URL"),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.s3_bucket.is_some()
    }
}

// ── Ingestion ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Reject submissions without a vlog reference.
    pub require_vlog: bool,
}

impl IngestConfig {
    fn from_lookup(lookup: Lookup<'_>, p: &str) -> Self {
        Self {
            require_vlog: profiled_bool(lookup, p, "REQUIRE_VLOG", false),
        }
    }
}
