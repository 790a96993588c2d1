use std::path::PathBuf;
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::ObjectStore;
use tracing::info;

use emogo_core::config::MediaConfig;

use crate::error::StorageError;

/// Key prefix for vlog objects in a bucket when `S3_PREFIX` is unset.
const DEFAULT_S3_PREFIX: &str = "videos";

/// Unified media backend wrapping object_store.
pub enum StorageBackend {
    Local(LocalBackend),
    S3(S3Backend),
}

impl StorageBackend {
    /// Get the underlying ObjectStore.
    pub fn store(&self) -> &dyn ObjectStore {
        match self {
            StorageBackend::Local(b) => b.store.as_ref(),
            StorageBackend::S3(b) => b.store.as_ref(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, StorageBackend::S3(_))
    }

    /// Key prefix prepended to every media name.
    pub fn prefix(&self) -> &str {
        match self {
            StorageBackend::Local(_) => "",
            StorageBackend::S3(b) => &b.prefix,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            StorageBackend::Local(b) => format!("local:{}", b.media_dir.display()),
            StorageBackend::S3(b) => format!("s3://{}/{}", b.bucket, b.prefix),
        }
    }
}

/// Local filesystem backend rooted at the media directory.
pub struct LocalBackend {
    pub store: Arc<dyn ObjectStore>,
    pub media_dir: PathBuf,
}

impl LocalBackend {
    pub fn new(media_dir: &std::path::Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(media_dir)?;
        let canonical = std::fs::canonicalize(media_dir).unwrap_or_else(|_| media_dir.to_path_buf());
        let store = LocalFileSystem::new_with_prefix(&canonical)?;
        info!("Media: local backend at {}", canonical.display());
        Ok(Self {
            store: Arc::new(store),
            media_dir: canonical,
        })
    }
}

/// S3 backend.
pub struct S3Backend {
    pub store: Arc<dyn ObjectStore>,
    pub bucket: String,
    pub prefix: String,
}

impl S3Backend {
    pub fn new(media: &MediaConfig) -> Result<Self, StorageError> {
        let bucket = media
            .s3_bucket
            .as_deref()
            .ok_or_else(|| StorageError::NotConfigured("S3_BUCKET not set".into()))?;

        let mut builder = AmazonS3Builder::new().with_region(&media.region);

        if let Some(ref key) = media.access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(ref secret) = media.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(ref token) = media.session_token {
            builder = builder.with_token(token);
        }

        match media.endpoint_url.as_deref().filter(|e| !e.is_empty()) {
            Some(endpoint) => {
                // object_store requires absolute URLs
                let endpoint_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                    endpoint.to_string()
                } else {
                    format!("https://{}", endpoint)
                };
                builder = builder
                    .with_bucket_name(bucket)
                    .with_allow_http(endpoint_url.starts_with("http://"))
                    .with_endpoint(endpoint_url);
            }
            None => {
                builder = builder.with_url(format!("s3://{}", bucket));
            }
        }

        let store = builder.build()?;

        let prefix = media
            .s3_prefix
            .as_deref()
            .unwrap_or(DEFAULT_S3_PREFIX)
            .trim_matches('/')
            .to_string();

        info!(
            "Media: S3 backend s3://{}/{} (region: {})",
            bucket, prefix, media.region
        );

        Ok(Self {
            store: Arc::new(store),
            bucket: bucket.to_string(),
            prefix,
        })
    }
}
