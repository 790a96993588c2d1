//! Vlog media storage.
//!
//! [`MediaStore`] keeps uploaded vlog files in an `object_store` backend:
//! a local directory by default, or an S3 bucket when `S3_BUCKET` is set.
//! Media names are flat file names; anything that could escape the media
//! root is rejected before it reaches the backend.

pub mod backend;
pub mod error;

use std::path::Path;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path as ObjectPath;
use object_store::PutPayload;
use tracing::info;

use emogo_core::config::MediaConfig;

pub use backend::{LocalBackend, S3Backend, StorageBackend};
pub use error::StorageError;

/// A media object opened for download.
pub struct MediaObject {
    pub name: String,
    pub size: usize,
    pub content_type: &'static str,
    pub stream: BoxStream<'static, Result<Bytes, StorageError>>,
}

/// Config-driven vlog store.
pub struct MediaStore {
    backend: StorageBackend,
}

impl MediaStore {
    /// Select local or S3 based on the media config.
    pub fn from_config(config: &MediaConfig) -> Result<Self, StorageError> {
        let backend = if config.is_remote() {
            StorageBackend::S3(S3Backend::new(config)?)
        } else {
            StorageBackend::Local(LocalBackend::new(&config.dir)?)
        };
        Ok(Self { backend })
    }

    pub fn local(dir: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            backend: StorageBackend::Local(LocalBackend::new(dir)?),
        })
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    fn object_path(&self, name: &str) -> Result<ObjectPath, StorageError> {
        validate_name(name)?;
        let prefix = self.backend.prefix();
        let key = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", prefix, name)
        };
        Ok(ObjectPath::from(key))
    }

    /// Store a media file under `name`, replacing any existing object.
    pub async fn put(&self, name: &str, data: Bytes) -> Result<(), StorageError> {
        let path = self.object_path(name)?;
        let size = data.len();
        self.backend.store().put(&path, PutPayload::from(data)).await?;
        info!(media = name, size, "Stored vlog");
        Ok(())
    }

    /// Open a media file as a byte stream.
    pub async fn open(&self, name: &str) -> Result<MediaObject, StorageError> {
        let path = self.object_path(name)?;
        let result = self.backend.store().get(&path).await.map_err(|e| not_found(e, name))?;
        let size = result.meta.size;
        let stream = result.into_stream().map_err(StorageError::from).boxed();
        Ok(MediaObject {
            name: name.to_string(),
            size,
            content_type: content_type_for(name),
            stream,
        })
    }

    pub async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let path = self.object_path(name)?;
        match self.backend.store().head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.object_path(name)?;
        self.backend.store().delete(&path).await.map_err(|e| not_found(e, name))?;
        info!(media = name, "Deleted vlog");
        Ok(())
    }
}

fn not_found(e: object_store::Error, name: &str) -> StorageError {
    match e {
        object_store::Error::NotFound { .. } => StorageError::NotFound(name.to_string()),
        other => StorageError::ObjectStore(other),
    }
}

/// Reject names that are empty, nested, hidden, or contain traversal.
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    let bad = name.is_empty()
        || name.len() > 255
        || name.starts_with('.')
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.chars().any(|c| c.is_control());
    if bad {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Generate a unique stored name, keeping the uploaded file's extension.
pub fn generate_name(original: Option<&str>) -> String {
    let ext = original
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "mp4".to_string());
    format!("{}.{}", uuid::Uuid::new_v4(), ext)
}

/// MIME type from the file extension.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("3gp") => "video/3gpp",
        _ => "application/octet-stream",
    }
}
