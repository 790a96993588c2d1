use thiserror::Error;

use emogo_core::EmogoError;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("media not found: {0}")]
    NotFound(String),

    #[error("invalid media name: {0}")]
    InvalidName(String),

    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl From<StorageError> for EmogoError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(name) => EmogoError::NotFound(format!("vlog {name}")),
            StorageError::InvalidName(name) => EmogoError::Validation(vec![
                emogo_core::FieldError::new("name", format!("invalid media name '{name}'")),
            ]),
            other => EmogoError::Media(other.to_string()),
        }
    }
}
