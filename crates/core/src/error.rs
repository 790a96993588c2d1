use thiserror::Error;

use crate::validation::FieldError;

#[derive(Error, Debug)]
pub enum EmogoError {
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("Invalid record ID format: {0}")]
    InvalidId(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// A response could not be produced from data that was read fine.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EmogoError {
    /// HTTP status code this error surfaces as.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::InvalidId(_) => 400,
            Self::NotFound(_) => 404,
            Self::PayloadTooLarge(_) => 413,
            Self::StorageUnavailable(_) | Self::Media(_) | Self::Internal(_) => 500,
        }
    }
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}
