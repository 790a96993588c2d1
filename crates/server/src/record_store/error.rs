use thiserror::Error;

use emogo_core::EmogoError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for EmogoError {
    fn from(e: StoreError) -> Self {
        EmogoError::StorageUnavailable(e.to_string())
    }
}
