use std::sync::Arc;

use emogo_core::config::IngestConfig;
use emogo_storage::MediaStore;

use crate::record_store::RecordStore;

/// Shared, read-only handler state. The stores own their own concurrency.
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub media: Arc<MediaStore>,
    pub ingest: IngestConfig,
}
