//! Record ingestion: validate, stamp, persist.

use tracing::{error, info};

use emogo_core::config::IngestConfig;
use emogo_core::{validate_submission, EmogoError, Record, RecordSubmission};

use crate::record_store::RecordStore;

/// Validate a submission and persist it with a fresh id and server timestamp.
///
/// Validation failures never reach the store. A store failure is logged and
/// surfaced as [`EmogoError::StorageUnavailable`].
pub async fn submit(
    store: &dyn RecordStore,
    rules: &IngestConfig,
    submission: RecordSubmission,
) -> Result<Record, EmogoError> {
    let new = validate_submission(submission, rules)?;
    let record = Record::create(new);

    match store.insert(record).await {
        Ok(saved) => {
            info!(id = %saved.id, mood = %saved.mood, has_vlog = saved.has_vlog(), "Created record");
            Ok(saved)
        }
        Err(e) => {
            error!(error = %e, "Error creating record");
            Err(e.into())
        }
    }
}
