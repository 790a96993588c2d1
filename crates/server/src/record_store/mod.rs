//! Document store client for mood records.
//!
//! [`RecordStore`] is the seam between the HTTP services and persistence.
//! The store is the single source of truth and serialises its own writes,
//! so handlers share it through an `Arc<dyn RecordStore>` without extra
//! locking.

mod error;
mod memory;
mod pg;

use async_trait::async_trait;

use emogo_core::{Record, RecordFilter, RecordId};

pub use error::StoreError;
pub use memory::MemoryRecordStore;
pub use pg::PgRecordStore;

/// Number of records per mood, most common first.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MoodCount {
    pub mood: String,
    pub count: u64,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a record. Returns the record as stored.
    async fn insert(&self, record: Record) -> Result<Record, StoreError>;

    /// Matching records, newest first, with the filter's pagination applied.
    async fn list(&self, filter: &RecordFilter) -> Result<Vec<Record>, StoreError>;

    /// Number of matching records, ignoring pagination.
    async fn count(&self, filter: &RecordFilter) -> Result<u64, StoreError>;

    async fn get(&self, id: RecordId) -> Result<Option<Record>, StoreError>;

    /// Returns `false` if no record had this id.
    async fn delete(&self, id: RecordId) -> Result<bool, StoreError>;

    /// Remove every record without a vlog reference. Returns the number removed.
    async fn delete_without_vlog(&self) -> Result<u64, StoreError>;

    async fn mood_counts(&self) -> Result<Vec<MoodCount>, StoreError>;

    /// Connectivity probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}
