use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use emogo_core::{listing_order, Record, RecordFilter, RecordId};

use super::{MoodCount, RecordStore, StoreError};

/// Process-local store for development (`STORE_BACKEND=memory`) and tests.
/// Contents are lost on restart.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: Record) -> Result<Record, StoreError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::Unavailable(format!("duplicate record id {}", record.id)));
        }
        records.push(record.clone());
        Ok(record)
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<Record>, StoreError> {
        let records = self.records.read().await;
        let mut matching: Vec<Record> = records.iter().filter(|r| filter.matches(r)).cloned().collect();
        matching.sort_by(listing_order);
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(filter.skip).take(limit).collect())
    }

    async fn count(&self, filter: &RecordFilter) -> Result<u64, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn get(&self, id: RecordId) -> Result<Option<Record>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }

    async fn delete_without_vlog(&self) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(Record::has_vlog);
        Ok((before - records.len()) as u64)
    }

    async fn mood_counts(&self) -> Result<Vec<MoodCount>, StoreError> {
        let records = self.records.read().await;
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for record in records.iter() {
            *counts.entry(record.mood.as_str()).or_default() += 1;
        }
        let mut moods: Vec<MoodCount> = counts
            .into_iter()
            .map(|(mood, count)| MoodCount { mood: mood.to_string(), count })
            .collect();
        moods.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.mood.cmp(&b.mood)));
        Ok(moods)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use emogo_core::NewRecord;

    use super::*;

    fn record(mood: &str, vlog: Option<&str>, age_secs: i64) -> Record {
        Record::with_identity(
            NewRecord {
                mood: mood.to_string(),
                latitude: 12.9,
                longitude: 77.6,
                vlog: vlog.map(str::to_string),
                note: None,
                recorded_at: None,
            },
            Uuid::new_v4(),
            Utc::now() - Duration::seconds(age_secs),
        )
    }

    #[tokio::test]
    async fn insert_get_delete() {
        let store = MemoryRecordStore::new();
        let saved = store.insert(record("happy", Some("v1"), 0)).await.unwrap();

        assert_eq!(store.get(saved.id).await.unwrap(), Some(saved.clone()));
        assert!(store.delete(saved.id).await.unwrap());
        assert!(!store.delete(saved.id).await.unwrap());
        assert_eq!(store.get(saved.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_ids_are_refused() {
        let store = MemoryRecordStore::new();
        let r = record("happy", None, 0);
        store.insert(r.clone()).await.unwrap();
        assert!(store.insert(r).await.is_err());
        assert_eq!(store.count(&RecordFilter::all()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let store = MemoryRecordStore::new();
        let oldest = store.insert(record("a", None, 30)).await.unwrap();
        let middle = store.insert(record("b", None, 20)).await.unwrap();
        let newest = store.insert(record("c", None, 10)).await.unwrap();

        let all = store.list(&RecordFilter::all()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);

        let page = RecordFilter { limit: Some(1), skip: 1, ..Default::default() };
        let ids: Vec<_> = store.list(&page).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![middle.id]);
        assert_eq!(store.count(&page).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn cleanup_removes_only_records_without_vlog() {
        let store = MemoryRecordStore::new();
        let kept = store.insert(record("happy", Some("v1.mp4"), 0)).await.unwrap();
        store.insert(record("sad", None, 0)).await.unwrap();
        store.insert(record("calm", Some(""), 0)).await.unwrap();

        assert_eq!(store.delete_without_vlog().await.unwrap(), 2);
        let left = store.list(&RecordFilter::all()).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, kept.id);
    }

    #[tokio::test]
    async fn mood_counts_most_common_first() {
        let store = MemoryRecordStore::new();
        for mood in ["sad", "happy", "happy", "calm"] {
            store.insert(record(mood, None, 0)).await.unwrap();
        }
        let counts = store.mood_counts().await.unwrap();
        assert_eq!(counts[0], MoodCount { mood: "happy".into(), count: 2 });
        assert_eq!(counts[1].mood, "calm");
        assert_eq!(counts[2].mood, "sad");
    }
}
