//! Export service: listings, summary stats, and CSV/JSON downloads.
//!
//! Listings are a best-effort snapshot of the store at query time, ordered
//! newest first (`created_at DESC, id DESC`). A store failure is returned
//! as an error, never as an empty listing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use emogo_core::{EmogoError, Record, RecordFilter};

use crate::record_store::{MoodCount, RecordStore};

const CSV_HEADER: &str = "id,created_at,recorded_at,mood,latitude,longitude,vlog,note";

/// One page of records plus the unpaginated match count.
#[derive(Debug, Clone)]
pub struct Listing {
    pub records: Vec<Record>,
    pub total: u64,
}

/// Store-wide figures for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total: u64,
    pub with_vlog: u64,
    pub moods: Vec<MoodCount>,
    pub latest: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

/// JSON download body.
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub exported_at: DateTime<Utc>,
    pub count: usize,
    pub records: &'a [Record],
}

pub async fn listing(store: &dyn RecordStore, filter: &RecordFilter) -> Result<Listing, EmogoError> {
    let records = store.list(filter).await.map_err(|e| {
        error!(error = %e, "Error fetching records");
        EmogoError::from(e)
    })?;
    let total = store.count(filter).await.map_err(|e| {
        error!(error = %e, "Error counting records");
        EmogoError::from(e)
    })?;
    Ok(Listing { records, total })
}

pub async fn summary(store: &dyn RecordStore) -> Result<Summary, EmogoError> {
    let all = RecordFilter::all();
    let with_vlog_filter = RecordFilter { has_vlog: Some(true), ..Default::default() };
    let latest_filter = RecordFilter { limit: Some(1), ..Default::default() };

    let total = store.count(&all).await?;
    let with_vlog = store.count(&with_vlog_filter).await?;
    let moods = store.mood_counts().await?;
    let latest = store.list(&latest_filter).await?.first().map(|r| r.created_at);

    Ok(Summary { total, with_vlog, moods, latest })
}

pub fn file_name(format: ExportFormat, now: DateTime<Utc>) -> String {
    format!("emogo-records-{}.{}", now.format("%Y%m%d-%H%M%S"), format.extension())
}

pub fn render(format: ExportFormat, records: &[Record], now: DateTime<Utc>) -> serde_json::Result<String> {
    match format {
        ExportFormat::Csv => Ok(to_csv(records)),
        ExportFormat::Json => serde_json::to_string_pretty(&ExportDocument {
            exported_at: now,
            count: records.len(),
            records,
        }),
    }
}

pub fn to_csv(records: &[Record]) -> String {
    let mut out = String::with_capacity(64 * (records.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for r in records {
        let fields = [
            r.id.to_string(),
            r.created_at.to_rfc3339(),
            r.recorded_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            r.mood.clone(),
            r.latitude.to_string(),
            r.longitude.to_string(),
            r.vlog.clone().unwrap_or_default(),
            r.note.clone().unwrap_or_default(),
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use emogo_core::NewRecord;

    use super::*;
    use crate::record_store::MemoryRecordStore;

    fn sample(note: Option<&str>) -> Record {
        Record::with_identity(
            NewRecord {
                mood: "happy".into(),
                latitude: 12.9,
                longitude: 77.6,
                vlog: Some("v1.mp4".into()),
                note: note.map(str::to_string),
                recorded_at: None,
            },
            Uuid::from_u128(7),
            Utc.with_ymd_and_hms(2025, 12, 3, 10, 30, 0).unwrap(),
        )
    }

    #[test]
    fn csv_has_header_and_rows() {
        let csv = to_csv(&[sample(None)]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some("00000000-0000-0000-0000-000000000007,2025-12-03T10:30:00+00:00,,happy,12.9,77.6,v1.mp4,")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn csv_escapes_special_characters() {
        let csv = to_csv(&[sample(Some("sunny, \"warm\"\nday"))]);
        assert!(csv.contains("\"sunny, \"\"warm\"\"\nday\""));
    }

    #[test]
    fn json_document_counts_records() {
        let now = Utc.with_ymd_and_hms(2025, 12, 4, 0, 0, 0).unwrap();
        let body = render(ExportFormat::Json, &[sample(None), sample(None)], now).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["records"][0]["mood"], "happy");
        assert_eq!(value["exported_at"], "2025-12-04T00:00:00Z");
    }

    #[test]
    fn file_names_are_timestamped() {
        let now = Utc.with_ymd_and_hms(2025, 12, 4, 8, 5, 9).unwrap();
        assert_eq!(file_name(ExportFormat::Csv, now), "emogo-records-20251204-080509.csv");
        assert_eq!(file_name(ExportFormat::Json, now), "emogo-records-20251204-080509.json");
    }

    #[tokio::test]
    async fn summary_reflects_store() {
        let store = MemoryRecordStore::new();
        let empty = summary(&store).await.unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.latest, None);

        let mut without_vlog = sample(None);
        without_vlog.id = Uuid::from_u128(8);
        without_vlog.vlog = None;
        store.insert(sample(None)).await.unwrap();
        store.insert(without_vlog).await.unwrap();

        let s = summary(&store).await.unwrap();
        assert_eq!(s.total, 2);
        assert_eq!(s.with_vlog, 1);
        assert_eq!(s.moods, vec![MoodCount { mood: "happy".into(), count: 2 }]);
        assert!(s.latest.is_some());
    }
}
