//! HTML admin dashboard for `GET /export`.
//!
//! The page template is compiled into the binary. A fresh
//! [`minijinja::Environment`] is built per render; with a `.html` template
//! name minijinja escapes every interpolated value, so user-supplied moods
//! and notes cannot inject markup.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use emogo_core::{Record, RecordQuery};

use crate::export::{Listing, Summary};
use crate::record_store::MoodCount;

const TEMPLATE_NAME: &str = "dashboard.html";
const TEMPLATE: &str = include_str!("../templates/dashboard.html");

#[derive(Debug, Serialize)]
struct DashboardContext<'a> {
    generated_at: String,
    docs_url: &'static str,
    summary: SummaryView<'a>,
    filters: FilterView<'a>,
    /// `?mood=..&since=..` carried over to the download links, or empty.
    query_string: String,
    matching: u64,
    rows: Vec<RowView<'a>>,
}

#[derive(Debug, Serialize)]
struct SummaryView<'a> {
    total: u64,
    with_vlog: u64,
    moods: Vec<MoodView<'a>>,
    latest: Option<String>,
}

#[derive(Debug, Serialize)]
struct MoodView<'a> {
    mood: &'a str,
    count: u64,
    /// Dashboard link filtered to this mood.
    href: String,
}

impl<'a> MoodView<'a> {
    fn from_count(count: &'a MoodCount) -> Self {
        Self {
            mood: &count.mood,
            count: count.count,
            href: format!("?mood={}", urlencoding::encode(&count.mood)),
        }
    }
}

#[derive(Debug, Serialize)]
struct FilterView<'a> {
    mood: &'a str,
    since: &'a str,
    until: &'a str,
}

#[derive(Debug, Serialize)]
struct RowView<'a> {
    id: String,
    created_at: String,
    recorded_at: Option<String>,
    mood: &'a str,
    latitude: String,
    longitude: String,
    vlog: Option<&'a str>,
    vlog_url: Option<String>,
    download_url: Option<String>,
    note: Option<&'a str>,
}

impl<'a> RowView<'a> {
    fn from_record(record: &'a Record) -> Self {
        let vlog_url = record.vlog_url();
        // External links are shown as-is; only stored files get a download link.
        let download_url = vlog_url
            .as_deref()
            .filter(|url| url.starts_with("/videos/"))
            .map(|url| format!("{url}?download=1"));
        Self {
            id: record.id.to_string(),
            created_at: display_time(record.created_at),
            recorded_at: record.recorded_at.map(display_time),
            mood: &record.mood,
            latitude: format!("{:.4}", record.latitude),
            longitude: format!("{:.4}", record.longitude),
            vlog: record.vlog.as_deref().filter(|v| !v.trim().is_empty()),
            vlog_url,
            download_url,
            note: record.note.as_deref(),
        }
    }
}

/// Render the dashboard page for one filtered listing.
pub fn render_dashboard(
    summary: &Summary,
    listing: &Listing,
    query: &RecordQuery,
    now: DateTime<Utc>,
) -> Result<String, minijinja::Error> {
    let ctx = DashboardContext {
        generated_at: display_time(now),
        docs_url: "/docs",
        summary: SummaryView {
            total: summary.total,
            with_vlog: summary.with_vlog,
            moods: summary.moods.iter().map(MoodView::from_count).collect(),
            latest: summary.latest.map(display_time),
        },
        filters: FilterView {
            mood: query.mood.as_deref().unwrap_or_default(),
            since: query.since.as_deref().unwrap_or_default(),
            until: query.until.as_deref().unwrap_or_default(),
        },
        query_string: filter_query_string(query),
        matching: listing.total,
        rows: listing.records.iter().map(RowView::from_record).collect(),
    };

    let mut env = minijinja::Environment::new();
    env.add_template(TEMPLATE_NAME, TEMPLATE)?;
    env.get_template(TEMPLATE_NAME)?.render(ctx)
}

/// Query string for the download links: the dashboard's filters, no pagination.
pub fn filter_query_string(query: &RecordQuery) -> String {
    let pairs: Vec<String> = [
        ("mood", query.mood.as_deref()),
        ("since", query.since.as_deref()),
        ("until", query.until.as_deref()),
    ]
    .into_iter()
    .filter_map(|(key, value)| {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        Some(format!("{key}={}", urlencoding::encode(value)))
    })
    .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

fn display_time(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use emogo_core::NewRecord;

    use super::*;

    fn record(mood: &str, vlog: Option<&str>, note: Option<&str>) -> Record {
        Record::with_identity(
            NewRecord {
                mood: mood.into(),
                latitude: 40.7128,
                longitude: -74.006,
                vlog: vlog.map(str::to_string),
                note: note.map(str::to_string),
                recorded_at: None,
            },
            Uuid::from_u128(1),
            Utc.with_ymd_and_hms(2025, 12, 3, 10, 30, 0).unwrap(),
        )
    }

    fn summary_for(records: &[Record]) -> Summary {
        Summary {
            total: records.len() as u64,
            with_vlog: records.iter().filter(|r| r.has_vlog()).count() as u64,
            moods: vec![MoodCount { mood: "happy".into(), count: records.len() as u64 }],
            latest: records.first().map(|r| r.created_at),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 4, 0, 0, 0).unwrap()
    }

    #[test]
    fn renders_rows_and_stats() {
        let records = vec![record("happy", Some("clip.mp4"), Some("sunny"))];
        let listing = Listing { records: records.clone(), total: 1 };
        let html = render_dashboard(&summary_for(&records), &listing, &RecordQuery::default(), now()).unwrap();

        assert!(html.contains("EmoGo Admin Dashboard"));
        // Autoescape encodes `/` inside attribute values.
        assert!(html.contains("clip.mp4?download=1"));
        assert!(html.contains("2025-12-03T10:30:00Z"));
        assert!(html.contains("sunny"));
        assert!(html.contains("href=\"/export/records.csv\""));
    }

    #[test]
    fn empty_store_shows_placeholder() {
        let listing = Listing { records: vec![], total: 0 };
        let summary = Summary { total: 0, with_vlog: 0, moods: vec![], latest: None };
        let html = render_dashboard(&summary, &listing, &RecordQuery::default(), now()).unwrap();
        assert!(html.contains("No records match the current filters."));
        assert!(html.contains("none yet"));
    }

    #[test]
    fn user_text_is_escaped() {
        let records = vec![record("happy", None, Some("<script>alert(1)</script>"))];
        let listing = Listing { records: records.clone(), total: 1 };
        let html = render_dashboard(&summary_for(&records), &listing, &RecordQuery::default(), now()).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn external_vlog_links_have_no_download() {
        let records = vec![record("happy", Some("https://cdn.example.com/v.mp4"), None)];
        let listing = Listing { records: records.clone(), total: 1 };
        let html = render_dashboard(&summary_for(&records), &listing, &RecordQuery::default(), now()).unwrap();
        assert!(html.contains("cdn.example.com"));
        assert!(!html.contains("?download=1"));
    }

    #[test]
    fn mood_chips_link_to_encoded_filter() {
        let records = vec![record("very happy", None, None)];
        let listing = Listing { records: records.clone(), total: 1 };
        let summary = Summary {
            total: 1,
            with_vlog: 0,
            moods: vec![MoodCount { mood: "very happy".into(), count: 1 }],
            latest: None,
        };
        let html = render_dashboard(&summary, &listing, &RecordQuery::default(), now()).unwrap();
        assert!(html.contains("href=\"?mood=very%20happy\""));
        assert!(html.contains("very happy &middot; 1"));
    }

    #[test]
    fn query_string_carries_filters() {
        let query = RecordQuery {
            mood: Some("very happy".into()),
            since: Some("2025-12-01".into()),
            until: Some("".into()),
            limit: Some(5),
            ..Default::default()
        };
        assert_eq!(filter_query_string(&query), "?mood=very%20happy&since=2025-12-01");
        assert_eq!(filter_query_string(&RecordQuery::default()), "");
    }
}
