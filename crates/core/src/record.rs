use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EmogoError;
use crate::validation::FieldError;

/// Unique record identifier, assigned when the record is persisted.
pub type RecordId = Uuid;

/// Listing size when the caller does not pass `limit`.
pub const DEFAULT_LIMIT: usize = 100;

/// Hard cap on a single listing page.
pub const MAX_LIMIT: usize = 1000;

/// One persisted mood submission: sentiment, position and optional vlog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Record {
    #[schema(value_type = String, format = Uuid)]
    pub id: RecordId,
    /// Sentiment label, e.g. `"happy"`.
    pub mood: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Vlog file name in the media store, or an external URL.
    pub vlog: Option<String>,
    pub note: Option<String>,
    /// Capture time reported by the client.
    pub recorded_at: Option<DateTime<Utc>>,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// Assign a fresh id and the current server time to a validated submission.
    pub fn create(new: NewRecord) -> Self {
        Self::with_identity(new, Uuid::new_v4(), Utc::now())
    }

    pub fn with_identity(new: NewRecord, id: RecordId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            mood: new.mood,
            latitude: new.latitude,
            longitude: new.longitude,
            vlog: new.vlog,
            note: new.note,
            recorded_at: new.recorded_at,
            created_at,
        }
    }

    pub fn has_vlog(&self) -> bool {
        self.vlog.as_deref().is_some_and(|v| !v.trim().is_empty())
    }

    /// Link to the vlog: external URLs pass through, stored files map to `/videos/`.
    pub fn vlog_url(&self) -> Option<String> {
        let vlog = self.vlog.as_deref().filter(|v| !v.trim().is_empty())?;
        if vlog.starts_with("http://") || vlog.starts_with("https://") {
            Some(vlog.to_string())
        } else {
            Some(format!("/videos/{}", vlog.trim_start_matches('/')))
        }
    }
}

/// Inbound `POST /record` payload.
///
/// Every field is optional at the type level so that a missing field is
/// reported by validation with its name rather than as a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[schema(example = json!({
    "mood": "happy",
    "latitude": 40.7128,
    "longitude": -74.0060,
    "timestamp": "2025-12-03T10:30:00Z",
    "vlog": "my_vlog.mp4",
    "note": "Beautiful day in NYC"
}))]
pub struct RecordSubmission {
    #[serde(alias = "sentiment")]
    pub mood: Option<String>,
    #[serde(alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(alias = "lon", alias = "lng")]
    pub longitude: Option<f64>,
    #[serde(alias = "vlog_file")]
    pub vlog: Option<String>,
    pub note: Option<String>,
    /// RFC 3339 capture time.
    #[serde(alias = "timestamp")]
    pub recorded_at: Option<String>,
}

/// A submission that passed validation, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub mood: String,
    pub latitude: f64,
    pub longitude: f64,
    pub vlog: Option<String>,
    pub note: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
}

// ── Listing queries ───────────────────────────────────────────

/// Query parameters accepted by the listing and export endpoints.
///
/// Empty strings are treated as absent so that HTML filter forms can submit
/// blank fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordQuery {
    /// Exact mood match.
    pub mood: Option<String>,
    /// Lower bound on `created_at` (RFC 3339 or `YYYY-MM-DD`), inclusive.
    pub since: Option<String>,
    /// Upper bound on `created_at` (RFC 3339 or `YYYY-MM-DD`), inclusive.
    pub until: Option<String>,
    /// Only records with (`true`) or without (`false`) a vlog.
    pub has_vlog: Option<bool>,
    /// Page size (default 100, max 1000).
    pub limit: Option<usize>,
    /// Number of records to skip.
    pub skip: Option<usize>,
}

/// Parsed, validated form of [`RecordQuery`].
///
/// Results are ordered newest first: `created_at DESC, id DESC`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub mood: Option<String>,
    /// Inclusive lower bound.
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound, from an RFC 3339 `until`.
    pub until: Option<DateTime<Utc>>,
    /// Exclusive upper bound, from a date-only `until` (start of the next day).
    pub before: Option<DateTime<Utc>>,
    pub has_vlog: Option<bool>,
    /// `None` returns every matching record.
    pub limit: Option<usize>,
    pub skip: usize,
}

impl RecordQuery {
    /// Resolve for a paginated listing (default and capped page size).
    pub fn resolve(&self) -> Result<RecordFilter, EmogoError> {
        let mut filter = self.resolve_unbounded()?;
        filter.limit = Some(self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT));
        Ok(filter)
    }

    /// Resolve for a download: no limit unless the caller passes one.
    pub fn resolve_unbounded(&self) -> Result<RecordFilter, EmogoError> {
        let mut errors = Vec::new();
        let since = parse_bound(self.since.as_deref(), "since", &mut errors).map(Bound::start);
        let (until, before) = match parse_bound(self.until.as_deref(), "until", &mut errors) {
            Some(Bound::Instant(ts)) => (Some(ts), None),
            Some(day @ Bound::Day(_)) => (None, day.next_day_start()),
            None => (None, None),
        };
        if let Some(s) = since {
            let inverted = until.is_some_and(|u| s > u) || before.is_some_and(|b| s >= b);
            if inverted {
                errors.push(FieldError::new("since", "must not be after until"));
            }
        }
        if !errors.is_empty() {
            return Err(EmogoError::Validation(errors));
        }
        Ok(RecordFilter {
            mood: non_blank(self.mood.as_deref()).map(str::to_string),
            since,
            until,
            before,
            has_vlog: self.has_vlog,
            limit: self.limit,
            skip: self.skip.unwrap_or(0),
        })
    }
}

impl RecordFilter {
    /// Every record, no pagination.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    /// Whether a record passes the predicates (pagination not considered).
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(mood) = &self.mood {
            if &record.mood != mood {
                return false;
            }
        }
        if let Some(since) = self.since {
            if record.created_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.created_at > until {
                return false;
            }
        }
        if let Some(before) = self.before {
            if record.created_at >= before {
                return false;
            }
        }
        if let Some(has_vlog) = self.has_vlog {
            if record.has_vlog() != has_vlog {
                return false;
            }
        }
        true
    }
}

/// Listing order shared by every store: newest first, id as tiebreak.
pub fn listing_order(a: &Record, b: &Record) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A parsed `since`/`until` value.
#[derive(Debug, Clone, Copy)]
enum Bound {
    Instant(DateTime<Utc>),
    /// A bare date covering the whole day.
    Day(NaiveDate),
}

impl Bound {
    fn start(self) -> DateTime<Utc> {
        match self {
            Bound::Instant(ts) => ts,
            Bound::Day(date) => Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)),
        }
    }

    fn next_day_start(self) -> Option<DateTime<Utc>> {
        match self {
            Bound::Instant(_) => None,
            Bound::Day(date) => date.succ_opt().map(|next| Bound::Day(next).start()),
        }
    }
}

fn parse_bound(raw: Option<&str>, field: &'static str, errors: &mut Vec<FieldError>) -> Option<Bound> {
    let raw = non_blank(raw)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(Bound::Instant(ts.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Bound::Day(date));
    }
    errors.push(FieldError::new(field, "must be an RFC 3339 timestamp or YYYY-MM-DD date"));
    None
}
