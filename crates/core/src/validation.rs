//! Submission validation.
//!
//! All violations are collected so a client can fix a payload in one round
//! trip. Validation never touches the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::IngestConfig;
use crate::error::EmogoError;
use crate::record::{NewRecord, RecordSubmission};

pub const MOOD_MAX_LEN: usize = 50;
pub const NOTE_MAX_LEN: usize = 500;
pub const VLOG_MAX_LEN: usize = 500;

/// One rejected field and the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a submission and normalise it (trimmed strings, parsed timestamp).
pub fn validate_submission(
    submission: RecordSubmission,
    rules: &IngestConfig,
) -> Result<NewRecord, EmogoError> {
    let mut errors = Vec::new();

    let mood = match submission.mood.as_deref().map(str::trim) {
        None => {
            errors.push(FieldError::new("mood", "is required"));
            None
        }
        Some("") => {
            errors.push(FieldError::new("mood", "must not be empty"));
            None
        }
        Some(m) if m.chars().count() > MOOD_MAX_LEN => {
            errors.push(FieldError::new("mood", format!("must be at most {MOOD_MAX_LEN} characters")));
            None
        }
        Some(m) => Some(m.to_string()),
    };

    let latitude = coordinate(submission.latitude, "latitude", 90.0, &mut errors);
    let longitude = coordinate(submission.longitude, "longitude", 180.0, &mut errors);

    let vlog = match submission.vlog.as_deref().map(str::trim) {
        None if rules.require_vlog => {
            errors.push(FieldError::new("vlog", "is required"));
            None
        }
        None => None,
        Some("") => {
            errors.push(FieldError::new("vlog", "must not be empty when provided"));
            None
        }
        Some(v) if v.chars().count() > VLOG_MAX_LEN => {
            errors.push(FieldError::new("vlog", format!("must be at most {VLOG_MAX_LEN} characters")));
            None
        }
        Some(v) => Some(v.to_string()),
    };

    let note = match submission.note {
        Some(n) if n.chars().count() > NOTE_MAX_LEN => {
            errors.push(FieldError::new("note", format!("must be at most {NOTE_MAX_LEN} characters")));
            None
        }
        Some(n) if n.trim().is_empty() => None,
        other => other,
    };

    let recorded_at = match submission.recorded_at.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(_) => {
                errors.push(FieldError::new("recorded_at", "must be an RFC 3339 timestamp"));
                None
            }
        },
    };

    match (mood, latitude, longitude) {
        (Some(mood), Some(latitude), Some(longitude)) if errors.is_empty() => Ok(NewRecord {
            mood,
            latitude,
            longitude,
            vlog,
            note,
            recorded_at,
        }),
        _ => Err(EmogoError::Validation(errors)),
    }
}

fn coordinate(value: Option<f64>, field: &'static str, bound: f64, errors: &mut Vec<FieldError>) -> Option<f64> {
    match value {
        None => {
            errors.push(FieldError::new(field, "is required"));
            None
        }
        Some(v) if !v.is_finite() || v < -bound || v > bound => {
            errors.push(FieldError::new(field, format!("must be between -{bound} and {bound}")));
            None
        }
        Some(v) => Some(v),
    }
}
