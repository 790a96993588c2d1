//! PostgreSQL-backed [`RecordStore`].
//!
//! Filters are bound as nullable parameters so one statement serves every
//! combination; `LIMIT NULL` means no limit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use emogo_core::{Record, RecordFilter, RecordId};

use super::{MoodCount, RecordStore, StoreError};

const RECORD_COLUMNS: &str = "id, mood, latitude, longitude, vlog, note, recorded_at, created_at";

const FILTER_CLAUSE: &str = "($1::text IS NULL OR mood = $1)
      AND ($2::timestamptz IS NULL OR created_at >= $2)
      AND ($3::timestamptz IS NULL OR created_at <= $3)
      AND ($4::timestamptz IS NULL OR created_at < $4)
      AND ($5::boolean IS NULL OR (COALESCE(BTRIM(vlog), '') <> '') = $5)";

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: Uuid,
    mood: String,
    latitude: f64,
    longitude: f64,
    vlog: Option<String>,
    note: Option<String>,
    recorded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Record {
            id: row.id,
            mood: row.mood,
            latitude: row.latitude,
            longitude: row.longitude,
            vlog: row.vlog,
            note: row.note,
            recorded_at: row.recorded_at,
            created_at: row.created_at,
        }
    }
}

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, record: Record) -> Result<Record, StoreError> {
        let sql = format!(
            "INSERT INTO records ({RECORD_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {RECORD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(record.id)
            .bind(&record.mood)
            .bind(record.latitude)
            .bind(record.longitude)
            .bind(&record.vlog)
            .bind(&record.note)
            .bind(record.recorded_at)
            .bind(record.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<Record>, StoreError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM records
             WHERE {FILTER_CLAUSE}
             ORDER BY created_at DESC, id DESC
             LIMIT $6 OFFSET $7"
        );
        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(&filter.mood)
            .bind(filter.since)
            .bind(filter.until)
            .bind(filter.before)
            .bind(filter.has_vlog)
            .bind(filter.limit.map(to_i64))
            .bind(to_i64(filter.skip))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Record::from).collect())
    }

    async fn count(&self, filter: &RecordFilter) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM records WHERE {FILTER_CLAUSE}");
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(&filter.mood)
            .bind(filter.since)
            .bind(filter.until)
            .bind(filter.before)
            .bind(filter.has_vlog)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn get(&self, id: RecordId) -> Result<Option<Record>, StoreError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = $1");
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Record::from))
    }

    async fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_without_vlog(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM records WHERE vlog IS NULL OR BTRIM(vlog) = ''")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn mood_counts(&self) -> Result<Vec<MoodCount>, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT mood, COUNT(*) AS n FROM records GROUP BY mood ORDER BY n DESC, mood ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(mood, n)| MoodCount { mood, count: n.max(0) as u64 })
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
