use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use uuid::Uuid;

use super::{NoteStore, ReadingStore, StoreError};
use crate::model::{Note, RawRecord};

pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Row shape of the `sensor_readings` table.
#[derive(sqlx::FromRow)]
struct ReadingRow {
    sensor_id: String,
    recorded_at: DateTime<Utc>,
    payload: serde_json::Value,
}

impl From<ReadingRow> for RawRecord {
    fn from(row: ReadingRow) -> Self {
        let fields = match row.payload {
            serde_json::Value::Object(map) => map,
            // Non-object payloads carry no usable fields; keep the record so
            // the sensor still counts as having reported.
            _ => serde_json::Map::new(),
        };
        RawRecord {
            sensor_id: row.sensor_id,
            timestamp: row.recorded_at,
            fields,
        }
    }
}

/// Postgres-backed [`ReadingStore`].
#[derive(Clone)]
pub struct PgReadingStore {
    pool: PgPool,
}

impl PgReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn query_range(
        &self,
        sensor_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ReadingRow>(
            r#"
            SELECT sensor_id, recorded_at, payload
            FROM sensor_readings
            WHERE sensor_id = $1
              AND recorded_at >= $2
              AND recorded_at <= $3
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(sensor_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn query_latest(&self, sensor_id: &str) -> Result<Option<RawRecord>, StoreError> {
        let row = sqlx::query_as::<_, ReadingRow>(
            r#"
            SELECT sensor_id, recorded_at, payload
            FROM sensor_readings
            WHERE sensor_id = $1
            ORDER BY recorded_at DESC
            LIMIT 1
            "#,
        )
        .bind(sensor_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn scan_all(&self) -> Result<Vec<RawRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ReadingRow>(
            r#"
            SELECT sensor_id, recorded_at, payload
            FROM sensor_readings
            ORDER BY sensor_id, recorded_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Row shape of the `sensor_notes` table.
#[derive(sqlx::FromRow)]
struct NoteRow {
    id: Uuid,
    sensor_id: String,
    author: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Note {
            id: row.id,
            sensor_id: row.sensor_id,
            author: row.author,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Postgres-backed [`NoteStore`].
#[derive(Clone)]
pub struct PgNoteStore {
    pool: PgPool,
}

impl PgNoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn add_note(
        &self,
        sensor_id: &str,
        author: &str,
        content: &str,
    ) -> Result<Note, StoreError> {
        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            INSERT INTO sensor_notes (id, sensor_id, author, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, sensor_id, author, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sensor_id)
        .bind(author)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_notes(&self, sensor_id: &str) -> Result<Vec<Note>, StoreError> {
        let rows = sqlx::query_as::<_, NoteRow>(
            r#"
            SELECT id, sensor_id, author, content, created_at
            FROM sensor_notes
            WHERE sensor_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(sensor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_note(&self, sensor_id: &str, note_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM sensor_notes
            WHERE sensor_id = $1 AND id = $2
            "#,
        )
        .bind(sensor_id)
        .bind(note_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
