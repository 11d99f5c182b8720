//! Storage boundaries.
//!
//! The aggregation engine never talks to the database directly; it goes
//! through [`ReadingStore`], a key-sorted store of raw records keyed by
//! `(sensor_id, timestamp)`. Sensor annotations live behind [`NoteStore`].
//! Production uses the Postgres adapters; tests use the in-memory store,
//! which implements both traits.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use uuid::Uuid;

use crate::model::{Note, RawRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The upstream store could not be reached (network/timeout/throttling).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// All records for `sensor_id` with `start <= timestamp <= end`
    /// (closed interval on both ends). Order is not guaranteed.
    async fn query_range(
        &self,
        sensor_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawRecord>, StoreError>;

    /// The most recent record for `sensor_id`, if any.
    async fn query_latest(&self, sensor_id: &str) -> Result<Option<RawRecord>, StoreError>;

    /// Full materialization of the table. Used only by fleet-health and
    /// all-sensors paths; callers must reuse one scan result rather than
    /// re-querying per derived count.
    async fn scan_all(&self) -> Result<Vec<RawRecord>, StoreError>;
}

/// Per-sensor note storage, keyed `(sensor_id, note_id)`.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Persist a new note and return it with its generated id and timestamp.
    async fn add_note(
        &self,
        sensor_id: &str,
        author: &str,
        content: &str,
    ) -> Result<Note, StoreError>;

    /// All notes for `sensor_id`, most recent first.
    async fn list_notes(&self, sensor_id: &str) -> Result<Vec<Note>, StoreError>;

    /// Delete one note. Returns `false` when no such note exists for the
    /// sensor.
    async fn delete_note(&self, sensor_id: &str, note_id: Uuid) -> Result<bool, StoreError>;
}
