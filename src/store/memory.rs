//! In-memory [`ReadingStore`] and [`NoteStore`] used by unit and handler
//! tests.

use std::{collections::BTreeMap, ops::Bound, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NoteStore, ReadingStore, StoreError};
use crate::model::{Note, RawRecord};

/// Sorted store keyed by `(sensor_id, timestamp)`, mirroring the layout of
/// the production tables. Wrapped in `Arc` so it can be cheaply cloned into
/// a test server while the test keeps a handle for inserts.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<BTreeMap<(String, DateTime<Utc>), RawRecord>>>,
    notes: Arc<RwLock<Vec<Note>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: RawRecord) {
        self.inner
            .write()
            .await
            .insert((record.sensor_id.clone(), record.timestamp), record);
    }

    /// Build and insert a record from a JSON payload object.
    ///
    /// Panics on a non-object payload; tests construct payloads with `json!`.
    pub async fn insert_payload(
        &self,
        sensor_id: &str,
        timestamp: DateTime<Utc>,
        payload: serde_json::Value,
    ) {
        let serde_json::Value::Object(fields) = payload else {
            panic!("payload must be a JSON object");
        };
        self.insert(RawRecord {
            sensor_id: sensor_id.to_owned(),
            timestamp,
            fields,
        })
        .await;
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn query_range(
        &self,
        sensor_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawRecord>, StoreError> {
        let from = Bound::Included((sensor_id.to_owned(), start));
        let to = Bound::Included((sensor_id.to_owned(), end));
        Ok(self
            .inner
            .read()
            .await
            .range((from, to))
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn query_latest(&self, sensor_id: &str) -> Result<Option<RawRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .iter()
            .filter(|((id, _), _)| id == sensor_id)
            .next_back()
            .map(|(_, r)| r.clone()))
    }

    async fn scan_all(&self) -> Result<Vec<RawRecord>, StoreError> {
        Ok(self.inner.read().await.values().cloned().collect())
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn add_note(
        &self,
        sensor_id: &str,
        author: &str,
        content: &str,
    ) -> Result<Note, StoreError> {
        let note = Note {
            id: Uuid::new_v4(),
            sensor_id: sensor_id.to_owned(),
            author: author.to_owned(),
            content: content.to_owned(),
            created_at: Utc::now(),
        };
        self.notes.write().await.push(note.clone());
        Ok(note)
    }

    async fn list_notes(&self, sensor_id: &str) -> Result<Vec<Note>, StoreError> {
        let mut notes: Vec<Note> = self
            .notes
            .read()
            .await
            .iter()
            .filter(|n| n.sensor_id == sensor_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn delete_note(&self, sensor_id: &str, note_id: Uuid) -> Result<bool, StoreError> {
        let mut notes = self.notes.write().await;
        let before = notes.len();
        notes.retain(|n| !(n.sensor_id == sensor_id && n.id == note_id));
        Ok(notes.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn empty_store_returns_nothing() {
        let store = MemoryStore::new();
        assert!(store.scan_all().await.unwrap().is_empty());
        assert!(store.query_latest("s1").await.unwrap().is_none());
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        assert!(store.query_range("s1", start, end).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn range_is_closed_on_both_ends() {
        let store = MemoryStore::new();
        for t in [
            "2024-03-01T00:00:00Z",
            "2024-03-01T12:00:00Z",
            "2024-03-02T00:00:00Z",
            "2024-03-02T00:00:01Z",
        ] {
            store.insert_payload("s1", ts(t), json!({"co2": 400})).await;
        }

        let got = store
            .query_range("s1", ts("2024-03-01T00:00:00Z"), ts("2024-03-02T00:00:00Z"))
            .await
            .unwrap();
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].timestamp, ts("2024-03-01T00:00:00Z"));
        assert_eq!(got[2].timestamp, ts("2024-03-02T00:00:00Z"));
    }

    #[tokio::test]
    async fn range_does_not_leak_other_sensors() {
        let store = MemoryStore::new();
        store
            .insert_payload("s1", ts("2024-03-01T00:00:00Z"), json!({"co2": 1}))
            .await;
        store
            .insert_payload("s2", ts("2024-03-01T00:00:00Z"), json!({"co2": 2}))
            .await;

        let got = store
            .query_range("s1", ts("2024-01-01T00:00:00Z"), ts("2024-12-31T00:00:00Z"))
            .await
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].sensor_id, "s1");
    }

    #[tokio::test]
    async fn latest_picks_maximum_timestamp_per_sensor() {
        let store = MemoryStore::new();
        store
            .insert_payload("s1", ts("2024-03-01T00:00:00Z"), json!({"co2": 1}))
            .await;
        store
            .insert_payload("s1", ts("2024-03-05T00:00:00Z"), json!({"co2": 2}))
            .await;
        store
            .insert_payload("s2", ts("2024-03-09T00:00:00Z"), json!({"co2": 3}))
            .await;

        let latest = store.query_latest("s1").await.unwrap().unwrap();
        assert_eq!(latest.timestamp, ts("2024-03-05T00:00:00Z"));
    }

    #[tokio::test]
    async fn notes_are_scoped_to_their_sensor() {
        let store = MemoryStore::new();
        store.add_note("s1", "ops", "filter changed").await.unwrap();
        store.add_note("s2", "ops", "relocated").await.unwrap();

        let notes = store.list_notes("s1").await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].content, "filter changed");
    }

    #[tokio::test]
    async fn delete_note_reports_whether_anything_was_removed() {
        let store = MemoryStore::new();
        let note = store.add_note("s1", "ops", "battery swapped").await.unwrap();

        assert!(!store.delete_note("s2", note.id).await.unwrap());
        assert!(store.delete_note("s1", note.id).await.unwrap());
        assert!(store.list_notes("s1").await.unwrap().is_empty());
    }
}
