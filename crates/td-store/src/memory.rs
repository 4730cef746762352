//! In-memory record store
//!
//! Keeps rows in insertion order per table, the way the upstream service
//! returns them. Used for development, tests, and as the inner store
//! behind [`crate::FlakyRecordStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use td_core::RecordId;
use tokio::sync::RwLock;

use crate::store::{Filter, RecordStore, StoreError, StoreOp, StoreResult, Table};

#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn require_object(table: Table, row: &Value) -> StoreResult<()> {
        if !row.is_object() {
            return Err(StoreError::MalformedRow {
                table,
                message: "row is not a JSON object".into(),
            });
        }
        Ok(())
    }

    fn row_id(table: Table, row: &Value) -> StoreResult<String> {
        row.get("id")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(StoreError::MalformedRow {
                table,
                message: "row has no string `id` field".into(),
            })
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        Self::require_object(table, &row)?;
        let id = Self::row_id(table, &row)?;

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();

        if rows.iter().any(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str())) {
            return Err(StoreError::Write {
                table,
                op: StoreOp::Insert,
                message: format!("duplicate id {id}"),
            });
        }

        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, id: RecordId, patch: Value) -> StoreResult<Value> {
        let patch = match patch {
            Value::Object(map) => map,
            _ => {
                return Err(StoreError::MalformedRow {
                    table,
                    message: "patch is not a JSON object".into(),
                })
            }
        };

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let target = id.to_string();

        let row = rows
            .iter_mut()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(target.as_str()))
            .ok_or(StoreError::RowNotFound { table, id })?;

        if let Some(obj) = row.as_object_mut() {
            for (key, value) in patch {
                obj.insert(key, value);
            }
        }

        Ok(row.clone())
    }

    async fn select(&self, table: Table, filter: Filter) -> StoreResult<Vec<Value>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, table: Table, id: RecordId) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let target = id.to_string();

        let before = rows.len();
        rows.retain(|r| r.get("id").and_then(Value::as_str) != Some(target.as_str()));

        if rows.len() == before {
            return Err(StoreError::RowNotFound { table, id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: RecordId, title: &str) -> Value {
        json!({"id": id.to_string(), "title": title})
    }

    #[tokio::test]
    async fn test_insert_and_select() {
        let store = MemoryRecordStore::new();
        let id = RecordId::new();

        store.insert(Table::Projects, row(id, "alpha")).await.unwrap();

        let rows = store.select(Table::Projects, Filter::All).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "alpha");

        let found = store.find_by_id(Table::Projects, id).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = MemoryRecordStore::new();
        let id = RecordId::new();

        store.insert(Table::Tasks, row(id, "one")).await.unwrap();
        let err = store.insert(Table::Tasks, row(id, "two")).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { op: StoreOp::Insert, .. }));
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let store = MemoryRecordStore::new();
        let id = RecordId::new();

        store.insert(Table::Notes, row(id, "draft")).await.unwrap();
        let updated = store
            .update(Table::Notes, id, json!({"title": "final", "category": "ops"}))
            .await
            .unwrap();

        assert_eq!(updated["title"], "final");
        assert_eq!(updated["category"], "ops");
        assert_eq!(updated["id"], id.to_string());
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let store = MemoryRecordStore::new();
        let err = store
            .update(Table::Notes, RecordId::new(), json!({"title": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RowNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_not_idempotent() {
        let store = MemoryRecordStore::new();
        let id = RecordId::new();

        store.insert(Table::Events, row(id, "standup")).await.unwrap();
        store.delete(Table::Events, id).await.unwrap();

        let err = store.delete(Table::Events, id).await.unwrap_err();
        assert!(matches!(err, StoreError::RowNotFound { .. }));
    }

    #[tokio::test]
    async fn test_row_without_id_rejected() {
        let store = MemoryRecordStore::new();
        let err = store
            .insert(Table::Files, json!({"name": "report.pdf"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MalformedRow { .. }));
    }

    #[tokio::test]
    async fn test_select_preserves_insertion_order() {
        let store = MemoryRecordStore::new();
        for i in 0..3 {
            store
                .insert(Table::Tasks, row(RecordId::new(), &format!("t{i}")))
                .await
                .unwrap();
        }

        let rows = store.select(Table::Tasks, Filter::All).await.unwrap();
        let titles: Vec<_> = rows.iter().map(|r| r["title"].as_str().unwrap()).collect();
        assert_eq!(titles, ["t0", "t1", "t2"]);
    }
}
