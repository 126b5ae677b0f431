//! In-memory implementation of DataStore for testing and development

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::{DataStore, Filter};

/// In-memory record store.
///
/// Useful for testing and development. Uses RwLock for thread-safe access;
/// records of each kind keep insertion order so listings are stable.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<HashMap<String, IndexMap<String, Value>>>>,
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert seed records of one kind, keyed by their `id` field.
    pub fn seed(&self, entity_kind: &str, rows: Vec<Value>) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        let kind = records.entry(entity_kind.to_string()).or_default();
        for row in rows {
            let id = record_id(&row)?;
            kind.insert(id, row);
        }
        Ok(())
    }
}

fn record_id(row: &Value) -> Result<String> {
    row.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Record is missing a string 'id' field"))
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(field, expected)| row.get(field) == Some(expected))
}

#[async_trait]
impl DataStore for InMemoryStore {
    async fn find_many(&self, entity_kind: &str, filter: Option<&Filter>) -> Result<Vec<Value>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let Some(kind) = records.get(entity_kind) else {
            return Ok(Vec::new());
        };

        Ok(kind
            .values()
            .filter(|row| filter.is_none_or(|f| matches_filter(row, f)))
            .cloned()
            .collect())
    }

    async fn find_many_by_keys(
        &self,
        entity_kind: &str,
        keys: &[String],
        foreign_key_field: &str,
    ) -> Result<Vec<Value>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let Some(kind) = records.get(entity_kind) else {
            return Ok(Vec::new());
        };

        Ok(kind
            .values()
            .filter(|row| {
                row.get(foreign_key_field)
                    .and_then(Value::as_str)
                    .is_some_and(|fk| keys.iter().any(|k| k == fk))
            })
            .cloned()
            .collect())
    }

    async fn create(&self, entity_kind: &str, mut data: Value) -> Result<Value> {
        let obj = data
            .as_object_mut()
            .ok_or_else(|| anyhow!("Record data must be an object"))?;
        if !obj.contains_key("id") {
            obj.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        let id = record_id(&data)?;

        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        let kind = records.entry(entity_kind.to_string()).or_default();

        if kind.contains_key(&id) {
            bail!("{} with id '{}' already exists", entity_kind, id);
        }
        kind.insert(id, data.clone());

        Ok(data)
    }

    async fn update(&self, entity_kind: &str, id: &str, data: Value) -> Result<Value> {
        let patch = data
            .as_object()
            .ok_or_else(|| anyhow!("Record data must be an object"))?;

        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        let row = records
            .get_mut(entity_kind)
            .and_then(|kind| kind.get_mut(id))
            .ok_or_else(|| anyhow!("{} with id '{}' not found", entity_kind, id))?;

        let fields = row
            .as_object_mut()
            .ok_or_else(|| anyhow!("Stored record is not an object"))?;
        for (field, value) in patch {
            if field != "id" {
                fields.insert(field.clone(), value.clone());
            }
        }

        Ok(row.clone())
    }

    async fn delete(&self, entity_kind: &str, id: &str) -> Result<Value> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        records
            .get_mut(entity_kind)
            .and_then(|kind| kind.shift_remove(id))
            .ok_or_else(|| anyhow!("{} with id '{}' not found", entity_kind, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_generates_id() {
        let store = InMemoryStore::new();

        let created = store
            .create("user", json!({"name": "Alice", "balance": 10.0}))
            .await
            .unwrap();

        let id = created.get("id").and_then(Value::as_str).unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_create_keeps_provided_id() {
        let store = InMemoryStore::new();

        let created = store
            .create("member_type", json!({"id": "BASIC", "discount": 2.5}))
            .await
            .unwrap();

        assert_eq!(created["id"], json!("BASIC"));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let store = InMemoryStore::new();
        store
            .create("member_type", json!({"id": "BASIC"}))
            .await
            .unwrap();

        let result = store.create("member_type", json!({"id": "BASIC"})).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_find_many_with_filter() {
        let store = InMemoryStore::new();
        let a = Uuid::new_v4().to_string();
        let b = Uuid::new_v4().to_string();
        store
            .seed(
                "subscription",
                vec![
                    json!({"id": Uuid::new_v4().to_string(), "subscriberId": a, "authorId": b}),
                    json!({"id": Uuid::new_v4().to_string(), "subscriberId": b, "authorId": a}),
                ],
            )
            .unwrap();

        let mut filter = Filter::new();
        filter.insert("subscriberId".to_string(), json!(a));
        let rows = store
            .find_many("subscription", Some(&filter))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["authorId"], json!(b));
    }

    #[tokio::test]
    async fn test_find_many_by_keys_attributes_by_field() {
        let store = InMemoryStore::new();
        let author_a = Uuid::new_v4().to_string();
        let author_b = Uuid::new_v4().to_string();
        let author_c = Uuid::new_v4().to_string();
        store
            .seed(
                "post",
                vec![
                    json!({"id": Uuid::new_v4().to_string(), "title": "one", "authorId": author_a}),
                    json!({"id": Uuid::new_v4().to_string(), "title": "two", "authorId": author_b}),
                    json!({"id": Uuid::new_v4().to_string(), "title": "three", "authorId": author_a}),
                ],
            )
            .unwrap();

        let rows = store
            .find_many_by_keys(
                "post",
                &[author_a.clone(), author_c.clone()],
                "authorId",
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert!(
            rows.iter()
                .all(|row| row["authorId"] == json!(author_a.clone()))
        );
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = InMemoryStore::new();
        let created = store
            .create("post", json!({"title": "draft", "content": "..."}))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let updated = store
            .update("post", &id, json!({"title": "final"}))
            .await
            .unwrap();

        assert_eq!(updated["title"], json!("final"));
        assert_eq!(updated["content"], json!("..."));
        assert_eq!(updated["id"], json!(id));
    }

    #[tokio::test]
    async fn test_update_missing_record_errors() {
        let store = InMemoryStore::new();
        let result = store
            .update("post", &Uuid::new_v4().to_string(), json!({"title": "x"}))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_returns_removed_record() {
        let store = InMemoryStore::new();
        let created = store.create("user", json!({"name": "Bob"})).await.unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let removed = store.delete("user", &id).await.unwrap();
        assert_eq!(removed["name"], json!("Bob"));

        let rows = store.find_many("user", None).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_record_errors() {
        let store = InMemoryStore::new();
        let result = store.delete("user", &Uuid::new_v4().to_string()).await;
        assert!(result.is_err());
    }
}
