//! Backing-store interface consumed by the engine
//!
//! The engine only ever talks to persistence through [`DataStore`]; how
//! records are stored is a backend concern. Records cross the boundary as
//! `serde_json::Value` objects so the engine stays agnostic to entity
//! shapes.

pub mod in_memory;

pub use in_memory::InMemoryStore;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Field-equality filter: every named field must equal the given value.
pub type Filter = serde_json::Map<String, Value>;

/// Abstract record store with bulk lookup by key set.
///
/// `find_many_by_keys` is the loader-facing operation: it returns every
/// record whose `foreign_key_field` is in `keys`, in whatever order the
/// backend produces them. Callers group the rows by that field to attribute
/// them back to keys; nothing may rely on row order.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// List records of a kind, optionally restricted by field equality.
    async fn find_many(&self, entity_kind: &str, filter: Option<&Filter>) -> Result<Vec<Value>>;

    /// Fetch every record whose `foreign_key_field` value is in `keys`.
    async fn find_many_by_keys(
        &self,
        entity_kind: &str,
        keys: &[String],
        foreign_key_field: &str,
    ) -> Result<Vec<Value>>;

    /// Insert a record, generating an id when the data carries none.
    /// Returns the stored record.
    async fn create(&self, entity_kind: &str, data: Value) -> Result<Value>;

    /// Merge `data` into the record with the given id. Returns the updated
    /// record; errors when the record does not exist.
    async fn update(&self, entity_kind: &str, id: &str, data: Value) -> Result<Value>;

    /// Remove the record with the given id. Returns the removed record;
    /// errors when the record does not exist.
    async fn delete(&self, entity_kind: &str, id: &str) -> Result<Value>;
}
