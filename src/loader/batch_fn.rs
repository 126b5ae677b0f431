use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Bulk-fetch function backing one [`Loader`](super::Loader) key-space.
///
/// Receives the deduplicated keys of one batching window in first-load order
/// and returns the values it found, keyed so the loader can attribute each
/// value back to its requester regardless of backing-store row order. Keys
/// absent from the returned map resolve as absent; callers decide what
/// absence means (a missing one-to-one row, an empty one-to-many set).
///
/// Returning `Err` fails the whole window: every `load` future pending in it
/// receives the same [`DispatchError`](crate::core::DispatchError).
#[async_trait]
pub trait BatchFn<K, V>: Send + Sync {
    async fn load(&self, keys: &[K]) -> Result<HashMap<K, V>>;
}
