//! Per-key-space batch loading and request-scoped caching
//!
//! A [`Loader`] coalesces the individual `load` calls issued during one
//! synchronous burst of resolver work into a single bulk fetch, and caches
//! every settled result for the lifetime of the owning resolution context.
//! One loader instance covers one key-space (one association kind); keys are
//! never compared across loaders.
//!
//! The loader is split between a cheap cloneable-per-call handle and a
//! worker task that owns all mutable state. Handles enqueue operations on an
//! unbounded channel; the worker drains the channel synchronously before
//! each dispatch, which makes "everything enqueued before the engine
//! yielded" the batching window without any timer or explicit flush call.

mod batch_fn;
mod op;
mod worker;

pub use batch_fn::BatchFn;
pub use op::LoadResult;

use std::hash::Hash;

use tokio::sync::{mpsc, oneshot};

use crate::core::DispatchError;
use op::LoaderOp;
use worker::LoaderWorker;

/// Handle to one key-space's batching worker.
///
/// `load` returns immediately-awaitable futures that settle when the
/// worker's next batch dispatch (or the cache) produces a result. Repeated
/// loads of one key share a single fetch and settle to the same outcome,
/// including a failed window's error.
pub struct Loader<K, V> {
    key_space: &'static str,
    request_tx: mpsc::UnboundedSender<LoaderOp<K, V>>,
    worker_handle: tokio::task::JoinHandle<()>,
}

impl<K, V> Drop for Loader<K, V> {
    fn drop(&mut self) {
        self.worker_handle.abort();
    }
}

impl<K, V> Loader<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Spawn the worker for `key_space` around the given batch function.
    pub fn new<F>(key_space: &'static str, batch_fn: F) -> Self
    where
        F: BatchFn<K, V> + 'static,
    {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        Self {
            key_space,
            request_tx,
            worker_handle: tokio::task::spawn(
                LoaderWorker::new(key_space, batch_fn, request_rx).run(),
            ),
        }
    }

    /// Load the value for `key`, batching with every other load issued in
    /// the current window.
    ///
    /// Resolves to `Ok(None)` when the batch function reported no value for
    /// the key, and to `Err` when the key's window failed as a whole.
    pub async fn load(&self, key: K) -> LoadResult<V> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(LoaderOp::Load(key, reply_tx))?;
        reply_rx
            .await
            .map_err(|_| self.terminated())?
    }

    /// Load a list of keys through the same window.
    ///
    /// Convenience over [`load`](Self::load): all futures are created before
    /// any is awaited, so the keys land in one batch.
    pub async fn load_many(&self, keys: Vec<K>) -> Vec<LoadResult<V>> {
        futures::future::join_all(keys.into_iter().map(|key| self.load(key))).await
    }

    /// Seed the cache with a value already obtained elsewhere.
    ///
    /// Silently skipped when a result for `key` is already cached or in
    /// flight, so priming can never clobber a real fetch.
    pub fn prime(&self, key: K, value: V) {
        let _ = self.send(LoaderOp::Prime(key, value));
    }

    /// Seed the cache with many values at once.
    pub fn prime_many(&self, entries: Vec<(K, V)>) {
        let _ = self.send(LoaderOp::PrimeMany(entries));
    }

    fn send(&self, op: LoaderOp<K, V>) -> Result<(), DispatchError> {
        self.request_tx.send(op).map_err(|_| self.terminated())
    }

    fn terminated(&self) -> DispatchError {
        DispatchError::new(
            self.key_space,
            &anyhow::anyhow!("loader worker terminated"),
        )
    }
}
