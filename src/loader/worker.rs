use std::collections::HashMap;
use std::hash::Hash;

use futures::future::FutureExt;
use indexmap::IndexMap;
use tokio::sync::{mpsc, oneshot};

use crate::core::DispatchError;
use crate::loader::batch_fn::BatchFn;
use crate::loader::op::{LoadResult, LoaderOp};

/// Single-writer task owning one key-space's cache and pending buffer.
///
/// The worker alternates between three states:
///
/// 1. Idle, awaiting the first request of a window.
/// 2. Draining the request queue synchronously. Every op that was enqueued
///    before the engine yielded control is applied here: primes go straight
///    to the cache, cached loads are answered immediately, uncached loads
///    are staged in the pending buffer. This drain is what delimits one
///    batching window.
/// 3. Dispatching the staged keys to the batch function exactly once, then
///    answering every staged waiter from the outcome.
///
/// All cache and buffer mutation happens inside this task, so the loader
/// needs no locking.
pub(super) struct LoaderWorker<K, V, F> {
    key_space: &'static str,
    batch_fn: F,
    request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>,
    /// Settled results, kept for the lifetime of the owning context.
    /// Window failures are cached like values: a key is fetched at most once.
    cache: HashMap<K, LoadResult<V>>,
    /// Keys staged for the next dispatch, in first-load order with their
    /// waiting reply channels. Insertion order is what the batch function
    /// sees; duplicate loads of one key pile onto the same entry.
    pending: IndexMap<K, Vec<oneshot::Sender<LoadResult<V>>>>,
}

impl<K, V, F> LoaderWorker<K, V, F>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
    F: BatchFn<K, V> + 'static,
{
    pub(super) fn new(
        key_space: &'static str,
        batch_fn: F,
        request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>,
    ) -> Self {
        Self {
            key_space,
            batch_fn,
            request_rx,
            cache: HashMap::new(),
            pending: IndexMap::new(),
        }
    }

    pub(super) async fn run(mut self) {
        loop {
            // Idle until the first op of a window arrives.
            match self.request_rx.recv().await {
                None => return,
                Some(op) => self.apply(op),
            }
            // Flush everything else enqueued in the same burst.
            while let Some(Some(op)) = self.request_rx.recv().now_or_never() {
                self.apply(op);
            }
            if !self.pending.is_empty() {
                self.dispatch().await;
            }
        }
    }

    fn apply(&mut self, op: LoaderOp<K, V>) {
        match op {
            LoaderOp::Load(key, reply) => {
                if let Some(settled) = self.cache.get(&key) {
                    let _ = reply.send(settled.clone());
                } else {
                    self.pending.entry(key).or_default().push(reply);
                }
            }
            LoaderOp::Prime(key, value) => self.prime_entry(key, value),
            LoaderOp::PrimeMany(entries) => {
                for (key, value) in entries {
                    self.prime_entry(key, value);
                }
            }
        }
    }

    fn prime_entry(&mut self, key: K, value: V) {
        // A cached or staged key already has a result on the way; priming
        // it is a silent no-op.
        if self.cache.contains_key(&key) || self.pending.contains_key(&key) {
            return;
        }
        self.cache.insert(key, Ok(Some(value)));
    }

    async fn dispatch(&mut self) {
        let keys: Vec<K> = self.pending.keys().cloned().collect();
        tracing::debug!(
            key_space = self.key_space,
            keys = keys.len(),
            "dispatching batch"
        );

        match self.batch_fn.load(&keys).await {
            Ok(mut loaded) => {
                for (key, waiters) in self.pending.drain(..) {
                    let result: LoadResult<V> = Ok(loaded.remove(&key));
                    for reply in waiters {
                        let _ = reply.send(result.clone());
                    }
                    self.cache.insert(key, result);
                }
            }
            Err(err) => {
                tracing::debug!(key_space = self.key_space, error = %err, "batch failed");
                let failure = DispatchError::new(self.key_space, &err);
                for (key, waiters) in self.pending.drain(..) {
                    for reply in waiters {
                        let _ = reply.send(Err(failure.clone()));
                    }
                    self.cache.insert(key, Err(failure.clone()));
                }
            }
        }
    }
}
