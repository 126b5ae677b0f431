use tokio::sync::oneshot;

use crate::core::DispatchError;

/// Outcome of one `load`: the value, an absent marker, or the shared
/// failure of the batching window the key was dispatched in.
pub type LoadResult<V> = Result<Option<V>, DispatchError>;

/// Requests sent from a [`Loader`](super::Loader) handle to its worker.
#[derive(Debug)]
pub enum LoaderOp<K, V> {
    /// Fetch a value from the cache or stage the key for the next batch.
    Load(K, oneshot::Sender<LoadResult<V>>),
    /// Seed the cache with a value obtained elsewhere. Skipped silently if
    /// the key is already cached or staged, so an in-flight or resolved
    /// result is never clobbered.
    Prime(K, V),
    PrimeMany(Vec<(K, V)>),
}
