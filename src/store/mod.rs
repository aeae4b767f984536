//! interface to the backing key-value store
use crate::key::Key;
use anyhow::Result;
use futures::{future::BoxFuture, stream::BoxStream};
use std::sync::Arc;

mod mem_store;

pub use mem_store::MemStore;

/// Read and write access to the key-value store backing the cache.
///
/// Atomicity is per operation; `sync` is expected to flush previous writes
/// to durable media. Absence of a key is `Ok(None)` from `get`, never an
/// error. `query_keys` yields the keys present when it was called; it must
/// tolerate the caller deleting yielded keys while the stream is live.
///
/// The store is externally owned and may be shared with concurrent readers;
/// the cache never closes it.
pub trait Store: Send + Sync {
    fn has<'a>(&'a self, key: &'a Key) -> BoxFuture<'a, Result<bool>>;

    fn get<'a>(&'a self, key: &'a Key) -> BoxFuture<'a, Result<Option<Box<[u8]>>>>;

    fn put<'a>(&'a self, key: &'a Key, value: Vec<u8>) -> BoxFuture<'a, Result<()>>;

    fn delete<'a>(&'a self, key: &'a Key) -> BoxFuture<'a, Result<()>>;

    /// Streams all keys that start with `prefix`. An empty prefix matches
    /// every key.
    fn query_keys<'a>(&'a self, prefix: &'a str) -> BoxStream<'a, Result<Key>>;

    fn sync(&self) -> BoxFuture<'_, Result<()>>;
}

/// A store behind an `Arc`, so callers can avoid just another type parameter.
pub type ArcStore = Arc<dyn Store + Send + Sync + 'static>;

impl Store for ArcStore {
    fn has<'a>(&'a self, key: &'a Key) -> BoxFuture<'a, Result<bool>> {
        self.as_ref().has(key)
    }

    fn get<'a>(&'a self, key: &'a Key) -> BoxFuture<'a, Result<Option<Box<[u8]>>>> {
        self.as_ref().get(key)
    }

    fn put<'a>(&'a self, key: &'a Key, value: Vec<u8>) -> BoxFuture<'a, Result<()>> {
        self.as_ref().put(key, value)
    }

    fn delete<'a>(&'a self, key: &'a Key) -> BoxFuture<'a, Result<()>> {
        self.as_ref().delete(key)
    }

    fn query_keys<'a>(&'a self, prefix: &'a str) -> BoxStream<'a, Result<Key>> {
        self.as_ref().query_keys(prefix)
    }

    fn sync(&self) -> BoxFuture<'_, Result<()>> {
        self.as_ref().sync()
    }
}
