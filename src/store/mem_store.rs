use super::Store;
use crate::key::Key;
use anyhow::{anyhow, Result};
use futures::{
    future::{self, BoxFuture, FutureExt},
    stream::{self, BoxStream, StreamExt},
};
use parking_lot::Mutex;
use std::{collections::BTreeMap, sync::Arc};

/// A MemStore is a pure in memory store. Mostly useful for testing.
///
/// Cloning yields another handle to the same store.
#[derive(Clone, Default)]
pub struct MemStore(Arc<Inner>);

#[derive(Default)]
struct Inner {
    entries: Mutex<BTreeMap<Key, Box<[u8]>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Result<BTreeMap<Key, Box<[u8]>>> {
        let inner = Arc::try_unwrap(self.0).map_err(|_| anyhow!("busy"))?;
        Ok(inner.entries.into_inner())
    }
}

impl Store for MemStore {
    fn has<'a>(&'a self, key: &'a Key) -> BoxFuture<'a, Result<bool>> {
        future::ready(Ok(self.0.entries.lock().contains_key(key))).boxed()
    }

    fn get<'a>(&'a self, key: &'a Key) -> BoxFuture<'a, Result<Option<Box<[u8]>>>> {
        future::ready(Ok(self.0.entries.lock().get(key).cloned())).boxed()
    }

    fn put<'a>(&'a self, key: &'a Key, value: Vec<u8>) -> BoxFuture<'a, Result<()>> {
        self.0.entries.lock().insert(key.clone(), value.into());
        future::ready(Ok(())).boxed()
    }

    fn delete<'a>(&'a self, key: &'a Key) -> BoxFuture<'a, Result<()>> {
        self.0.entries.lock().remove(key);
        future::ready(Ok(())).boxed()
    }

    fn query_keys<'a>(&'a self, prefix: &'a str) -> BoxStream<'a, Result<Key>> {
        let keys: Vec<Key> = self
            .0
            .entries
            .lock()
            .keys()
            .filter(|key| key.as_str().starts_with(prefix))
            .cloned()
            .collect();
        stream::iter(keys.into_iter().map(Ok)).boxed()
    }

    fn sync(&self) -> BoxFuture<'_, Result<()>> {
        future::ready(Ok(())).boxed()
    }
}
