//! bookkeeping of cached chains in least-recently-published order
use libipld::Cid;
use lru_cache::LruCache;

/// In-memory index of the cached chains.
///
/// Keys are chain roots, values the links of every block in the chain, so
/// an evicted chain can be cleaned up without re-traversing it. Inserting
/// beyond the capacity displaces the least recently inserted chains, and
/// displaced entries are handed back to the caller rather than dropped, so
/// the caller can release their blocks from the backing store.
///
/// Recency is refreshed by insertion only. This is a contract, not an
/// accident: a chain is hot when it is published, not when its blocks are
/// read back.
pub struct ChainLru {
    // one slot of headroom so an insert can land before the surplus is
    // drained explicitly
    inner: LruCache<Cid, Vec<Cid>>,
    capacity: usize,
}

impl ChainLru {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: LruCache::new(capacity + 1),
            capacity,
        }
    }

    /// Inserts a chain and returns everything displaced by it: the previous
    /// entry under the same root if there was one, then any chains evicted
    /// to respect the capacity, least recent first.
    pub fn insert(&mut self, root: Cid, links: Vec<Cid>) -> Vec<(Cid, Vec<Cid>)> {
        let mut displaced = Vec::new();
        if let Some(previous) = self.inner.remove(&root) {
            displaced.push((root, previous));
        }
        self.inner.insert(root, links);
        while self.inner.len() > self.capacity {
            match self.inner.remove_lru() {
                Some(victim) => displaced.push(victim),
                None => break,
            }
        }
        displaced
    }

    /// Removes and returns the least recently inserted chain.
    pub fn pop(&mut self) -> Option<(Cid, Vec<Cid>)> {
        self.inner.remove_lru()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }
}
