//! the cache of chunked entry chains
use crate::{
    chunk::EntryChunk,
    error::Error,
    key::{Key, ROOT_PREFIX},
    lru::ChainLru,
    store::Store,
};
use anyhow::{Context, Result};
use futures::TryStreamExt;
use libipld::{multihash::Multihash, Cid};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// An LRU cache of entry chunk chains over a backing key-value store.
///
/// [`CachedEntriesChunker::chunk`] turns a sequence of multihashes into a
/// chain of content-addressed entry chunks and persists it. The chunks of a
/// chain are either all cached or not at all. When chains overlap, the
/// shared blocks are stored once and survive until every chain referencing
/// them has been evicted.
///
/// At most `capacity` chains are cached; the capacity counts chains as a
/// unit, not the chunks within them, and is immutable. The least recently
/// published chain is evicted to make room for new ones. The actual storage
/// consumed is a factor of the chunk size, the multihash length and the
/// capacity.
///
/// On construction the cache restores itself from the backing store and
/// prunes the store as needed; if the capacity is smaller than the number of
/// persisted chains, the surplus is evicted in no particular order.
///
/// `chunk` and [`CachedEntriesChunker::clear`] serialize on an internal
/// lock. [`CachedEntriesChunker::get_raw_chunk`] bypasses the lock and reads
/// the store directly, which is safe as long as the store supports
/// concurrent readers and writers.
pub struct CachedEntriesChunker<S> {
    store: S,
    chunk_size: usize,
    capacity: usize,
    /// cached chains in least-recently-published order; doubles as the
    /// single-writer lock, held for the full duration of a mutation
    lru: Mutex<ChainLru>,
}

impl<S: Store> CachedEntriesChunker<S> {
    /// Creates a cache over `store` and restores previously cached chains.
    ///
    /// `chunk_size` is the maximum number of multihashes per chunk,
    /// `capacity` the maximum number of cached chains; both must be at
    /// least 1. Restore failures (a root marker whose chain can no longer
    /// be loaded) fail construction.
    pub async fn new(store: S, chunk_size: usize, capacity: usize) -> Result<Self> {
        if chunk_size < 1 {
            return Err(Error::InvalidChunkSize.into());
        }
        if capacity < 1 {
            return Err(Error::InvalidCapacity.into());
        }
        let cache = Self {
            store,
            chunk_size,
            capacity,
            lru: Mutex::new(ChainLru::new(capacity)),
        };
        cache.restore().await?;
        Ok(cache)
    }

    /// Chunks the multihashes yielded by `entries` into a chain of entry
    /// chunks, stores the chain, and returns the link of its root.
    ///
    /// The input must be finite and non-empty; it is consumed entirely
    /// before anything is written. Blocks are written tail to head, so the
    /// input's trailing multihashes land in the tail block and a partial
    /// block, if any, becomes the head. Traversing the chain from the
    /// returned root yields the multihashes in their original order.
    ///
    /// Publishing a chain that is already cached refreshes its recency and
    /// returns the same root. If the insertion exceeds the capacity, the
    /// least recently published chain is evicted before this call returns;
    /// eviction failures are this call's failures.
    pub async fn chunk<I>(&self, entries: I) -> Result<Cid>
    where
        I: IntoIterator<Item = Result<Multihash>>,
    {
        let mut lru = self.lru.lock().await;

        let mut digests = Vec::new();
        for entry in entries {
            digests.push(entry?);
        }
        if digests.is_empty() {
            return Err(Error::EmptyEntries.into());
        }

        // The head holds the remainder so every other block is full; walking
        // the blocks in reverse yields the tail first.
        let head_len = match digests.len() % self.chunk_size {
            0 => self.chunk_size,
            rem => rem,
        };
        let head_block = &digests[..head_len];
        let full_blocks = digests[head_len..].chunks(self.chunk_size);

        let mut chain_links = Vec::with_capacity(1 + full_blocks.len());
        let mut next: Option<Cid> = None;
        for block in std::iter::once(head_block).chain(full_blocks).rev() {
            let link = self
                .write_chunk(EntryChunk::new(block.to_vec(), next))
                .await?;
            chain_links.push(link);
            next = Some(link);
        }
        let head = next.ok_or(Error::EmptyEntries)?;
        chain_links.reverse();

        for (root, links) in lru.insert(head, chain_links.clone()) {
            self.release_chain(&root, &links).await?;
        }
        self.store.put(&Key::root(&head), Vec::new()).await?;
        self.store.sync().await?;
        debug!(
            entries = digests.len(),
            chunks = chain_links.len(),
            root = %head,
            "chunked entries into a cached chain"
        );
        Ok(head)
    }

    /// Returns the raw bytes of the cached chunk at `link`, or `None` if no
    /// such chunk is cached.
    ///
    /// This is a plain store read; it does not refresh any chain's recency.
    pub async fn get_raw_chunk(&self, link: &Cid) -> Result<Option<Box<[u8]>>> {
        self.store.get(&Key::chunk(link)).await
    }

    /// Evicts every cached chain, deleting all chunk blocks, overlap
    /// counters and root markers from the backing store.
    pub async fn clear(&self) -> Result<()> {
        let mut lru = self.lru.lock().await;
        while let Some((root, links)) = lru.pop() {
            self.release_chain(&root, &links).await?;
        }
        Ok(())
    }

    /// Flushes the backing store.
    ///
    /// The store itself stays open: it is owned by the caller and may be in
    /// use elsewhere.
    pub async fn close(&self) -> Result<()> {
        self.store.sync().await
    }

    /// The number of chains currently cached.
    pub async fn len(&self) -> usize {
        self.lru.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lru.lock().await.is_empty()
    }

    /// The maximum number of chains this cache holds.
    pub fn cap(&self) -> usize {
        self.capacity
    }

    /// Writes a single chunk, deduplicating against blocks already present.
    ///
    /// A block that already exists gains one overlap owner instead of being
    /// written again.
    async fn write_chunk(&self, chunk: EntryChunk) -> Result<Cid> {
        let (bytes, link) = chunk.encode()?;
        let key = Key::chunk(&link);
        if self.store.has(&key).await? {
            self.increment_overlap(&link).await?;
        } else {
            self.store.put(&key, bytes).await?;
        }
        Ok(link)
    }

    /// Releases one displaced chain: blocks shared with other cached chains
    /// lose one owner, blocks owned by this chain alone are deleted, and the
    /// root marker goes away.
    async fn release_chain(&self, root: &Cid, links: &[Cid]) -> Result<()> {
        debug!(root = %root, chunks = links.len(), "evicting cached chain");
        for link in links {
            if self.count_overlap(link).await? == 0 {
                self.store.delete(&Key::chunk(link)).await?;
            } else {
                self.decrement_overlap(link).await?;
            }
        }
        self.store.delete(&Key::root(root)).await?;
        Ok(())
    }

    /// Rebuilds the in-memory chain index from the persisted root markers.
    ///
    /// A store that carries no root markers at all holds nothing worth
    /// keeping, so everything found in it is pruned.
    async fn restore(&self) -> Result<()> {
        let mut lru = self.lru.lock().await;
        let mut restored = 0usize;
        let mut roots = self.store.query_keys(ROOT_PREFIX);
        while let Some(key) = roots
            .try_next()
            .await
            .context("cannot read root marker keys")?
        {
            let root = key.parse_root()?;
            let links = self.traverse_chain(&root).await?;
            for (evicted_root, evicted_links) in lru.insert(root, links) {
                self.release_chain(&evicted_root, &evicted_links).await?;
            }
            restored += 1;
        }
        drop(roots);

        if restored == 0 {
            let stale: Vec<Key> = self.store.query_keys("").try_collect().await?;
            let pruned = stale.len();
            for key in stale {
                self.store.delete(&key).await?;
            }
            if pruned != 0 {
                info!(
                    count = pruned,
                    "store holds no chain roots but is non-empty; pruned lingering entries"
                );
            }
        } else if restored > self.capacity {
            info!(
                persisted = restored,
                capacity = self.capacity,
                "persisted chains exceed the capacity; evicted the surplus"
            );
        } else {
            debug!(restored, capacity = self.capacity, "cache restored");
        }
        Ok(())
    }

    /// Walks the chain at `root` and returns the links of every block in
    /// it, root first. A missing or undecodable block fails the walk.
    async fn traverse_chain(&self, root: &Cid) -> Result<Vec<Cid>> {
        let mut links = Vec::new();
        let mut next = *root;
        loop {
            let bytes = self
                .store
                .get(&Key::chunk(&next))
                .await?
                .ok_or(Error::BrokenChain {
                    root: *root,
                    missing: next,
                })?;
            let chunk = EntryChunk::decode(&bytes)
                .with_context(|| format!("cannot decode entry chunk at {}", next))?;
            links.push(next);
            match chunk.next {
                Some(link) => next = link,
                None => break,
            }
        }
        Ok(links)
    }

    async fn increment_overlap(&self, link: &Cid) -> Result<()> {
        let key = Key::overlap(link);
        let count = match self.store.get(&key).await? {
            Some(value) => decode_overlap(&value)? + 1,
            None => 1,
        };
        self.store.put(&key, count.to_le_bytes().to_vec()).await
    }

    async fn decrement_overlap(&self, link: &Cid) -> Result<()> {
        let key = Key::overlap(link);
        let value = match self.store.get(&key).await? {
            Some(value) => value,
            None => return Ok(()),
        };
        let count = decode_overlap(&value)? - 1;
        if count < 1 {
            self.store.delete(&key).await
        } else {
            self.store.put(&key, count.to_le_bytes().to_vec()).await
        }
    }

    async fn count_overlap(&self, link: &Cid) -> Result<u64> {
        match self.store.get(&Key::overlap(link)).await? {
            Some(value) => decode_overlap(&value),
            None => Ok(0),
        }
    }
}

fn decode_overlap(value: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = value
        .try_into()
        .map_err(|_| Error::BadOverlapCounter(value.len()))?;
    Ok(u64::from_le_bytes(bytes))
}
