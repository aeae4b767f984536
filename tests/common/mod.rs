//! helper methods for the tests
use anyhow::Result;
use entries_chunker::{
    cache::CachedEntriesChunker,
    chunk::EntryChunk,
    key::Key,
    store::{MemStore, Store},
};
use futures::TryStreamExt;
use libipld::{
    multihash::{Code, Multihash, MultihashDigest},
    Cid,
};

#[allow(dead_code)]
pub fn digest(data: impl AsRef<[u8]>) -> Multihash {
    Code::Sha2_256.digest(data.as_ref())
}

/// `n` distinct multihashes, deterministic per tag.
#[allow(dead_code)]
pub fn digests(tag: &str, n: usize) -> Vec<Multihash> {
    (0..n).map(|i| digest(format!("{}-{}", tag, i))).collect()
}

#[allow(dead_code)]
pub fn entries(mhs: &[Multihash]) -> impl Iterator<Item = Result<Multihash>> + '_ {
    mhs.iter().cloned().map(Ok)
}

/// Walks the chain at `root` through the cache's raw read path, returning
/// the entries of each block, root first.
#[allow(dead_code)]
pub async fn traverse<S: Store>(
    cache: &CachedEntriesChunker<S>,
    root: &Cid,
) -> Result<Vec<Vec<Multihash>>> {
    let mut blocks = Vec::new();
    let mut next = Some(*root);
    while let Some(link) = next {
        let bytes = cache
            .get_raw_chunk(&link)
            .await?
            .ok_or_else(|| anyhow::anyhow!("chunk {} not cached", link))?;
        let chunk = EntryChunk::decode(&bytes)?;
        next = chunk.next;
        blocks.push(chunk.entries);
    }
    Ok(blocks)
}

/// The links of every block in the chain at `root`, root first.
#[allow(dead_code)]
pub async fn links_of<S: Store>(cache: &CachedEntriesChunker<S>, root: &Cid) -> Result<Vec<Cid>> {
    let mut links = Vec::new();
    let mut next = Some(*root);
    while let Some(link) = next {
        links.push(link);
        let bytes = cache
            .get_raw_chunk(&link)
            .await?
            .ok_or_else(|| anyhow::anyhow!("chunk {} not cached", link))?;
        next = EntryChunk::decode(&bytes)?.next;
    }
    Ok(links)
}

#[allow(dead_code)]
pub fn flatten(blocks: Vec<Vec<Multihash>>) -> Vec<Multihash> {
    blocks.into_iter().flatten().collect()
}

#[allow(dead_code)]
pub async fn keys_with_prefix(store: &MemStore, prefix: &str) -> Result<Vec<Key>> {
    store.query_keys(prefix).try_collect().await
}

/// The keys of chunk blocks, i.e. everything outside the marker namespaces.
#[allow(dead_code)]
pub async fn chunk_keys(store: &MemStore) -> Result<Vec<Key>> {
    Ok(keys_with_prefix(store, "")
        .await?
        .into_iter()
        .filter(|key| !key.as_str().starts_with('/'))
        .collect())
}
