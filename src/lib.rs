//! # Entries chunker
//!
//! A durable, bounded cache of *entry chunk chains*. An entry chunk is a
//! block holding up to a configured number of multihashes plus an optional
//! link to the next chunk; a chain is a linked list of such blocks,
//! identified by the link of its head. Chunking the same logical entries
//! over and over is wasteful, so the chains are persisted in a backing
//! key-value store and kept alive by a least-recently-used policy over whole
//! chains, not individual chunks.
//!
//! ## Content addressing and overlap
//!
//! Chunks are dag-cbor encoded and addressed by the sha2-256 digest of their
//! encoded bytes. The encoding is deterministic, so two chains that end in
//! the same entries produce byte-identical tail blocks with identical links.
//! Such shared blocks are stored once and reference-counted: a per-block
//! overlap counter records how many cached chains own the block beyond the
//! first. A shared block survives eviction until the last chain that
//! references it is evicted.
//!
//! ## Durability
//!
//! Every cached chain leaves a root marker in the backing store. On
//! construction the cache restores itself by enumerating the root markers
//! and re-traversing their chains; a store with no root markers at all is
//! considered stale and is pruned. Within a single publish, blocks are
//! written tail to head and the root marker is written last, so a crash
//! leaves either a complete, discoverable chain or an unreferenced partial
//! one that a later restore reclaims.
//!
//! The backing store is externally owned. [`CachedEntriesChunker::close`]
//! flushes it but never closes it.
pub mod cache;
pub mod chunk;
pub mod error;
pub mod key;
mod lru;
pub mod store;

pub use cache::CachedEntriesChunker;
pub use error::Error;
