use libipld::Cid;

/// Failure modes of the cache itself.
///
/// Store and codec failures are propagated verbatim as [`anyhow::Error`] by
/// the operations that hit them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,

    #[error("Capacity must be at least 1")]
    InvalidCapacity,

    #[error("Cannot chunk an empty sequence of multihashes")]
    EmptyEntries,

    #[error("Not a root marker key: {}", .0)]
    NotARootKey(String),

    #[error("Broken chain with root {}: missing chunk {}", .root, .missing)]
    BrokenChain { root: Cid, missing: Cid },

    #[error("Overlap counter must be 8 bytes, got {}", .0)]
    BadOverlapCounter(usize),
}
