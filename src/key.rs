//! keys of the backing store
use crate::error::Error;
use anyhow::Result;
use libipld::Cid;
use std::fmt;

/// Prefix under which chain root markers are persisted.
pub const ROOT_PREFIX: &str = "/root/";

/// Prefix under which overlap counters are persisted.
pub const OVERLAP_PREFIX: &str = "/overlap/";

/// A key in the backing store.
///
/// A chunk block lives directly under the string form of its link; root
/// markers and overlap counters live under their respective namespaces so
/// they can be enumerated by prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(String);

impl Key {
    /// The key of the chunk block at `link`.
    pub fn chunk(link: &Cid) -> Self {
        Key(link.to_string())
    }

    /// The root marker key for the chain with root `link`.
    pub fn root(link: &Cid) -> Self {
        Key(format!("{}{}", ROOT_PREFIX, link))
    }

    /// The overlap counter key for the block at `link`.
    pub fn overlap(link: &Cid) -> Self {
        Key(format!("{}{}", OVERLAP_PREFIX, link))
    }

    /// Wraps a raw key as returned by a store query.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Key(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recovers the root link from a root marker key.
    pub fn parse_root(&self) -> Result<Cid> {
        let suffix = self
            .0
            .strip_prefix(ROOT_PREFIX)
            .ok_or_else(|| Error::NotARootKey(self.0.clone()))?;
        Ok(Cid::try_from(suffix)?)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
