//! the serialized form of a chunk of entries
use anyhow::{anyhow, Result};
use libipld::{
    cbor::DagCborCodec,
    codec::Codec,
    multihash::{Code, Multihash, MultihashDigest},
    Cid, Ipld,
};
use std::collections::BTreeMap;

/// multicodec code for dag-cbor, the codec of chunk links
const DAG_CBOR: u64 = 0x71;

/// One block in a chain of entry chunks.
///
/// Holds up to the configured number of multihashes and an optional link to
/// the next block in the chain. The last block of a chain has no `next`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChunk {
    pub entries: Vec<Multihash>,
    pub next: Option<Cid>,
}

impl EntryChunk {
    pub fn new(entries: Vec<Multihash>, next: Option<Cid>) -> Self {
        Self { entries, next }
    }

    /// Serializes the chunk and computes its link.
    ///
    /// The encoding is deterministic dag-cbor: equal entries and next produce
    /// byte-identical output and therefore an identical link. Overlap
    /// detection between chains rests entirely on this.
    pub fn encode(&self) -> Result<(Vec<u8>, Cid)> {
        let bytes = DagCborCodec.encode(&self.to_ipld())?;
        let link = Cid::new_v1(DAG_CBOR, Code::Sha2_256.digest(&bytes));
        Ok((bytes, link))
    }

    /// Decodes a chunk from its serialized form.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::from_ipld(DagCborCodec.decode(bytes)?)
    }

    fn to_ipld(&self) -> Ipld {
        let mut map = BTreeMap::new();
        map.insert(
            "Entries".to_string(),
            Ipld::List(
                self.entries
                    .iter()
                    .map(|mh| Ipld::Bytes(mh.to_bytes()))
                    .collect(),
            ),
        );
        // absent, not null, so that a tail block's bytes contain no trace of
        // the field
        if let Some(next) = &self.next {
            map.insert("Next".to_string(), Ipld::Link(*next));
        }
        Ipld::Map(map)
    }

    fn from_ipld(ipld: Ipld) -> Result<Self> {
        let mut map = match ipld {
            Ipld::Map(map) => map,
            other => return Err(anyhow!("expected ipld map, got {:?}", other)),
        };
        let entries = match map.remove("Entries") {
            Some(Ipld::List(items)) => items
                .into_iter()
                .map(|item| match item {
                    Ipld::Bytes(bytes) => Ok(Multihash::from_bytes(&bytes)?),
                    other => Err(anyhow!("expected ipld bytes, got {:?}", other)),
                })
                .collect::<Result<Vec<_>>>()?,
            other => return Err(anyhow!("expected entries list, got {:?}", other)),
        };
        let next = match map.remove("Next") {
            None => None,
            Some(Ipld::Link(link)) => Some(link),
            Some(other) => return Err(anyhow!("expected ipld link, got {:?}", other)),
        };
        Ok(Self { entries, next })
    }
}
