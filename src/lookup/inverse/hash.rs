//! FNV-1 bucket index, the fallback inverse strategy
//!
//! Payload layout (u32 little-endian):
//!
//! ```text
//! [0][end of bucket 0][end of bucket 1]...[end of bucket 2^bits - 1]   2^bits + 1 values
//! [doc ids grouped by bucket]                                           count values
//! ```
//!
//! A lookup hashes the docno, scans the doc ids of its bucket and confirms
//! each candidate by decoding it through the forward lookup.

use super::{InverseConfig, ReverseIndex};
use crate::container::Payload;
use crate::error::{Error, Result};
use crate::lookup::forward::ForwardLookup;
use crate::types::DocIdx;
use crate::utils::{FNV1_32_NAME, fnv1_32};
use ahash::AHashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const NAME: &str = "hash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashConfig {
    pub hash_bits: u32,
    pub hash_fn: String,
}

/// u32 array either mapped from the file or built in memory
#[derive(Debug, Clone)]
enum U32Array {
    Mapped(Payload),
    Owned(Vec<u32>),
}

impl U32Array {
    #[inline]
    fn get(&self, i: usize) -> u32 {
        match self {
            U32Array::Mapped(payload) => {
                let b = &payload.bytes()[i * 4..i * 4 + 4];
                u32::from_le_bytes([b[0], b[1], b[2], b[3]])
            }
            U32Array::Owned(values) => values[i],
        }
    }

    fn write_le(&self, out: &mut Vec<u8>) {
        match self {
            U32Array::Mapped(payload) => out.extend_from_slice(payload.bytes()),
            U32Array::Owned(values) => {
                out.reserve(values.len() * 4);
                for value in values {
                    out.extend_from_slice(&value.to_le_bytes());
                }
            }
        }
    }
}

/// Number of hash bits for `count` docnos: the smallest power of two
/// bucket count that is at least `count`
pub fn hash_bits_for(count: u64) -> u32 {
    if count <= 1 {
        0
    } else {
        64 - (count - 1).leading_zeros()
    }
}

#[derive(Debug, Clone)]
pub struct HashIndex {
    hash_bits: u32,
    count: usize,
    offsets: U32Array,
    doc_ids: U32Array,
}

impl HashIndex {
    pub fn open(config: &HashConfig, payload: Payload, count: usize) -> Result<Self> {
        if config.hash_fn != FNV1_32_NAME {
            return Err(Error::UnknownFormat(format!("hash function {}", config.hash_fn)));
        }
        if config.hash_bits > 32 {
            return Err(Error::Corruption(format!(
                "hash index has {} bits, more than a 32-bit hash provides",
                config.hash_bits
            )));
        }
        let table_len = (1usize << config.hash_bits) + 1;
        let table_bytes = table_len * 4;
        let ids_bytes = count
            .checked_mul(4)
            .ok_or_else(|| Error::Corruption(format!("hash index of {} docnos overflows", count)))?;
        if payload.len() < table_bytes + ids_bytes {
            return Err(Error::Corruption(format!(
                "hash index needs {} payload bytes, found {}",
                table_bytes + ids_bytes,
                payload.len()
            )));
        }
        let offsets = U32Array::Mapped(payload.slice(0..table_bytes)?);
        let doc_ids = U32Array::Mapped(payload.slice(table_bytes..table_bytes + ids_bytes)?);
        let total = offsets.get(table_len - 1) as usize;
        if total != count {
            return Err(Error::Corruption(format!(
                "hash buckets hold {} doc ids, expected {}",
                total, count
            )));
        }
        Ok(Self {
            hash_bits: config.hash_bits,
            count,
            offsets,
            doc_ids,
        })
    }

    /// Hash every docno of `forward`, `batch_size` docnos at a time, and
    /// group the doc ids by bucket
    pub fn build(forward: &ForwardLookup, batch_size: usize) -> Result<Self> {
        let count = forward.len();
        if count > u32::MAX as u64 {
            return Err(Error::Internal(format!(
                "hash index holds u32 doc ids, cannot index {} docnos",
                count
            )));
        }
        let hash_bits = hash_bits_for(count);
        let mask = ((1u64 << hash_bits) - 1) as u32;
        let buckets_len = 1usize << hash_bits;

        let mut buckets: Vec<u32> = Vec::with_capacity(count as usize);
        let batch_size = batch_size.max(1) as u64;
        for start in (0..count).step_by(batch_size as usize) {
            let chunk: Vec<DocIdx> = (start..count.min(start + batch_size)).collect();
            let batch = forward.lookup(&chunk)?;
            let hashed: Vec<u32> = (0..batch.len())
                .into_par_iter()
                .map(|i| fnv1_32(batch.get(i)) & mask)
                .collect();
            buckets.extend(hashed);
        }

        // counting sort of doc ids by bucket, stable within a bucket
        let mut offsets = vec![0u32; buckets_len + 1];
        for &bucket in &buckets {
            offsets[bucket as usize + 1] += 1;
        }
        for i in 1..offsets.len() {
            offsets[i] += offsets[i - 1];
        }
        let mut cursor = offsets[..buckets_len].to_vec();
        let mut doc_ids = vec![0u32; buckets.len()];
        for (doc, &bucket) in buckets.iter().enumerate() {
            let slot = &mut cursor[bucket as usize];
            doc_ids[*slot as usize] = doc as u32;
            *slot += 1;
        }

        let index = Self {
            hash_bits,
            count: count as usize,
            offsets: U32Array::Owned(offsets),
            doc_ids: U32Array::Owned(doc_ids),
        };
        let duplicates = index.count_duplicates(forward)?;
        if duplicates > 0 {
            warn!(
                duplicates,
                "duplicate docnos found; inverse lookups of them resolve to an arbitrary index"
            );
        }
        debug!(hash_bits, docnos = count, "built hash inverse index");
        Ok(index)
    }

    #[inline]
    fn bucket(&self, docno: &[u8]) -> (usize, usize) {
        let mask = ((1u64 << self.hash_bits) - 1) as u32;
        let bucket = (fnv1_32(docno) & mask) as usize;
        let start = self.offsets.get(bucket) as usize;
        let end = (self.offsets.get(bucket + 1) as usize).min(self.count);
        (start, end)
    }

    /// Docnos sharing a bucket with an equal docno
    fn count_duplicates(&self, forward: &ForwardLookup) -> Result<usize> {
        let per_bucket = (0..1usize << self.hash_bits)
            .into_par_iter()
            .map(|bucket| {
                let start = self.offsets.get(bucket) as usize;
                let end = self.offsets.get(bucket + 1) as usize;
                if end - start < 2 {
                    return Ok(0);
                }
                let ids: Vec<DocIdx> = (start..end).map(|i| self.doc_ids.get(i) as DocIdx).collect();
                let docnos = forward.lookup(&ids)?;
                let mut seen = AHashSet::with_capacity(ids.len());
                Ok(docnos.iter().filter(|docno| !seen.insert(*docno)).count())
            })
            .collect::<Result<Vec<usize>>>()?;
        Ok(per_bucket.into_iter().sum())
    }
}

impl ReverseIndex for HashIndex {
    fn config(&self) -> InverseConfig {
        InverseConfig::Hash(HashConfig {
            hash_bits: self.hash_bits,
            hash_fn: FNV1_32_NAME.to_string(),
        })
    }

    fn lookup_into(&self, forward: &ForwardLookup, docnos: &[&[u8]], out: &mut [i64]) -> Result<()> {
        let mut pos = Vec::with_capacity(docnos.len());
        let mut end = Vec::with_capacity(docnos.len());
        for docno in docnos {
            let (start, stop) = self.bucket(docno);
            pos.push(start);
            end.push(stop);
        }

        // every round checks one candidate for each docno still searching
        let mut searching: Vec<usize> = (0..docnos.len()).filter(|&q| pos[q] < end[q]).collect();
        while !searching.is_empty() {
            let candidates: Vec<DocIdx> = searching
                .iter()
                .map(|&q| self.doc_ids.get(pos[q]) as DocIdx)
                .collect();
            let decoded = forward.lookup(&candidates)?;
            let mut next = Vec::with_capacity(searching.len());
            for (k, &q) in searching.iter().enumerate() {
                if decoded.get(k) == docnos[q] {
                    out[q] = candidates[k] as i64;
                } else {
                    pos[q] += 1;
                    if pos[q] < end[q] {
                        next.push(q);
                    }
                }
            }
            searching = next;
        }
        Ok(())
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        self.offsets.write_le(out);
        self.doc_ids.write_le(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FixedBytesBlock, FixedBytesConfig, ForwardBlock};
    use crate::types::NOT_FOUND;

    fn fixed(docnos: &[&str]) -> ForwardLookup {
        let length = docnos.iter().map(|d| d.len()).max().unwrap_or(0);
        let mut payload = Vec::new();
        for docno in docnos {
            payload.extend_from_slice(docno.as_bytes());
            payload.resize(payload.len() + length - docno.len(), 0);
        }
        let config = FixedBytesConfig {
            length,
            prefix: String::new(),
        };
        let block = FixedBytesBlock::open(&config, Payload::from_bytes(&payload), docnos.len()).unwrap();
        ForwardLookup::new(vec![ForwardBlock::FixedBytes(block)])
    }

    #[test]
    fn test_hash_bits() {
        assert_eq!(hash_bits_for(0), 0);
        assert_eq!(hash_bits_for(1), 0);
        assert_eq!(hash_bits_for(2), 1);
        assert_eq!(hash_bits_for(5), 3);
        assert_eq!(hash_bits_for(8), 3);
        assert_eq!(hash_bits_for(9), 4);
    }

    #[test]
    fn test_build_and_lookup() {
        let docnos = ["ABC", "123", "zz", "q", "hello", "world"];
        let forward = fixed(&docnos);
        let index = HashIndex::build(&forward, 4).unwrap();
        assert_eq!(index.hash_bits, 3);

        let queries: Vec<&[u8]> = vec![b"world", b"ABC", b"missing", b"q"];
        let mut out = vec![NOT_FOUND; queries.len()];
        index.lookup_into(&forward, &queries, &mut out).unwrap();
        assert_eq!(out, vec![5, 0, -1, 3]);
    }

    #[test]
    fn test_payload_reopens() {
        let forward = fixed(&["a", "b", "c"]);
        let built = HashIndex::build(&forward, 2).unwrap();
        let mut payload = Vec::new();
        built.write_payload(&mut payload);
        assert_eq!(payload.len(), 4 * ((1 << 2) + 1 + 3));
        assert_eq!(&payload[..4], &[0, 0, 0, 0]);

        let InverseConfig::Hash(config) = built.config() else {
            panic!("expected hash config");
        };
        let reopened = HashIndex::open(&config, Payload::from_bytes(&payload), 3).unwrap();
        let queries: Vec<&[u8]> = vec![b"c", b"a", b"d"];
        let mut out = vec![NOT_FOUND; 3];
        reopened.lookup_into(&forward, &queries, &mut out).unwrap();
        assert_eq!(out, vec![2, 0, -1]);

        assert!(HashIndex::open(&config, Payload::from_bytes(&payload[..20]), 3).is_err());
    }

    #[test]
    fn test_duplicates_still_resolve() {
        let forward = fixed(&["dup", "x", "dup"]);
        let index = HashIndex::build(&forward, 10).unwrap();
        assert_eq!(index.count_duplicates(&forward).unwrap(), 1);
        let mut out = vec![NOT_FOUND; 1];
        let queries: Vec<&[u8]> = vec![b"dup"];
        index.lookup_into(&forward, &queries, &mut out).unwrap();
        assert!(out[0] == 0 || out[0] == 2);
    }

    #[test]
    fn test_unknown_hash_fn() {
        let config = HashConfig {
            hash_bits: 0,
            hash_fn: "murmur3".to_string(),
        };
        let err = HashIndex::open(&config, Payload::from_bytes(&[0; 8]), 0).unwrap_err();
        assert!(matches!(err, Error::UnknownFormat(_)));
    }
}
