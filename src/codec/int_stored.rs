//! Prefix followed by arbitrary integers, stored little-endian at the
//! smallest power-of-two width covering every seeded value.

use super::numeric::{decimal_len, parse_canonical, push_decimal, split_digits};
use super::{DecodeBlock, ForwardCodec, ForwardConfig, check_payload};
use crate::container::Payload;
use crate::error::{Error, Result};
use crate::utils::{push_uint_le, uint_le, uint_width};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const NAME: &str = "intstored";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntStoredConfig {
    pub prefix: String,
    pub int_bytes: usize,
}

#[derive(Debug, Default)]
pub struct IntStoredCodec {
    prefix: Option<Vec<u8>>,
    int_bytes: usize,
}

impl IntStoredCodec {
    fn parse<'a>(docno: &'a [u8]) -> Option<(&'a [u8], u64)> {
        let (prefix, digits) = split_digits(docno)?;
        Some((prefix, parse_canonical(digits)?))
    }
}

impl ForwardCodec for IntStoredCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn seed(&mut self, docno: &[u8]) -> bool {
        let Some((prefix, number)) = Self::parse(docno) else {
            return false;
        };
        match &self.prefix {
            Some(locked) if locked.as_slice() != prefix => return false,
            Some(_) => {}
            None => {
                if std::str::from_utf8(prefix).is_err() {
                    return false;
                }
                self.prefix = Some(prefix.to_vec());
            }
        }
        self.int_bytes = self.int_bytes.max(uint_width(number));
        true
    }

    fn reset(&mut self) {
        self.prefix = None;
        self.int_bytes = 0;
    }

    fn size(&self) -> usize {
        self.int_bytes
    }

    fn config(&self) -> Option<ForwardConfig> {
        let prefix = self.prefix.as_deref()?;
        Some(ForwardConfig::IntStored(IntStoredConfig {
            prefix: String::from_utf8_lossy(prefix).into_owned(),
            int_bytes: self.int_bytes,
        }))
    }

    fn encode(&mut self, docno: &[u8], out: &mut Vec<u8>) -> bool {
        let (Some(locked), Some((prefix, number))) = (&self.prefix, Self::parse(docno)) else {
            return false;
        };
        if locked.as_slice() != prefix || uint_width(number) > self.int_bytes {
            return false;
        }
        push_uint_le(number, self.int_bytes, out);
        true
    }
}

#[derive(Debug, Clone)]
pub struct IntStoredBlock {
    prefix: Vec<u8>,
    int_bytes: usize,
    count: usize,
    payload: Payload,
}

impl IntStoredBlock {
    pub fn open(config: &IntStoredConfig, payload: Payload, count: usize) -> Result<Self> {
        if !matches!(config.int_bytes, 1 | 2 | 4 | 8) {
            return Err(Error::Corruption(format!(
                "{} block has unsupported int_bytes {}",
                NAME, config.int_bytes
            )));
        }
        check_payload(NAME, &payload, config.int_bytes, count)?;
        Ok(Self {
            prefix: config.prefix.as_bytes().to_vec(),
            int_bytes: config.int_bytes,
            count,
            payload,
        })
    }

    /// Stored integer at `pos`
    #[inline]
    pub fn value(&self, pos: usize) -> u64 {
        let start = pos * self.int_bytes;
        uint_le(&self.payload.bytes()[start..start + self.int_bytes])
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// True if the stored integers strictly increase with position, which
    /// makes them binary searchable
    pub fn is_strictly_increasing(&self) -> bool {
        (1..self.count).all(|pos| self.value(pos - 1) < self.value(pos))
    }

    /// Position of `docno` by binary search; only meaningful when the block
    /// is strictly increasing
    pub fn position_of(&self, docno: &[u8]) -> Option<u64> {
        let (prefix, digits) = split_digits(docno)?;
        if prefix != self.prefix.as_slice() {
            return None;
        }
        let number = parse_canonical(digits)?;
        let (mut lo, mut hi) = (0, self.count);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.value(mid).cmp(&number) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Some(mid as u64),
            }
        }
        None
    }
}

impl DecodeBlock for IntStoredBlock {
    fn len(&self) -> usize {
        self.count
    }

    #[inline]
    fn decode_into(&self, pos: usize, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.prefix);
        push_decimal(self.value(pos), 0, out);
    }

    fn width_hint(&self) -> usize {
        let max = u64::MAX >> (64 - 8 * self.int_bytes as u32);
        self.prefix.len() + decimal_len(max)
    }

    fn config(&self) -> ForwardConfig {
        ForwardConfig::IntStored(IntStoredConfig {
            prefix: String::from_utf8_lossy(&self.prefix).into_owned(),
            int_bytes: self.int_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_all(docnos: &[&[u8]]) -> (IntStoredCodec, Vec<u8>) {
        let mut codec = IntStoredCodec::default();
        for docno in docnos {
            assert!(codec.seed(docno));
        }
        let mut out = Vec::new();
        for docno in docnos {
            assert!(codec.encode(docno, &mut out));
        }
        (codec, out)
    }

    #[test]
    fn test_width_only_grows() {
        let mut codec = IntStoredCodec::default();
        assert!(codec.seed(b"D300"));
        assert_eq!(codec.size(), 2);
        assert!(codec.seed(b"D1"));
        assert_eq!(codec.size(), 2);
        assert!(codec.seed(b"D70000"));
        assert_eq!(codec.size(), 4);
        assert!(!codec.seed(b"E1"));
        assert!(!codec.seed(b"D01"));
    }

    #[test]
    fn test_encode_rejects_wider_values() {
        let (mut codec, out) = encode_all(&[b"5", b"250"]);
        assert_eq!(out, vec![5, 250]);
        let mut more = Vec::new();
        assert!(!codec.encode(b"256", &mut more));
        assert!(more.is_empty());
    }

    #[test]
    fn test_block_decode_without_prefix() {
        let (codec, out) = encode_all(&[b"2", b"1"]);
        let Some(ForwardConfig::IntStored(config)) = codec.config() else {
            panic!("expected intstored config");
        };
        assert_eq!(config.prefix, "");
        let block = IntStoredBlock::open(&config, Payload::from_bytes(&out), 2).unwrap();
        let mut docno = Vec::new();
        block.decode_into(0, &mut docno);
        assert_eq!(docno, b"2");
        assert!(!block.is_strictly_increasing());
    }

    #[test]
    fn test_block_binary_search() {
        let (codec, out) = encode_all(&[b"D2", b"D10", b"D4000"]);
        let Some(ForwardConfig::IntStored(config)) = codec.config() else {
            panic!("expected intstored config");
        };
        let block = IntStoredBlock::open(&config, Payload::from_bytes(&out), 3).unwrap();
        assert!(block.is_strictly_increasing());
        assert_eq!(block.position_of(b"D2"), Some(0));
        assert_eq!(block.position_of(b"D4000"), Some(2));
        assert_eq!(block.position_of(b"D3"), None);
        assert_eq!(block.position_of(b"D010"), None);
        assert_eq!(block.position_of(b"E10"), None);
        assert_eq!(block.width_hint(), 1 + 5);
    }

    #[test]
    fn test_short_payload_rejected() {
        let config = IntStoredConfig {
            prefix: String::new(),
            int_bytes: 4,
        };
        assert!(IntStoredBlock::open(&config, Payload::from_bytes(&[0; 7]), 2).is_err());
        let bad_width = IntStoredConfig {
            prefix: String::new(),
            int_bytes: 3,
        };
        assert!(IntStoredBlock::open(&bad_width, Payload::from_bytes(&[0; 6]), 2).is_err());
    }
}
