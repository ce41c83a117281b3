//! Common prefix plus a NUL-padded remainder of bounded length. Accepts any
//! docno while seeding, so a seeding round always has a survivor.

use super::{DecodeBlock, ForwardCodec, ForwardConfig, check_payload};
use crate::container::Payload;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const NAME: &str = "fixedbytes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedBytesConfig {
    pub length: usize,
    pub prefix: String,
}

#[derive(Debug, Default)]
pub struct FixedBytesCodec {
    prefix: Option<Vec<u8>>,
    length: usize,
}

/// Longest leading run of `bytes` that is valid UTF-8
fn utf8_boundary(bytes: &[u8]) -> usize {
    match std::str::from_utf8(bytes) {
        Ok(_) => bytes.len(),
        Err(err) => err.valid_up_to(),
    }
}

impl ForwardCodec for FixedBytesCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn seed(&mut self, docno: &[u8]) -> bool {
        let prefix = self.prefix.get_or_insert_with(|| docno.to_vec());
        let common = prefix.iter().zip(docno).take_while(|(a, b)| a == b).count();
        prefix.truncate(common);
        let valid = utf8_boundary(prefix);
        prefix.truncate(valid);
        self.length = self.length.max(docno.len());
        true
    }

    fn reset(&mut self) {
        self.prefix = None;
        self.length = 0;
    }

    fn size(&self) -> usize {
        let prefix = self.prefix.as_ref().map_or(0, Vec::len);
        self.length - prefix
    }

    fn config(&self) -> Option<ForwardConfig> {
        let prefix = self.prefix.as_deref()?;
        Some(ForwardConfig::FixedBytes(FixedBytesConfig {
            length: self.length,
            prefix: String::from_utf8_lossy(prefix).into_owned(),
        }))
    }

    fn encode(&mut self, docno: &[u8], out: &mut Vec<u8>) -> bool {
        let Some(prefix) = self.prefix.as_deref() else {
            return false;
        };
        let Some(rest) = docno.strip_prefix(prefix) else {
            return false;
        };
        if docno.len() > self.length {
            return false;
        }
        let stride = self.length - prefix.len();
        out.extend_from_slice(rest);
        out.resize(out.len() + stride - rest.len(), 0);
        true
    }
}

#[derive(Debug, Clone)]
pub struct FixedBytesBlock {
    config: FixedBytesConfig,
    stride: usize,
    count: usize,
    payload: Payload,
}

impl FixedBytesBlock {
    pub fn open(config: &FixedBytesConfig, payload: Payload, count: usize) -> Result<Self> {
        let stride = config.length.checked_sub(config.prefix.len()).ok_or_else(|| {
            Error::Corruption(format!(
                "{} prefix of {} bytes exceeds length {}",
                NAME,
                config.prefix.len(),
                config.length
            ))
        })?;
        check_payload(NAME, &payload, stride, count)?;
        Ok(Self {
            config: config.clone(),
            stride,
            count,
            payload,
        })
    }
}

impl DecodeBlock for FixedBytesBlock {
    fn len(&self) -> usize {
        self.count
    }

    #[inline]
    fn decode_into(&self, pos: usize, out: &mut Vec<u8>) {
        let slot = &self.payload.bytes()[pos * self.stride..(pos + 1) * self.stride];
        let end = slot.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
        out.extend_from_slice(self.config.prefix.as_bytes());
        out.extend_from_slice(&slot[..end]);
    }

    fn width_hint(&self) -> usize {
        self.config.length
    }

    fn config(&self) -> ForwardConfig {
        ForwardConfig::FixedBytes(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(docnos: &[&[u8]]) -> FixedBytesCodec {
        let mut codec = FixedBytesCodec::default();
        for docno in docnos {
            assert!(codec.seed(docno));
        }
        codec
    }

    #[test]
    fn test_prefix_shrinks_and_length_grows() {
        let codec = seeded(&[b"clueweb-01", b"clueweb-2x", b"clue"]);
        assert_eq!(
            codec.config(),
            Some(ForwardConfig::FixedBytes(FixedBytesConfig {
                length: 10,
                prefix: "clue".to_string(),
            }))
        );
        assert_eq!(codec.size(), 6);
    }

    #[test]
    fn test_prefix_trimmed_to_char_boundary() {
        // "é" is 0xC3 0xA9 and "ê" is 0xC3 0xAA
        let codec = seeded(&["aé".as_bytes(), "aê".as_bytes()]);
        let Some(ForwardConfig::FixedBytes(config)) = codec.config() else {
            panic!("expected fixedbytes config");
        };
        assert_eq!(config.prefix, "a");
        assert_eq!(config.length, 3);
    }

    #[test]
    fn test_encode_pads_and_rejects() {
        let mut codec = seeded(&[b"AB12", b"AB3"]);
        let mut out = Vec::new();
        assert!(codec.encode(b"AB3", &mut out));
        assert_eq!(out, vec![b'3', 0]);
        assert!(!codec.encode(b"XY12", &mut out));
        assert!(!codec.encode(b"AB123", &mut out));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_block_decode_strips_padding() {
        let mut codec = seeded(&[b"ABC", b"123", b"7"]);
        let mut out = Vec::new();
        for docno in [&b"ABC"[..], b"123", b"7"] {
            assert!(codec.encode(docno, &mut out));
        }
        let Some(ForwardConfig::FixedBytes(config)) = codec.config() else {
            panic!("expected fixedbytes config");
        };
        let block = FixedBytesBlock::open(&config, Payload::from_bytes(&out), 3).unwrap();
        let decoded: Vec<Vec<u8>> = (0..3)
            .map(|pos| {
                let mut docno = Vec::new();
                block.decode_into(pos, &mut docno);
                docno
            })
            .collect();
        assert_eq!(decoded, vec![b"ABC".to_vec(), b"123".to_vec(), b"7".to_vec()]);
    }

    #[test]
    fn test_empty_docnos() {
        let mut codec = seeded(&[b"", b""]);
        assert_eq!(codec.size(), 0);
        let mut out = Vec::new();
        assert!(codec.encode(b"", &mut out));
        assert!(out.is_empty());
        let Some(ForwardConfig::FixedBytes(config)) = codec.config() else {
            panic!("expected fixedbytes config");
        };
        let block = FixedBytesBlock::open(&config, Payload::from_bytes(&out), 2).unwrap();
        let mut docno = Vec::new();
        block.decode_into(1, &mut docno);
        assert!(docno.is_empty());
    }
}
