//! Fixed-length hex digests of one letter case behind an optional prefix,
//! stored as the raw digest bytes.

use super::{DecodeBlock, ForwardCodec, ForwardConfig, check_payload};
use crate::container::Payload;
use crate::error::{Error, Result};
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const NAME: &str = "hexdigest";

static LOWER_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[0-9a-f][0-9a-f])+$").expect("valid regex"));
static UPPER_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[0-9A-F][0-9A-F])+$").expect("valid regex"));

const LOWER_DIGITS: &[u8; 16] = b"0123456789abcdef";
const UPPER_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexDigestConfig {
    pub upper: bool,
    pub length: usize,
    pub prefix: String,
}

#[derive(Debug, Default)]
pub struct HexDigestCodec {
    upper: Option<bool>,
    length: usize,
    prefix: Option<Vec<u8>>,
}

fn nibble(digit: u8, upper: bool) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' if !upper => Some(digit - b'a' + 10),
        b'A'..=b'F' if upper => Some(digit - b'A' + 10),
        _ => None,
    }
}

impl HexDigestCodec {
    /// Decode a docno under the locked prefix, length and case
    fn parse_into(&self, docno: &[u8], out: &mut Vec<u8>) -> bool {
        let (Some(prefix), Some(upper)) = (self.prefix.as_deref(), self.upper) else {
            return false;
        };
        let Some(text) = docno.strip_prefix(prefix) else {
            return false;
        };
        if text.len() != self.length {
            return false;
        }
        let start = out.len();
        for pair in text.chunks_exact(2) {
            match (nibble(pair[0], upper), nibble(pair[1], upper)) {
                (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
                _ => {
                    out.truncate(start);
                    return false;
                }
            }
        }
        true
    }
}

impl ForwardCodec for HexDigestCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn seed(&mut self, docno: &[u8]) -> bool {
        if self.prefix.is_none() {
            // the longer tail decides the case; digit-only tails read as lower
            let (found, upper) = match (LOWER_TAIL_RE.find(docno), UPPER_TAIL_RE.find(docno)) {
                (Some(lower), Some(upper)) if upper.start() < lower.start() => (upper, true),
                (Some(lower), _) => (lower, false),
                (None, Some(upper)) => (upper, true),
                (None, None) => return false,
            };
            let prefix = &docno[..found.start()];
            if std::str::from_utf8(prefix).is_err() {
                return false;
            }
            self.upper = Some(upper);
            self.length = found.len();
            self.prefix = Some(prefix.to_vec());
        }
        let mut scratch = Vec::with_capacity(self.length / 2);
        self.parse_into(docno, &mut scratch)
    }

    fn reset(&mut self) {
        self.upper = None;
        self.length = 0;
        self.prefix = None;
    }

    fn size(&self) -> usize {
        self.length / 2
    }

    fn config(&self) -> Option<ForwardConfig> {
        let prefix = self.prefix.as_deref()?;
        Some(ForwardConfig::HexDigest(HexDigestConfig {
            upper: self.upper?,
            length: self.length,
            prefix: String::from_utf8_lossy(prefix).into_owned(),
        }))
    }

    fn encode(&mut self, docno: &[u8], out: &mut Vec<u8>) -> bool {
        self.parse_into(docno, out)
    }
}

#[derive(Debug, Clone)]
pub struct HexDigestBlock {
    config: HexDigestConfig,
    count: usize,
    payload: Payload,
}

impl HexDigestBlock {
    pub fn open(config: &HexDigestConfig, payload: Payload, count: usize) -> Result<Self> {
        if config.length == 0 || config.length % 2 != 0 {
            return Err(Error::Corruption(format!(
                "{} block has invalid digest length {}",
                NAME, config.length
            )));
        }
        check_payload(NAME, &payload, config.length / 2, count)?;
        Ok(Self {
            config: config.clone(),
            count,
            payload,
        })
    }
}

impl DecodeBlock for HexDigestBlock {
    fn len(&self) -> usize {
        self.count
    }

    fn decode_into(&self, pos: usize, out: &mut Vec<u8>) {
        let stride = self.config.length / 2;
        let digits = if self.config.upper {
            UPPER_DIGITS
        } else {
            LOWER_DIGITS
        };
        out.extend_from_slice(self.config.prefix.as_bytes());
        for &byte in &self.payload.bytes()[pos * stride..(pos + 1) * stride] {
            out.push(digits[(byte >> 4) as usize]);
            out.push(digits[(byte & 0xF) as usize]);
        }
    }

    fn width_hint(&self) -> usize {
        self.config.prefix.len() + self.config.length
    }

    fn config(&self) -> ForwardConfig {
        ForwardConfig::HexDigest(self.config.clone())
    }
}
