//! Canonical 36-character UUID text behind an optional prefix, stored as the
//! raw 16-byte value.

use super::{DecodeBlock, ForwardCodec, ForwardConfig, check_payload};
use crate::container::Payload;
use crate::error::Result;
use ::uuid::Uuid;
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const NAME: &str = "uuid";

const UUID_LEN: usize = 36;
const UUID_BYTES: usize = 16;

static LOWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("valid regex")
});
static UPPER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-F]{8}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{12}$")
        .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UuidConfig {
    pub upper: bool,
    pub prefix: String,
}

#[derive(Debug, Default)]
pub struct UuidCodec {
    upper: Option<bool>,
    prefix: Option<Vec<u8>>,
}

impl UuidCodec {
    /// Parse a docno under the locked prefix and case
    fn parse(&self, docno: &[u8]) -> Option<Uuid> {
        let (prefix, upper) = (self.prefix.as_deref()?, self.upper?);
        let text = docno.strip_prefix(prefix)?;
        let pattern = if upper { &*UPPER_RE } else { &*LOWER_RE };
        if text.len() != UUID_LEN || !pattern.is_match(text) {
            return None;
        }
        Uuid::try_parse_ascii(text).ok()
    }
}

impl ForwardCodec for UuidCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn seed(&mut self, docno: &[u8]) -> bool {
        if self.prefix.is_none() {
            let Some(split) = docno.len().checked_sub(UUID_LEN) else {
                return false;
            };
            let (prefix, text) = docno.split_at(split);
            if std::str::from_utf8(prefix).is_err() {
                return false;
            }
            self.prefix = Some(prefix.to_vec());
            self.upper = Some(UPPER_RE.is_match(text));
        }
        self.parse(docno).is_some()
    }

    fn reset(&mut self) {
        self.upper = None;
        self.prefix = None;
    }

    fn size(&self) -> usize {
        UUID_BYTES
    }

    fn config(&self) -> Option<ForwardConfig> {
        let prefix = self.prefix.as_deref()?;
        Some(ForwardConfig::Uuid(UuidConfig {
            upper: self.upper?,
            prefix: String::from_utf8_lossy(prefix).into_owned(),
        }))
    }

    fn encode(&mut self, docno: &[u8], out: &mut Vec<u8>) -> bool {
        match self.parse(docno) {
            Some(uuid) => {
                out.extend_from_slice(uuid.as_bytes());
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UuidBlock {
    config: UuidConfig,
    count: usize,
    payload: Payload,
}

impl UuidBlock {
    pub fn open(config: &UuidConfig, payload: Payload, count: usize) -> Result<Self> {
        check_payload(NAME, &payload, UUID_BYTES, count)?;
        Ok(Self {
            config: config.clone(),
            count,
            payload,
        })
    }
}

impl DecodeBlock for UuidBlock {
    fn len(&self) -> usize {
        self.count
    }

    fn decode_into(&self, pos: usize, out: &mut Vec<u8>) {
        let mut raw = [0u8; UUID_BYTES];
        raw.copy_from_slice(&self.payload.bytes()[pos * UUID_BYTES..(pos + 1) * UUID_BYTES]);
        let uuid = Uuid::from_bytes(raw);
        let mut buf = Uuid::encode_buffer();
        let text = if self.config.upper {
            uuid.hyphenated().encode_upper(&mut buf)
        } else {
            uuid.hyphenated().encode_lower(&mut buf)
        };
        out.extend_from_slice(self.config.prefix.as_bytes());
        out.extend_from_slice(text.as_bytes());
    }

    fn width_hint(&self) -> usize {
        self.config.prefix.len() + UUID_LEN
    }

    fn config(&self) -> ForwardConfig {
        ForwardConfig::Uuid(self.config.clone())
    }
}
