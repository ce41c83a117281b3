//! Forward codec bank
//!
//! Each codec recognizes one structural pattern in a docno stream and stores
//! matching docnos in as few bytes as possible. A codec has two halves:
//!
//! - a [`ForwardCodec`] that competes during seeding and encodes docnos once
//!   its hypothesis is sealed
//! - a block decoder ([`ForwardBlock`]) that reinterprets the sealed payload
//!   in place and decodes by position
//!
//! | format           | pattern                                   | bytes/entry |
//! |------------------|-------------------------------------------|-------------|
//! | `fixedbytes`     | common prefix, bounded length             | length - prefix |
//! | `intsequence`    | prefix + consecutive integers             | 0 |
//! | `intsequencepad` | prefix + consecutive zero-padded integers | 0 |
//! | `intstored`      | prefix + arbitrary integers               | 1, 2, 4 or 8 |
//! | `uuid`           | prefix + canonical UUID text              | 16 |
//! | `hexdigest`      | prefix + fixed-length hex digest          | length / 2 |

pub mod batch;
pub mod fixed_bytes;
pub mod hex_digest;
pub mod int_sequence;
pub mod int_sequence_pad;
pub mod int_stored;
pub mod numeric;
pub mod uuid;

pub use batch::DocnoBatch;
pub use fixed_bytes::{FixedBytesBlock, FixedBytesCodec, FixedBytesConfig};
pub use hex_digest::{HexDigestBlock, HexDigestCodec, HexDigestConfig};
pub use int_sequence::{IntSequenceBlock, IntSequenceCodec, IntSequenceConfig};
pub use int_sequence_pad::{IntSequencePadBlock, IntSequencePadCodec, IntSequencePadConfig};
pub use int_stored::{IntStoredBlock, IntStoredCodec, IntStoredConfig};
pub use self::uuid::{UuidBlock, UuidCodec, UuidConfig};

use crate::container::Payload;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Seeding and encoding half of a codec
pub trait ForwardCodec: Send {
    /// Format name written to the block config
    fn name(&self) -> &'static str;

    /// Extend the running hypothesis to cover `docno`; false the first
    /// time `docno` breaks the pattern
    fn seed(&mut self, docno: &[u8]) -> bool;

    /// Forget the hypothesis so the codec can be reused
    fn reset(&mut self);

    /// Estimated bytes per entry under the current hypothesis (lower wins)
    fn size(&self) -> usize;

    /// Sealed configuration; `None` before the first successful seed
    fn config(&self) -> Option<ForwardConfig>;

    /// Append the committed encoding of `docno` to `out`; false (with `out`
    /// untouched) if `docno` falls outside the sealed pattern
    fn encode(&mut self, docno: &[u8], out: &mut Vec<u8>) -> bool;
}

/// Constructor entry in the codec registry
pub struct CodecEntry {
    pub name: &'static str,
    pub make: fn() -> Box<dyn ForwardCodec>,
}

fn make<C: ForwardCodec + Default + 'static>() -> Box<dyn ForwardCodec> {
    Box::new(C::default())
}

/// Registered forward codecs, in tie-break order
pub const FORWARD_CODECS: &[CodecEntry] = &[
    CodecEntry {
        name: fixed_bytes::NAME,
        make: make::<FixedBytesCodec>,
    },
    CodecEntry {
        name: int_sequence::NAME,
        make: make::<IntSequenceCodec>,
    },
    CodecEntry {
        name: int_sequence_pad::NAME,
        make: make::<IntSequencePadCodec>,
    },
    CodecEntry {
        name: int_stored::NAME,
        make: make::<IntStoredCodec>,
    },
    CodecEntry {
        name: self::uuid::NAME,
        make: make::<UuidCodec>,
    },
    CodecEntry {
        name: hex_digest::NAME,
        make: make::<HexDigestCodec>,
    },
];

/// Sealed configuration of a forward block, stored as `{"format": name, ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format")]
pub enum ForwardConfig {
    #[serde(rename = "fixedbytes")]
    FixedBytes(FixedBytesConfig),
    #[serde(rename = "intsequence")]
    IntSequence(IntSequenceConfig),
    #[serde(rename = "intsequencepad")]
    IntSequencePad(IntSequencePadConfig),
    #[serde(rename = "intstored")]
    IntStored(IntStoredConfig),
    #[serde(rename = "uuid")]
    Uuid(UuidConfig),
    #[serde(rename = "hexdigest")]
    HexDigest(HexDigestConfig),
}

#[derive(Deserialize)]
struct FormatTag {
    format: String,
}

impl ForwardConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ForwardConfig::FixedBytes(_) => fixed_bytes::NAME,
            ForwardConfig::IntSequence(_) => int_sequence::NAME,
            ForwardConfig::IntSequencePad(_) => int_sequence_pad::NAME,
            ForwardConfig::IntStored(_) => int_stored::NAME,
            ForwardConfig::Uuid(_) => self::uuid::NAME,
            ForwardConfig::HexDigest(_) => hex_digest::NAME,
        }
    }

    /// Parse a stored config, reporting unregistered formats by name
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let tag: FormatTag = serde_json::from_slice(bytes)?;
        if !FORWARD_CODECS.iter().any(|entry| entry.name == tag.format) {
            return Err(Error::UnknownFormat(tag.format));
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Reinterpret a sealed payload as a randomly indexable block
    pub fn open(&self, payload: Payload, count: usize) -> Result<ForwardBlock> {
        Ok(match self {
            ForwardConfig::FixedBytes(c) => {
                ForwardBlock::FixedBytes(FixedBytesBlock::open(c, payload, count)?)
            }
            ForwardConfig::IntSequence(c) => {
                ForwardBlock::IntSequence(IntSequenceBlock::open(c, count)?)
            }
            ForwardConfig::IntSequencePad(c) => {
                ForwardBlock::IntSequencePad(IntSequencePadBlock::open(c, count)?)
            }
            ForwardConfig::IntStored(c) => {
                ForwardBlock::IntStored(IntStoredBlock::open(c, payload, count)?)
            }
            ForwardConfig::Uuid(c) => ForwardBlock::Uuid(UuidBlock::open(c, payload, count)?),
            ForwardConfig::HexDigest(c) => {
                ForwardBlock::HexDigest(HexDigestBlock::open(c, payload, count)?)
            }
        })
    }
}

/// Position-addressed decoding shared by every block type
pub trait DecodeBlock {
    /// Number of docnos in the block
    fn len(&self) -> usize;

    /// Append the docno at block-local `pos` (< `len()`) to `out`
    fn decode_into(&self, pos: usize, out: &mut Vec<u8>);

    /// Longest docno the block can produce
    fn width_hint(&self) -> usize;

    fn config(&self) -> ForwardConfig;
}

/// A sealed forward block backed by the mapped file
#[derive(Debug, Clone)]
pub enum ForwardBlock {
    FixedBytes(FixedBytesBlock),
    IntSequence(IntSequenceBlock),
    IntSequencePad(IntSequencePadBlock),
    IntStored(IntStoredBlock),
    Uuid(UuidBlock),
    HexDigest(HexDigestBlock),
}

impl ForwardBlock {
    fn decoder(&self) -> &dyn DecodeBlock {
        match self {
            ForwardBlock::FixedBytes(b) => b,
            ForwardBlock::IntSequence(b) => b,
            ForwardBlock::IntSequencePad(b) => b,
            ForwardBlock::IntStored(b) => b,
            ForwardBlock::Uuid(b) => b,
            ForwardBlock::HexDigest(b) => b,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.decoder().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn name(&self) -> &'static str {
        self.config().name()
    }

    pub fn config(&self) -> ForwardConfig {
        self.decoder().config()
    }

    /// Decode block-local positions; every position must be `< len()`
    pub fn lookup(&self, positions: &[u64]) -> DocnoBatch {
        let decoder = self.decoder();
        let mut batch = DocnoBatch::with_capacity(decoder.width_hint(), positions.len());
        let mut scratch = Vec::with_capacity(decoder.width_hint());
        for &pos in positions {
            scratch.clear();
            decoder.decode_into(pos as usize, &mut scratch);
            batch.push(&scratch);
        }
        batch
    }

    /// Lazily decode the whole block in order; each call starts over
    pub fn iter(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        let decoder = self.decoder();
        (0..decoder.len()).map(move |pos| {
            let mut docno = Vec::with_capacity(decoder.width_hint());
            decoder.decode_into(pos, &mut docno);
            docno
        })
    }
}

/// Require `count` fixed-size entries to fit in `payload`
pub(crate) fn check_payload(format: &str, payload: &Payload, stride: usize, count: usize) -> Result<()> {
    let needed = stride.checked_mul(count).ok_or_else(|| {
        Error::Corruption(format!("{} block of {} entries overflows", format, count))
    })?;
    if payload.len() < needed {
        return Err(Error::Corruption(format!(
            "{} block needs {} payload bytes for {} entries, found {}",
            format,
            needed,
            count,
            payload.len()
        )));
    }
    Ok(())
}
