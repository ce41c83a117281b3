//! Docno to index lookup
//!
//! One inverse strategy is chosen per file, after its forward blocks are
//! sealed, by looking at which codecs the blocks use:
//!
//! 1. `intsequence` - a single IntSequence block, reversed by formula
//! 2. `intstored` - only IntStored blocks, each strictly increasing, reversed
//!    by binary search
//! 3. `intsequencemulti` - only IntSequence/IntSequencePad blocks, reversed
//!    by prefix dispatch and formula
//! 4. `hash` - anything else, an FNV-1 bucket index verified through forward
//!    lookups
//!
//! Only the hash strategy stores a payload; the others are rebuilt from the
//! forward blocks when the file is opened.

pub mod hash;
pub mod int_sequence;
pub mod int_sequence_multi;
pub mod int_stored;

pub use hash::{HashConfig, HashIndex};
pub use int_sequence::{IntSequenceIndex, IntSequenceInverseConfig};
pub use int_sequence_multi::IntSequenceMultiIndex;
pub use int_stored::IntStoredIndex;

use super::forward::ForwardLookup;
use crate::codec::ForwardBlock;
use crate::container::{ContainerReader, ContainerWriter, Record, RecordType};
use crate::error::{Error, Result};
use crate::types::{BuildConfig, DocIdx, NOT_FOUND};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Config of the strategies that only record the docno count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountConfig {
    pub count: u64,
}

/// Inverse record config, stored as `{"format": name, ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format")]
pub enum InverseConfig {
    #[serde(rename = "hash")]
    Hash(HashConfig),
    #[serde(rename = "intsequence")]
    IntSequence(IntSequenceInverseConfig),
    #[serde(rename = "intsequencemulti")]
    IntSequenceMulti(CountConfig),
    #[serde(rename = "intstored")]
    IntStored(CountConfig),
}

impl InverseConfig {
    pub fn name(&self) -> &'static str {
        match self {
            InverseConfig::Hash(_) => hash::NAME,
            InverseConfig::IntSequence(_) => int_sequence::NAME,
            InverseConfig::IntSequenceMulti(_) => int_sequence_multi::NAME,
            InverseConfig::IntStored(_) => int_stored::NAME,
        }
    }
}

#[derive(Deserialize)]
struct FormatTag {
    format: String,
}

/// Strategy chosen for a sealed forward structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    IntSequence,
    IntStored,
    IntSequenceMulti,
    Hash,
}

impl Strategy {
    /// Pick the cheapest strategy that can reverse `forward`
    pub fn select(forward: &ForwardLookup) -> Self {
        let blocks = forward.blocks();
        if let [ForwardBlock::IntSequence(_)] = blocks {
            return Strategy::IntSequence;
        }
        let sorted_stored = blocks.iter().all(|block| match block {
            ForwardBlock::IntStored(stored) => stored.is_strictly_increasing(),
            _ => false,
        });
        if sorted_stored {
            return Strategy::IntStored;
        }
        let sequences = blocks.iter().all(|block| {
            matches!(block, ForwardBlock::IntSequence(_) | ForwardBlock::IntSequencePad(_))
        });
        if sequences {
            return Strategy::IntSequenceMulti;
        }
        Strategy::Hash
    }
}

/// A docno to index reversal over one forward structure
pub trait ReverseIndex: Send + Sync + std::fmt::Debug {
    fn config(&self) -> InverseConfig;

    /// Resolve `docnos` into `out`, which starts filled with [`NOT_FOUND`]
    fn lookup_into(&self, forward: &ForwardLookup, docnos: &[&[u8]], out: &mut [i64]) -> Result<()>;

    /// Append the stored payload; closed-form strategies store nothing
    fn write_payload(&self, _out: &mut Vec<u8>) {}
}

/// Inverse lookup bound to the forward lookup it reverses
#[derive(Debug)]
pub struct InverseLookup {
    forward: Arc<ForwardLookup>,
    index: Box<dyn ReverseIndex>,
}

impl InverseLookup {
    /// Open the inverse index stored in `record`
    pub fn open(forward: Arc<ForwardLookup>, record: &Record) -> Result<Self> {
        let tag: FormatTag = record.config()?;
        let config: InverseConfig = match tag.format.as_str() {
            hash::NAME | int_sequence::NAME | int_sequence_multi::NAME | int_stored::NAME => {
                record.config()?
            }
            _ => return Err(Error::UnknownFormat(tag.format)),
        };
        let count = record.doc_count()?;
        if count as u64 != forward.len() {
            return Err(Error::Corruption(format!(
                "inverse index covers {} docnos but the forward blocks hold {}",
                count,
                forward.len()
            )));
        }

        let index: Box<dyn ReverseIndex> = match &config {
            InverseConfig::Hash(c) => Box::new(HashIndex::open(c, record.payload.clone(), count)?),
            InverseConfig::IntSequence(c) => Box::new(IntSequenceIndex::open(c)),
            InverseConfig::IntSequenceMulti(_) => Box::new(IntSequenceMultiIndex::from_forward(&forward)?),
            InverseConfig::IntStored(_) => Box::new(IntStoredIndex::from_forward(&forward)?),
        };
        Ok(Self { forward, index })
    }

    /// Build an inverse index in memory, for files written without one
    pub fn build(forward: Arc<ForwardLookup>, config: &BuildConfig) -> Result<Self> {
        let index = build_index(&forward, config)?;
        info!(format = index.config().name(), "built in-memory inverse index");
        Ok(Self { forward, index })
    }

    pub fn format(&self) -> &'static str {
        self.index.config().name()
    }

    pub fn config(&self) -> InverseConfig {
        self.index.config()
    }

    /// Indices of `docnos`; unknown docnos map to [`NOT_FOUND`]
    pub fn lookup(&self, docnos: &[&[u8]]) -> Result<Vec<i64>> {
        let mut out = vec![NOT_FOUND; docnos.len()];
        if !docnos.is_empty() {
            self.index.lookup_into(&self.forward, docnos, &mut out)?;
        }
        Ok(out)
    }

    /// Index of a single docno
    pub fn find(&self, docno: &[u8]) -> Result<DocIdx> {
        let found = self.lookup(&[docno])?;
        match found.first() {
            Some(&idx) if idx >= 0 => Ok(idx as DocIdx),
            _ => Err(Error::not_found(docno)),
        }
    }
}

fn build_index(forward: &ForwardLookup, config: &BuildConfig) -> Result<Box<dyn ReverseIndex>> {
    let index: Box<dyn ReverseIndex> = match Strategy::select(forward) {
        Strategy::IntSequence => Box::new(IntSequenceIndex::from_forward(forward)?),
        Strategy::IntStored => Box::new(IntStoredIndex::from_forward(forward)?),
        Strategy::IntSequenceMulti => {
            let index = IntSequenceMultiIndex::from_forward(forward)?;
            let duplicates = index.duplicates();
            if duplicates > 0 {
                warn!(
                    duplicates,
                    "duplicate docnos found; inverse lookups of them resolve to an arbitrary index"
                );
            }
            Box::new(index)
        }
        Strategy::Hash => Box::new(HashIndex::build(forward, config.hash_batch_size)?),
    };
    Ok(index)
}

/// Select and append the inverse record for the forward blocks in `path`
pub fn build_inverse(path: &Path, config: &BuildConfig) -> Result<InverseConfig> {
    let (inverse_config, count, payload) = {
        let reader = ContainerReader::open(path)?;
        let forward = super::load_forward(&reader)?.0;
        let index = build_index(&forward, config)?;
        let mut payload = Vec::new();
        index.write_payload(&mut payload);
        (index.config(), forward.len(), payload)
    };

    let mut writer = ContainerWriter::open(path)?;
    writer.write_header(RecordType::Inverse, count, &inverse_config)?;
    writer.write(&payload)?;
    writer.finish()?;

    info!(
        path = %path.display(),
        format = inverse_config.name(),
        docnos = count,
        payload_bytes = payload.len(),
        "built inverse index"
    );
    Ok(inverse_config)
}
