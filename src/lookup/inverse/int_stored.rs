//! Binary-search reversal over strictly increasing IntStored blocks

use super::{CountConfig, InverseConfig, ReverseIndex};
use crate::codec::{ForwardBlock, IntStoredBlock};
use crate::error::{Error, Result};
use crate::lookup::forward::ForwardLookup;
use crate::types::DocIdx;

pub const NAME: &str = "intstored";

#[derive(Debug, Clone)]
pub struct IntStoredIndex {
    blocks: Vec<(DocIdx, IntStoredBlock)>,
    count: u64,
}

impl IntStoredIndex {
    pub fn from_forward(forward: &ForwardLookup) -> Result<Self> {
        let blocks = forward
            .starts()
            .iter()
            .zip(forward.blocks())
            .map(|(&start, block)| match block {
                ForwardBlock::IntStored(stored) => Ok((start, stored.clone())),
                other => Err(Error::Corruption(format!(
                    "{} inverse cannot reverse a {} block",
                    NAME,
                    other.name()
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            blocks,
            count: forward.len(),
        })
    }
}

impl ReverseIndex for IntStoredIndex {
    fn config(&self) -> InverseConfig {
        InverseConfig::IntStored(CountConfig { count: self.count })
    }

    fn lookup_into(&self, _forward: &ForwardLookup, docnos: &[&[u8]], out: &mut [i64]) -> Result<()> {
        for (docno, slot) in docnos.iter().zip(out.iter_mut()) {
            let found = self
                .blocks
                .iter()
                .filter(|(_, block)| docno.starts_with(block.prefix()))
                .find_map(|(start, block)| block.position_of(docno).map(|pos| start + pos));
            if let Some(idx) = found {
                *slot = idx as i64;
            }
        }
        Ok(())
    }
}
