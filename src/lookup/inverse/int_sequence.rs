//! Formula reversal of a file made of one IntSequence block

use super::{InverseConfig, ReverseIndex};
use crate::codec::ForwardBlock;
use crate::codec::numeric::SequenceRun;
use crate::error::{Error, Result};
use crate::lookup::forward::ForwardLookup;
use serde::{Deserialize, Serialize};

pub const NAME: &str = "intsequence";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntSequenceInverseConfig {
    pub count: u64,
    pub prefix: String,
    pub start: u64,
}

#[derive(Debug, Clone)]
pub struct IntSequenceIndex {
    run: SequenceRun,
}

impl IntSequenceIndex {
    pub fn open(config: &IntSequenceInverseConfig) -> Self {
        Self {
            run: SequenceRun {
                prefix: config.prefix.as_bytes().to_vec(),
                start: config.start,
                count: config.count,
                pad: None,
            },
        }
    }

    pub fn from_forward(forward: &ForwardLookup) -> Result<Self> {
        match forward.blocks() {
            [ForwardBlock::IntSequence(block)] => Ok(Self {
                run: block.run().clone(),
            }),
            _ => Err(Error::Corruption(format!(
                "{} inverse needs exactly one intsequence block",
                NAME
            ))),
        }
    }
}

impl ReverseIndex for IntSequenceIndex {
    fn config(&self) -> InverseConfig {
        InverseConfig::IntSequence(IntSequenceInverseConfig {
            count: self.run.count,
            prefix: String::from_utf8_lossy(&self.run.prefix).into_owned(),
            start: self.run.start,
        })
    }

    fn lookup_into(&self, _forward: &ForwardLookup, docnos: &[&[u8]], out: &mut [i64]) -> Result<()> {
        for (docno, slot) in docnos.iter().zip(out.iter_mut()) {
            if let Some(pos) = self.run.position_of(docno) {
                *slot = pos as i64;
            }
        }
        Ok(())
    }
}
