//! Prefix followed by consecutive integers. Nothing is stored per entry;
//! a block is fully described by `(prefix, start, count)`.

use super::numeric::{SequenceRun, SequenceState};
use super::{DecodeBlock, ForwardCodec, ForwardConfig};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const NAME: &str = "intsequence";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntSequenceConfig {
    pub prefix: String,
    pub start: u64,
}

#[derive(Debug)]
pub struct IntSequenceCodec {
    state: SequenceState,
}

impl Default for IntSequenceCodec {
    fn default() -> Self {
        Self {
            state: SequenceState::new(false),
        }
    }
}

impl ForwardCodec for IntSequenceCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn seed(&mut self, docno: &[u8]) -> bool {
        self.state.seed(docno)
    }

    fn reset(&mut self) {
        self.state.reset();
    }

    fn size(&self) -> usize {
        0
    }

    fn config(&self) -> Option<ForwardConfig> {
        self.state.is_seeded().then(|| {
            ForwardConfig::IntSequence(IntSequenceConfig {
                prefix: self.state.prefix(),
                start: self.state.start(),
            })
        })
    }

    fn encode(&mut self, docno: &[u8], _out: &mut Vec<u8>) -> bool {
        self.state.encode(docno)
    }
}

#[derive(Debug, Clone)]
pub struct IntSequenceBlock {
    run: SequenceRun,
}

impl IntSequenceBlock {
    pub fn open(config: &IntSequenceConfig, count: usize) -> Result<Self> {
        let count = count as u64;
        if config.start.checked_add(count).is_none() {
            return Err(Error::Corruption(format!(
                "{} block starting at {} overflows with {} entries",
                NAME, config.start, count
            )));
        }
        Ok(Self {
            run: SequenceRun {
                prefix: config.prefix.as_bytes().to_vec(),
                start: config.start,
                count,
                pad: None,
            },
        })
    }

    /// Closed-form description used for reversal
    pub fn run(&self) -> &SequenceRun {
        &self.run
    }
}

impl DecodeBlock for IntSequenceBlock {
    fn len(&self) -> usize {
        self.run.count as usize
    }

    #[inline]
    fn decode_into(&self, pos: usize, out: &mut Vec<u8>) {
        self.run.format_into(pos as u64, out);
    }

    fn width_hint(&self) -> usize {
        self.run.max_width()
    }

    fn config(&self) -> ForwardConfig {
        ForwardConfig::IntSequence(IntSequenceConfig {
            prefix: String::from_utf8_lossy(&self.run.prefix).into_owned(),
            start: self.run.start,
        })
    }
}
