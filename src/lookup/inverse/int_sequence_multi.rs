//! Formula reversal across several IntSequence/IntSequencePad blocks

use super::{CountConfig, InverseConfig, ReverseIndex};
use crate::codec::ForwardBlock;
use crate::codec::numeric::SequenceRun;
use crate::error::{Error, Result};
use crate::lookup::forward::ForwardLookup;
use crate::types::DocIdx;

pub const NAME: &str = "intsequencemulti";

#[derive(Debug, Clone)]
pub struct IntSequenceMultiIndex {
    runs: Vec<(DocIdx, SequenceRun)>,
    count: u64,
}

impl IntSequenceMultiIndex {
    pub fn from_forward(forward: &ForwardLookup) -> Result<Self> {
        let runs = forward
            .starts()
            .iter()
            .zip(forward.blocks())
            .map(|(&start, block)| match block {
                ForwardBlock::IntSequence(seq) => Ok((start, seq.run().clone())),
                ForwardBlock::IntSequencePad(seq) => Ok((start, seq.run().clone())),
                other => Err(Error::Corruption(format!(
                    "{} inverse cannot reverse a {} block",
                    NAME,
                    other.name()
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            runs,
            count: forward.len(),
        })
    }

    /// Docnos spelled identically by more than one run
    pub fn duplicates(&self) -> u64 {
        let mut total = 0;
        for (i, (_, a)) in self.runs.iter().enumerate() {
            for (_, b) in &self.runs[i + 1..] {
                total += shared_docnos(a, b);
            }
        }
        total
    }
}

/// Numbers of exactly `pad` digits, as a half-open range
fn width_range(pad: usize) -> Option<(u64, u64)> {
    let pad = u32::try_from(pad).ok()?;
    let low = if pad <= 1 { 0 } else { 10u64.checked_pow(pad - 1)? };
    let high = 10u64.checked_pow(pad).unwrap_or(u64::MAX);
    Some((low, high))
}

/// Count the docnos two runs both produce. Prefixes never end in a digit,
/// so only runs with equal prefixes can collide.
fn shared_docnos(a: &SequenceRun, b: &SequenceRun) -> u64 {
    if a.prefix != b.prefix {
        return 0;
    }
    let low = a.start.max(b.start);
    let high = a
        .start
        .saturating_add(a.count)
        .min(b.start.saturating_add(b.count));
    let (low, high) = match (a.pad, b.pad) {
        (x, y) if x == y => (low, high),
        // a padded number is spelled canonically only when it fills the pad
        (None, Some(pad)) | (Some(pad), None) => match width_range(pad) {
            Some((min, max)) => (low.max(min), high.min(max)),
            None => return 0,
        },
        _ => return 0,
    };
    high.saturating_sub(low)
}

impl ReverseIndex for IntSequenceMultiIndex {
    fn config(&self) -> InverseConfig {
        InverseConfig::IntSequenceMulti(CountConfig { count: self.count })
    }

    fn lookup_into(&self, _forward: &ForwardLookup, docnos: &[&[u8]], out: &mut [i64]) -> Result<()> {
        let mut pending: Vec<usize> = (0..docnos.len()).collect();
        for (start, run) in &self.runs {
            if pending.is_empty() {
                break;
            }
            pending.retain(|&q| match run.position_of(docnos[q]) {
                Some(pos) => {
                    out[q] = (start + pos) as i64;
                    false
                }
                None => true,
            });
        }
        Ok(())
    }
}
