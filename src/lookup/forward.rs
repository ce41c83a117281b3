//! Index to docno lookup over a sequence of sealed forward blocks

use crate::codec::{DocnoBatch, ForwardBlock};
use crate::error::{Error, Result};
use crate::types::DocIdx;

/// Ordered forward blocks plus the index each one starts at
#[derive(Debug, Clone, Default)]
pub struct ForwardLookup {
    blocks: Vec<ForwardBlock>,
    starts: Vec<DocIdx>,
    len: u64,
}

impl ForwardLookup {
    pub fn new(blocks: Vec<ForwardBlock>) -> Self {
        let mut starts = Vec::with_capacity(blocks.len());
        let mut len = 0u64;
        for block in &blocks {
            starts.push(len);
            len += block.len() as u64;
        }
        Self { blocks, starts, len }
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn blocks(&self) -> &[ForwardBlock] {
        &self.blocks
    }

    /// Index of the first docno of each block
    pub fn starts(&self) -> &[DocIdx] {
        &self.starts
    }

    fn check(&self, idx: DocIdx) -> Result<()> {
        if idx >= self.len {
            return Err(Error::IndexOutOfRange {
                index: idx,
                len: self.len,
            });
        }
        Ok(())
    }

    /// Block holding `idx` (the last block starting at or before it)
    #[inline]
    fn block_of(&self, idx: DocIdx) -> usize {
        self.starts.partition_point(|&start| start <= idx) - 1
    }

    /// Docno at `idx`
    pub fn get(&self, idx: DocIdx) -> Result<Vec<u8>> {
        self.check(idx)?;
        let block = self.block_of(idx);
        let batch = self.blocks[block].lookup(&[idx - self.starts[block]]);
        Ok(batch.get(0).to_vec())
    }

    /// Docnos for a batch of indices, in request order
    pub fn lookup(&self, indices: &[DocIdx]) -> Result<DocnoBatch> {
        for &idx in indices {
            self.check(idx)?;
        }
        if indices.is_empty() {
            return Ok(DocnoBatch::default());
        }
        if let [block] = self.blocks.as_slice() {
            return Ok(block.lookup(indices));
        }

        // group request slots by block, keeping block-local positions
        let mut groups: Vec<(Vec<usize>, Vec<u64>)> = vec![(Vec::new(), Vec::new()); self.blocks.len()];
        for (slot, &idx) in indices.iter().enumerate() {
            let block = self.block_of(idx);
            groups[block].0.push(slot);
            groups[block].1.push(idx - self.starts[block]);
        }

        let partials: Vec<(Vec<usize>, DocnoBatch)> = groups
            .into_iter()
            .enumerate()
            .filter(|(_, (slots, _))| !slots.is_empty())
            .map(|(block, (slots, positions))| (slots, self.blocks[block].lookup(&positions)))
            .collect();

        let width = partials.iter().map(|(_, batch)| batch.width()).max().unwrap_or(0);
        let mut result = DocnoBatch::zeroed(width, indices.len());
        for (slots, batch) in &partials {
            for (k, &slot) in slots.iter().enumerate() {
                result.set(slot, batch.get(k));
            }
        }
        Ok(result)
    }

    /// Every docno in index order
    pub fn iter(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.blocks.iter().flat_map(|block| block.iter())
    }
}
