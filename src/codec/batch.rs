//! Fixed-stride docno batches
//!
//! Decoded docnos are packed into one buffer with a common width; shorter
//! entries are NUL padded. Merging batches of different widths widens the
//! narrower ones first.

/// A batch of docnos laid out at a fixed stride
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocnoBatch {
    width: usize,
    len: usize,
    data: Vec<u8>,
}

impl DocnoBatch {
    pub fn with_capacity(width: usize, capacity: usize) -> Self {
        Self {
            width,
            len: 0,
            data: Vec::with_capacity(width * capacity),
        }
    }

    /// A batch of `len` empty entries, filled later with [`DocnoBatch::set`]
    pub fn zeroed(width: usize, len: usize) -> Self {
        Self {
            width,
            len,
            data: vec![0; width * len],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a docno, widening the batch if it does not fit
    pub fn push(&mut self, docno: &[u8]) {
        if docno.len() > self.width {
            self.widen(docno.len());
        }
        let start = self.data.len();
        self.data.extend_from_slice(docno);
        self.data.resize(start + self.width, 0);
        self.len += 1;
    }

    /// Overwrite entry `i`; `docno` must fit the current width
    pub fn set(&mut self, i: usize, docno: &[u8]) {
        debug_assert!(docno.len() <= self.width);
        let slot = &mut self.data[i * self.width..(i + 1) * self.width];
        slot[..docno.len()].copy_from_slice(docno);
        slot[docno.len()..].fill(0);
    }

    /// Re-stride every entry to `width` bytes
    pub fn widen(&mut self, width: usize) {
        if width <= self.width {
            return;
        }
        let mut data = Vec::with_capacity(width * self.len.max(1));
        for i in 0..self.len {
            let start = data.len();
            data.extend_from_slice(self.slot(i));
            data.resize(start + width, 0);
        }
        self.data = data;
        self.width = width;
    }

    #[inline]
    fn slot(&self, i: usize) -> &[u8] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    /// Entry `i` without its padding
    #[inline]
    pub fn get(&self, i: usize) -> &[u8] {
        let slot = self.slot(i);
        let end = slot.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
        &slot[..end]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    pub fn to_vecs(&self) -> Vec<Vec<u8>> {
        self.iter().map(<[u8]>::to_vec).collect()
    }
}
