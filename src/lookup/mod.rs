//! Opened lookup files
//!
//! A [`DocnoIndex`] maps a finished file read-only and answers lookups in
//! both directions:
//!
//! - forward: index -> docno, through the [`ForwardLookup`] over the forward
//!   blocks
//! - inverse: docno -> index, through the [`InverseLookup`] stored in the
//!   file (or built in memory on first use when the file has none)
//!
//! Several handles may read the same file at once. Building or appending to
//! a file while it is open elsewhere is not supported.

pub mod forward;
pub mod inverse;

pub use forward::ForwardLookup;
pub use inverse::{InverseConfig, InverseLookup, Strategy, build_inverse};

use crate::builder::ForwardBuilder;
use crate::codec::{DocnoBatch, ForwardConfig};
use crate::container::{ContainerReader, Record, RecordType};
use crate::error::{Error, Result};
use crate::stats::LookupStats;
use crate::types::{BuildConfig, DocIdx};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Read the forward blocks of a container, and its last inverse record.
/// An inverse record followed by more forward blocks no longer covers the
/// file and is dropped.
pub(crate) fn load_forward(reader: &ContainerReader) -> Result<(ForwardLookup, Option<Record>)> {
    let mut blocks = Vec::new();
    let mut inverse: Option<Record> = None;
    for record in reader.records()? {
        match record.record_type {
            RecordType::Forward => {
                if let Some(stale) = inverse.take() {
                    warn!(
                        path = %reader.path().display(),
                        offset = stale.offset,
                        "ignoring inverse index written before later forward blocks"
                    );
                }
                let config = ForwardConfig::from_json(record.config_bytes())?;
                let count = record.doc_count()?;
                blocks.push(config.open(record.payload.clone(), count)?);
            }
            RecordType::Inverse => inverse = Some(record),
            RecordType::Magic => {}
        }
    }
    Ok((ForwardLookup::new(blocks), inverse))
}

/// A lookup request, routed by its variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query<'a> {
    Index(DocIdx),
    Indices(&'a [DocIdx]),
    Docno(&'a [u8]),
    Docnos(&'a [&'a [u8]]),
}

/// The answer to a [`Query`], shaped like the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Docno(Vec<u8>),
    Docnos(Vec<Vec<u8>>),
    Index(DocIdx),
    /// Batch inverse results; unknown docnos are [`NOT_FOUND`](crate::NOT_FOUND)
    Indices(Vec<i64>),
}

/// Handle on a finished lookup file
#[derive(Debug)]
pub struct DocnoIndex {
    path: PathBuf,
    version: u64,
    file_len: u64,
    forward: Arc<ForwardLookup>,
    inverse: OnceLock<InverseLookup>,
    stored_inverse: bool,
}

impl DocnoIndex {
    /// Open and map a lookup file
    pub fn open(path: &Path) -> Result<Self> {
        let reader = ContainerReader::open(path)?;
        let (forward, inverse_record) = load_forward(&reader)?;
        let forward = Arc::new(forward);

        let inverse = OnceLock::new();
        let stored_inverse = inverse_record.is_some();
        if let Some(record) = &inverse_record {
            let lookup = InverseLookup::open(Arc::clone(&forward), record)?;
            let _ = inverse.set(lookup);
        }

        debug!(
            path = %path.display(),
            docnos = forward.len(),
            blocks = forward.blocks().len(),
            inverse = stored_inverse,
            "opened lookup"
        );
        Ok(Self {
            path: path.to_path_buf(),
            version: reader.version(),
            file_len: reader.file_len() as u64,
            forward,
            inverse,
            stored_inverse,
        })
    }

    /// Start a streaming build into `path`
    pub fn builder(path: &Path, config: BuildConfig) -> Result<ForwardBuilder> {
        ForwardBuilder::new(path, config)
    }

    /// Build a lookup file from `docnos` and open it
    pub fn build<I>(docnos: I, path: &Path, config: BuildConfig) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut builder = ForwardBuilder::new(path, config)?;
        builder.extend(docnos)?;
        let path = builder.finish()?;
        Self::open(&path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of docnos
    #[inline]
    pub fn len(&self) -> u64 {
        self.forward.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn forward_lookup(&self) -> &ForwardLookup {
        &self.forward
    }

    /// The inverse lookup, building it in memory if the file has none
    pub fn inverse_lookup(&self) -> Result<&InverseLookup> {
        if let Some(inverse) = self.inverse.get() {
            return Ok(inverse);
        }
        let built = InverseLookup::build(Arc::clone(&self.forward), &BuildConfig::default())?;
        Ok(self.inverse.get_or_init(|| built))
    }

    /// Docno at `idx` as raw bytes
    pub fn get_bytes(&self, idx: DocIdx) -> Result<Vec<u8>> {
        self.forward.get(idx)
    }

    /// Docno at `idx` as text
    pub fn get(&self, idx: DocIdx) -> Result<String> {
        Ok(String::from_utf8(self.get_bytes(idx)?)?)
    }

    /// Docnos for a batch of indices, packed at a common width
    pub fn forward_batch(&self, indices: &[DocIdx]) -> Result<DocnoBatch> {
        self.forward.lookup(indices)
    }

    pub fn forward_bytes(&self, indices: &[DocIdx]) -> Result<Vec<Vec<u8>>> {
        Ok(self.forward.lookup(indices)?.to_vecs())
    }

    pub fn forward(&self, indices: &[DocIdx]) -> Result<Vec<String>> {
        self.forward_bytes(indices)?
            .into_iter()
            .map(|docno| Ok(String::from_utf8(docno)?))
            .collect()
    }

    /// Forward lookup over any source of indices
    pub fn forward_iter<I>(&self, indices: I) -> Result<Vec<Vec<u8>>>
    where
        I: IntoIterator<Item = DocIdx>,
    {
        let indices: Vec<DocIdx> = indices.into_iter().collect();
        self.forward_bytes(&indices)
    }

    /// Index of `docno`, or [`Error::NotFound`]
    pub fn find(&self, docno: impl AsRef<[u8]>) -> Result<DocIdx> {
        self.inverse_lookup()?.find(docno.as_ref())
    }

    /// Indices of `docnos`; unknown docnos map to [`NOT_FOUND`](crate::NOT_FOUND)
    pub fn inverse<D: AsRef<[u8]>>(&self, docnos: &[D]) -> Result<Vec<i64>> {
        let docnos: Vec<&[u8]> = docnos.iter().map(AsRef::as_ref).collect();
        self.inverse_lookup()?.lookup(&docnos)
    }

    /// Inverse lookup over any source of docnos
    pub fn inverse_iter<I>(&self, docnos: I) -> Result<Vec<i64>>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let docnos: Vec<I::Item> = docnos.into_iter().collect();
        self.inverse(&docnos)
    }

    /// Whether `docno` is in the file
    pub fn contains(&self, docno: impl AsRef<[u8]>) -> Result<bool> {
        match self.find(docno) {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Answer a query in the direction its variant names
    pub fn query(&self, query: Query<'_>) -> Result<Answer> {
        Ok(match query {
            Query::Index(idx) => Answer::Docno(self.get_bytes(idx)?),
            Query::Indices(indices) => Answer::Docnos(self.forward_bytes(indices)?),
            Query::Docno(docno) => Answer::Index(self.find(docno)?),
            Query::Docnos(docnos) => Answer::Indices(self.inverse_lookup()?.lookup(docnos)?),
        })
    }

    /// Every docno in index order
    pub fn iter(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.forward.iter()
    }

    /// Format of the stored inverse index, if the file has one
    pub fn inverse_format(&self) -> Option<&'static str> {
        if self.stored_inverse {
            self.inverse.get().map(InverseLookup::format)
        } else {
            None
        }
    }

    pub fn stats(&self) -> LookupStats {
        LookupStats::collect(self)
    }

    /// One line per forward block plus the inverse strategy
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (start, block) in self.forward.starts().iter().zip(self.forward.blocks()) {
            let config = serde_json::to_string(&block.config()).unwrap_or_default();
            out.push_str(&format!(
                "[{}, {}): {} {}\n",
                start,
                start + block.len() as u64,
                block.name(),
                config
            ));
        }
        match self.inverse_format() {
            Some(format) => out.push_str(&format!("inverse: {}\n", format)),
            None => out.push_str("inverse: none\n"),
        }
        out
    }

    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Release the mapping and file handle
    pub fn close(self) {
        debug!(path = %self.path.display(), "closed lookup");
    }
}

impl<'a> IntoIterator for &'a DocnoIndex {
    type Item = Vec<u8>;
    type IntoIter = Box<dyn Iterator<Item = Vec<u8>> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
