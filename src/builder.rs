//! Streaming forward builder
//!
//! Docnos arrive one at a time. While seeding, every registered codec tries
//! to explain the buffered docnos; once the buffer reaches
//! `min_block_size` the smallest surviving codec is sealed and written as a
//! forward block. Later docnos are encoded straight into that block until
//! one falls outside its pattern, which ends the block and starts a new
//! seeding round with the failing docno.

use crate::codec::{FORWARD_CODECS, ForwardCodec};
use crate::container::{ContainerWriter, RecordType};
use crate::error::{Error, Result};
use crate::lookup::inverse;
use crate::types::{BuildConfig, DocIdx};
use crate::utils::progress::BuildProgress;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Codecs still competing to explain the current seeding round
pub(crate) struct CandidatePool {
    candidates: Vec<Box<dyn ForwardCodec>>,
}

impl CandidatePool {
    /// One fresh instance of every registered codec, in registry order
    pub(crate) fn fresh() -> Self {
        Self {
            candidates: FORWARD_CODECS.iter().map(|entry| (entry.make)()).collect(),
        }
    }

    /// Feed `docno` to every candidate, dropping the ones it eliminates
    pub(crate) fn seed(&mut self, docno: &[u8]) {
        self.candidates.retain_mut(|codec| {
            let alive = codec.seed(docno);
            if !alive {
                codec.reset();
            }
            alive
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.candidates.len()
    }

    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.candidates.iter().map(|codec| codec.name()).collect()
    }

    /// Remove the candidate with the smallest entry size; the earliest
    /// registered wins ties
    pub(crate) fn take_best(&mut self) -> Option<Box<dyn ForwardCodec>> {
        let (best, _) = self
            .candidates
            .iter()
            .enumerate()
            .min_by_key(|(_, codec)| codec.size())?;
        Some(self.candidates.remove(best))
    }
}

/// Builds the forward blocks of a lookup file from a stream of docnos
pub struct ForwardBuilder {
    writer: ContainerWriter,
    config: BuildConfig,
    pool: CandidatePool,
    seeds: Vec<Vec<u8>>,
    sealed: Option<Box<dyn ForwardCodec>>,
    block_len: u64,
    total: u64,
    blocks: usize,
    scratch: Vec<u8>,
    progress: Option<BuildProgress>,
}

impl ForwardBuilder {
    /// Start building into `path`. An existing version 1 file is appended to.
    pub fn new(path: &Path, config: BuildConfig) -> Result<Self> {
        let writer = ContainerWriter::open(path)?;
        Ok(Self {
            writer,
            seeds: Vec::with_capacity(config.min_block_size),
            config,
            pool: CandidatePool::fresh(),
            sealed: None,
            block_len: 0,
            total: 0,
            blocks: 0,
            scratch: Vec::new(),
            progress: None,
        })
    }

    /// Show a spinner while docnos are added
    pub fn with_progress(mut self) -> Self {
        self.progress = Some(BuildProgress::new("Building"));
        self
    }

    /// Docnos added so far
    pub fn len(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    /// Append a docno, returning the index it was assigned
    pub fn add(&mut self, docno: impl AsRef<[u8]>) -> Result<DocIdx> {
        let docno = docno.as_ref();
        let idx = self.total;

        if let Some(codec) = self.sealed.as_mut() {
            self.scratch.clear();
            if codec.encode(docno, &mut self.scratch) {
                self.writer.write(&self.scratch)?;
                self.block_len += 1;
                self.advance();
                return Ok(idx);
            }
            self.close_block()?;
        }

        self.pool.seed(docno);
        if self.pool.len() == 0 {
            return Err(Error::Internal(format!(
                "no forward codec accepts docno {:?}",
                String::from_utf8_lossy(docno)
            )));
        }
        self.seeds.push(docno.to_vec());
        self.advance();

        if self.seeds.len() >= self.config.min_block_size {
            self.commit()?;
        }
        Ok(idx)
    }

    /// Add every docno from an iterator
    pub fn extend<I>(&mut self, docnos: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        for docno in docnos {
            self.add(docno)?;
        }
        Ok(())
    }

    /// Seal the forward blocks, then build the inverse index if configured.
    /// Returns the path of the finished file.
    pub fn finish(mut self) -> Result<PathBuf> {
        if !self.seeds.is_empty() {
            self.commit()?;
        }
        self.close_block()?;

        let path = self.writer.path().to_path_buf();
        if let Some(progress) = &self.progress {
            progress.finish(format!("{} docnos in {} blocks", self.total, self.blocks));
        }
        debug!(
            path = %path.display(),
            docnos = self.total,
            blocks = self.blocks,
            "sealed forward blocks"
        );
        self.writer.finish()?;

        if self.config.build_inverse {
            inverse::build_inverse(&path, &self.config)?;
        }
        Ok(path)
    }

    fn advance(&mut self) {
        self.total += 1;
        if let Some(progress) = &self.progress {
            progress.inc(1);
        }
    }

    /// Seal the best candidate and write the buffered docnos as a new block
    fn commit(&mut self) -> Result<()> {
        let mut codec = self
            .pool
            .take_best()
            .ok_or_else(|| Error::Internal("no forward codec survived seeding".to_string()))?;
        let config = codec
            .config()
            .ok_or_else(|| Error::Internal(format!("{} has no config after seeding", codec.name())))?;

        self.writer
            .write_header(RecordType::Forward, self.seeds.len() as u64, &config)?;
        self.scratch.clear();
        for docno in &self.seeds {
            if !codec.encode(docno, &mut self.scratch) {
                return Err(Error::Internal(format!(
                    "{} rejected docno {:?} it had seeded",
                    codec.name(),
                    String::from_utf8_lossy(docno)
                )));
            }
        }
        self.writer.write(&self.scratch)?;

        debug!(
            format = codec.name(),
            seeded = self.seeds.len(),
            start = self.total - self.seeds.len() as u64,
            "committed forward block"
        );
        self.block_len = self.seeds.len() as u64;
        self.seeds.clear();
        self.pool = CandidatePool::fresh();
        self.sealed = Some(codec);
        self.blocks += 1;
        Ok(())
    }

    /// End the sealed block, recording its final length
    fn close_block(&mut self) -> Result<()> {
        if let Some(codec) = self.sealed.take() {
            self.writer.write_doc_count(self.block_len)?;
            debug!(format = codec.name(), docnos = self.block_len, "closed forward block");
            self.block_len = 0;
        }
        Ok(())
    }
}
