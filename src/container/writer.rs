//! Append-only container writer
//!
//! The writer remembers the offset of the last header it wrote (or found
//! while opening) so it can patch that header's `next_ptr` when a new record
//! is appended, and its `doc_count` once a block's final length is known.

use super::header::{HeaderLayout, RecordHeader, RecordType};
use super::{END_OF_CHAIN, FORMAT_VERSION, FileConfig};
use crate::error::{Error, Result};
use crate::utils::write_i64_le;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

/// Seeks away from the current write position and returns to it when
/// dropped, so a failed patch never leaves the cursor mid-file.
struct SeekGuard<'a> {
    file: &'a mut BufWriter<File>,
    restore: u64,
    restored: bool,
}

impl<'a> SeekGuard<'a> {
    fn new(file: &'a mut BufWriter<File>) -> io::Result<Self> {
        let restore = file.stream_position()?;
        Ok(Self {
            file,
            restore,
            restored: false,
        })
    }

    fn restore(mut self) -> io::Result<()> {
        self.restored = true;
        self.file.seek(SeekFrom::Start(self.restore)).map(|_| ())
    }
}

impl Deref for SeekGuard<'_> {
    type Target = BufWriter<File>;

    fn deref(&self) -> &Self::Target {
        self.file
    }
}

impl DerefMut for SeekGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.file
    }
}

impl Drop for SeekGuard<'_> {
    fn drop(&mut self) {
        if !self.restored {
            let _ = self.file.seek(SeekFrom::Start(self.restore));
        }
    }
}

/// Writer appending records to a container file
pub struct ContainerWriter {
    path: PathBuf,
    file: BufWriter<File>,
    layout: HeaderLayout,
    last_header: Option<u64>,
}

impl ContainerWriter {
    /// Open a container for appending, creating it (with its magic record)
    /// if it does not exist yet
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create_new(true)
                .open(path)?;
            let mut writer = Self {
                path: path.to_path_buf(),
                file: BufWriter::with_capacity(65536, file),
                layout: HeaderLayout::V1,
                last_header: None,
            };
            writer.write_header(RecordType::Magic, 0, &FileConfig::current())?;
            return Ok(writer);
        }

        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let last_header = find_last_header(&mut file, path)?;
        file.seek(SeekFrom::End(0))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::with_capacity(65536, file),
            layout: HeaderLayout::V1,
            last_header: Some(last_header),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record header and its JSON config, linking it from the
    /// previous header. Returns the new header's offset.
    pub fn write_header<C: Serialize>(
        &mut self,
        record_type: RecordType,
        doc_count: u64,
        config: &C,
    ) -> Result<u64> {
        let config = serde_json::to_vec(config)?;
        let here = self.file.stream_position()?;

        if let Some(last) = self.last_header {
            self.patch_i64(last + self.layout.next_ptr_offset(), here as i64)?;
        }

        let header = RecordHeader {
            type_id: record_type as u32,
            next_ptr: END_OF_CHAIN,
            doc_count: doc_count as i64,
            config_len: config.len() as u32,
        };
        self.layout.encode(&mut self.file, &header)?;
        self.file.write_all(&config)?;
        self.last_header = Some(here);
        Ok(here)
    }

    /// Overwrite the `doc_count` of the most recently written header
    pub fn write_doc_count(&mut self, doc_count: u64) -> Result<()> {
        let last = self.last_header.ok_or_else(|| {
            Error::Internal("doc_count patched before any header was written".to_string())
        })?;
        self.patch_i64(last + self.layout.doc_count_offset(), doc_count as i64)
    }

    /// Append raw payload bytes to the current record
    #[inline]
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if !bytes.is_empty() {
            self.file.write_all(bytes)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }

    /// Flush and close the file
    pub fn finish(mut self) -> Result<()> {
        self.file.flush()?;
        self.file.get_ref().sync_data()?;
        Ok(())
    }

    fn patch_i64(&mut self, at: u64, value: i64) -> Result<()> {
        let mut guard = SeekGuard::new(&mut self.file)?;
        guard.seek(SeekFrom::Start(at))?;
        write_i64_le(&mut *guard, value)?;
        guard.flush()?;
        guard.restore()?;
        Ok(())
    }
}

/// Walk an existing chain and return the offset of its last header
fn find_last_header(file: &mut File, path: &Path) -> Result<u64> {
    let len = file.metadata()?.len();
    let mut buf = [0u8; HeaderLayout::SIZE];

    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut buf).map_err(|_| {
        Error::CorruptChain(format!("{} is too small to hold a record header", path.display()))
    })?;
    let layout = HeaderLayout::detect(&buf);
    if layout == HeaderLayout::V0 {
        return Err(Error::LegacyAppend(path.to_path_buf()));
    }

    let magic = read_header(file, layout, 0, len)?;
    let mut config = vec![0u8; magic.config_len as usize];
    file.read_exact(&mut config)?;
    let config: FileConfig = serde_json::from_slice(&config)?;
    if config.version > FORMAT_VERSION as u64 {
        return Err(Error::UnsupportedVersion {
            found: config.version,
            supported: FORMAT_VERSION,
        });
    }

    let mut offset = 0u64;
    let mut next = magic.next_ptr;
    while next != END_OF_CHAIN {
        let next_offset = u64::try_from(next)
            .ok()
            .filter(|&n| n > offset)
            .ok_or_else(|| {
                Error::CorruptChain(format!(
                    "next_ptr {} does not advance past record at {}",
                    next, offset
                ))
            })?;
        offset = next_offset;
        next = read_header(file, layout, offset, len)?.next_ptr;
    }
    Ok(offset)
}

fn read_header(file: &mut File, layout: HeaderLayout, offset: u64, len: u64) -> Result<RecordHeader> {
    if offset + HeaderLayout::SIZE as u64 > len {
        return Err(Error::CorruptChain(format!(
            "header at {} exceeds file of {} bytes",
            offset, len
        )));
    }
    let mut buf = [0u8; HeaderLayout::SIZE];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf)?;
    layout
        .decode(&buf, 0)
        .ok_or_else(|| Error::CorruptChain(format!("unreadable header at {}", offset)))
}
