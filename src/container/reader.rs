//! Container reader
//!
//! Maps the whole file read-only and replays the record chain. Every
//! `next_ptr` must move strictly forward and stay inside the file, so a
//! damaged chain fails cleanly instead of looping or reading out of bounds.

use super::header::{HeaderLayout, RecordHeader, RecordType};
use super::{END_OF_CHAIN, FORMAT_VERSION, FileConfig};
use crate::error::{Error, Result};
use memmap2::Mmap;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A byte range of the memory-mapped file
#[derive(Clone)]
pub struct Payload {
    map: Arc<Mmap>,
    range: Range<usize>,
}

impl Payload {
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.map[self.range.clone()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Sub-range of this payload, relative to its start
    pub fn slice(&self, range: Range<usize>) -> Result<Payload> {
        if range.start > range.end || range.end > self.len() {
            return Err(Error::Corruption(format!(
                "payload range {:?} exceeds payload of {} bytes",
                range,
                self.len()
            )));
        }
        Ok(Payload {
            map: Arc::clone(&self.map),
            range: self.range.start + range.start..self.range.start + range.end,
        })
    }

    /// Anonymous mapping holding `bytes`, for block tests
    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: &[u8]) -> Payload {
        let mut map = memmap2::MmapMut::map_anon(bytes.len().max(1)).unwrap();
        map[..bytes.len()].copy_from_slice(bytes);
        Payload {
            map: Arc::new(map.make_read_only().unwrap()),
            range: 0..bytes.len(),
        }
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Payload").field("range", &self.range).finish()
    }
}

/// One record of the chain
#[derive(Debug, Clone)]
pub struct Record {
    pub offset: u64,
    pub header: RecordHeader,
    pub record_type: RecordType,
    config: Payload,
    pub payload: Payload,
}

impl Record {
    /// Number of docnos the record covers
    pub fn doc_count(&self) -> Result<usize> {
        usize::try_from(self.header.doc_count).map_err(|_| {
            Error::Corruption(format!(
                "record at {} has negative doc_count {}",
                self.offset, self.header.doc_count
            ))
        })
    }

    /// Deserialize the record's JSON config
    pub fn config<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(self.config.bytes())?)
    }

    pub fn config_bytes(&self) -> &[u8] {
        self.config.bytes()
    }
}

/// Read-only view of a container file
pub struct ContainerReader {
    path: PathBuf,
    map: Arc<Mmap>,
    layout: HeaderLayout,
    version: u64,
    first_record: i64,
}

impl ContainerReader {
    /// Open and memory-map a container, validating its magic record
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        if (file.metadata()?.len() as usize) < HeaderLayout::SIZE {
            return Err(Error::CorruptChain(format!(
                "{} is too small to hold a record header",
                path.display()
            )));
        }
        let map = Arc::new(unsafe { Mmap::map(&file)? });

        let layout = HeaderLayout::detect(&map);
        let (version, first_record) = match layout {
            HeaderLayout::V1 => {
                let magic = layout.decode(&map, 0).ok_or_else(|| {
                    Error::CorruptChain("truncated magic record".to_string())
                })?;
                let config_end = HeaderLayout::SIZE + magic.config_len as usize;
                let config_bytes = map.get(HeaderLayout::SIZE..config_end).ok_or_else(|| {
                    Error::CorruptChain("magic record config exceeds file".to_string())
                })?;
                let config: FileConfig = serde_json::from_slice(config_bytes)?;
                if config.version > FORMAT_VERSION as u64 {
                    return Err(Error::UnsupportedVersion {
                        found: config.version,
                        supported: FORMAT_VERSION,
                    });
                }
                (config.version, magic.next_ptr)
            }
            HeaderLayout::V0 => {
                warn!(
                    path = %path.display(),
                    "magic header not found; reading as version 0 format, which may be deprecated"
                );
                (0, 0)
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            map,
            layout,
            version,
            first_record,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> HeaderLayout {
        self.layout
    }

    /// Format version declared by the file (0 for the legacy layout)
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Size of the mapped file in bytes
    pub fn file_len(&self) -> usize {
        self.map.len()
    }

    /// Replay the chain, returning every forward and inverse record in order
    pub fn records(&self) -> Result<Vec<Record>> {
        let len = self.map.len();
        let mut records = Vec::new();
        // the magic record sits at 0, so the first real record must lie past it
        let mut prev: Option<usize> = match self.layout {
            HeaderLayout::V1 => Some(0),
            HeaderLayout::V0 => None,
        };
        let mut ptr = self.first_record;

        while ptr != END_OF_CHAIN {
            let offset = usize::try_from(ptr)
                .map_err(|_| Error::CorruptChain(format!("invalid next_ptr {}", ptr)))?;
            if let Some(prev) = prev {
                if offset <= prev {
                    return Err(Error::CorruptChain(format!(
                        "next_ptr {} does not advance past record at {}",
                        offset, prev
                    )));
                }
            }

            let header = self.layout.decode(&self.map, offset).ok_or_else(|| {
                Error::CorruptChain(format!(
                    "header at {} exceeds file of {} bytes",
                    offset, len
                ))
            })?;

            let config_start = offset + HeaderLayout::SIZE;
            let config_end = config_start + header.config_len as usize;
            if config_end > len {
                return Err(Error::CorruptChain(format!(
                    "config of record at {} exceeds file of {} bytes",
                    offset, len
                )));
            }

            let payload_end = if header.next_ptr == END_OF_CHAIN {
                len
            } else {
                let next = usize::try_from(header.next_ptr).map_err(|_| {
                    Error::CorruptChain(format!("invalid next_ptr {}", header.next_ptr))
                })?;
                if next < config_end || next > len {
                    return Err(Error::CorruptChain(format!(
                        "next_ptr {} of record at {} points outside [{}, {}]",
                        next, offset, config_end, len
                    )));
                }
                next
            };

            match RecordType::from_u32(header.type_id) {
                Some(record_type @ (RecordType::Forward | RecordType::Inverse)) => {
                    records.push(Record {
                        offset: offset as u64,
                        header,
                        record_type,
                        config: self.payload(config_start..config_end),
                        payload: self.payload(config_end..payload_end),
                    });
                }
                _ => debug!(offset, type_id = header.type_id, "skipping unknown record type"),
            }

            prev = Some(offset);
            ptr = header.next_ptr;
        }

        Ok(records)
    }

    fn payload(&self, range: Range<usize>) -> Payload {
        Payload {
            map: Arc::clone(&self.map),
            range,
        }
    }
}
