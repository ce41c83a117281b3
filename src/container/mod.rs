//! Chained-record container file
//!
//! A lookup file is a singly linked list of records. Each record is a fixed
//! 24-byte header, a JSON config, and a raw payload that runs up to the next
//! record (or the end of the file).
//!
//! ## File Format (version 1)
//!
//! ```text
//! magic:   type_id=NPID next_ptr doc_count=0 config_len  {"version":1}
//! record:  type_id:u32 next_ptr:i64 doc_count:i64 config_len:u32  config  payload
//! ...
//! last:    next_ptr = -1
//! ```
//!
//! Version 0 files have no magic record and order the header fields as
//! `next_ptr, doc_count, config_len, type_id`. They can be read but not
//! appended to.

pub mod header;
pub mod reader;
pub mod writer;

pub use header::{HeaderLayout, RecordHeader, RecordType};
pub use reader::{ContainerReader, Payload, Record};
pub use writer::ContainerWriter;

use serde::{Deserialize, Serialize};

/// `type_id` of the magic record: the bytes "NPID" read as a little-endian u32
pub const MAGIC_TYPE: u32 = 0x4449_504E;

/// `doc_count` carried by the magic record
pub const MAGIC_DOC_COUNT: i64 = 0;

/// Highest file format version this crate reads, and the one it writes
pub const FORMAT_VERSION: u32 = 1;

/// `next_ptr` value terminating the chain
pub const END_OF_CHAIN: i64 = -1;

/// Config carried by the magic record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub version: u64,
}

impl FileConfig {
    pub fn current() -> Self {
        Self {
            version: FORMAT_VERSION as u64,
        }
    }
}
