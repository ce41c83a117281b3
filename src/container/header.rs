//! Record header layouts
//!
//! Both layouts are 24 bytes; they differ only in field order. The layout is
//! resolved once when a file is opened and used for every header after that.

use super::MAGIC_TYPE;
use crate::utils::{i64_le_at, u32_le_at, write_i64_le, write_u32_le};
use std::io::{self, Write};

/// Kind of record stored in a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RecordType {
    Forward = 0,
    Inverse = 1,
    Magic = MAGIC_TYPE,
}

impl RecordType {
    pub fn from_u32(type_id: u32) -> Option<Self> {
        match type_id {
            0 => Some(RecordType::Forward),
            1 => Some(RecordType::Inverse),
            MAGIC_TYPE => Some(RecordType::Magic),
            _ => None,
        }
    }
}

/// Decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub type_id: u32,
    pub next_ptr: i64,
    pub doc_count: i64,
    pub config_len: u32,
}

/// Field order of a record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// `next_ptr, doc_count, config_len, type_id`
    V0,
    /// `type_id, next_ptr, doc_count, config_len`
    V1,
}

impl HeaderLayout {
    /// Size of a header in bytes (same for both layouts)
    pub const SIZE: usize = 4 + 8 + 8 + 4;

    /// Offset of `next_ptr` within a header
    pub fn next_ptr_offset(self) -> u64 {
        match self {
            HeaderLayout::V0 => 0,
            HeaderLayout::V1 => 4,
        }
    }

    /// Offset of `doc_count` within a header
    pub fn doc_count_offset(self) -> u64 {
        match self {
            HeaderLayout::V0 => 8,
            HeaderLayout::V1 => 12,
        }
    }

    /// Decode the header starting at `offset`; `None` if it does not fit
    pub fn decode(self, buf: &[u8], offset: usize) -> Option<RecordHeader> {
        let end = offset.checked_add(Self::SIZE)?;
        let bytes = buf.get(offset..end)?;
        let header = match self {
            HeaderLayout::V0 => RecordHeader {
                next_ptr: i64_le_at(bytes, 0)?,
                doc_count: i64_le_at(bytes, 8)?,
                config_len: u32_le_at(bytes, 16)?,
                type_id: u32_le_at(bytes, 20)?,
            },
            HeaderLayout::V1 => RecordHeader {
                type_id: u32_le_at(bytes, 0)?,
                next_ptr: i64_le_at(bytes, 4)?,
                doc_count: i64_le_at(bytes, 12)?,
                config_len: u32_le_at(bytes, 20)?,
            },
        };
        Some(header)
    }

    pub fn encode<W: Write>(self, writer: &mut W, header: &RecordHeader) -> io::Result<()> {
        match self {
            HeaderLayout::V0 => {
                write_i64_le(writer, header.next_ptr)?;
                write_i64_le(writer, header.doc_count)?;
                write_u32_le(writer, header.config_len)?;
                write_u32_le(writer, header.type_id)
            }
            HeaderLayout::V1 => {
                write_u32_le(writer, header.type_id)?;
                write_i64_le(writer, header.next_ptr)?;
                write_i64_le(writer, header.doc_count)?;
                write_u32_le(writer, header.config_len)
            }
        }
    }

    /// Detect the layout from the first bytes of a file
    pub fn detect(buf: &[u8]) -> HeaderLayout {
        match u32_le_at(buf, 0) {
            Some(MAGIC_TYPE) => HeaderLayout::V1,
            _ => HeaderLayout::V0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordHeader {
        RecordHeader {
            type_id: 1,
            next_ptr: -1,
            doc_count: 42,
            config_len: 17,
        }
    }

    #[test]
    fn test_layouts_differ_only_in_order() {
        let mut v0 = Vec::new();
        let mut v1 = Vec::new();
        HeaderLayout::V0.encode(&mut v0, &sample()).unwrap();
        HeaderLayout::V1.encode(&mut v1, &sample()).unwrap();
        assert_eq!(v0.len(), HeaderLayout::SIZE);
        assert_eq!(v1.len(), HeaderLayout::SIZE);
        assert_ne!(v0, v1);
        assert_eq!(HeaderLayout::V0.decode(&v0, 0), Some(sample()));
        assert_eq!(HeaderLayout::V1.decode(&v1, 0), Some(sample()));
    }

    #[test]
    fn test_patch_offsets_point_at_fields() {
        for layout in [HeaderLayout::V0, HeaderLayout::V1] {
            let mut buf = Vec::new();
            layout.encode(&mut buf, &sample()).unwrap();
            let at = layout.doc_count_offset() as usize;
            assert_eq!(i64_le_at(&buf, at), Some(42));
            let at = layout.next_ptr_offset() as usize;
            assert_eq!(i64_le_at(&buf, at), Some(-1));
        }
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(&MAGIC_TYPE.to_le_bytes(), b"NPID");
        assert_eq!(HeaderLayout::detect(b"NPID\xff\xff"), HeaderLayout::V1);
        assert_eq!(HeaderLayout::detect(b"\x18\0\0\0"), HeaderLayout::V0);
        assert_eq!(HeaderLayout::decode(HeaderLayout::V1, b"short", 0), None);
    }
}
