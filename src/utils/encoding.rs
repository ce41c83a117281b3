use std::io::{self, Write};

/// Read a u32 in little-endian format at `offset`
#[inline]
pub fn u32_le_at(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset + 4)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

/// Read an i64 in little-endian format at `offset`
#[inline]
pub fn i64_le_at(buf: &[u8], offset: usize) -> Option<i64> {
    let bytes = buf.get(offset..offset + 8)?;
    Some(i64::from_le_bytes(bytes.try_into().ok()?))
}

/// Read an unsigned little-endian integer of 1, 2, 4 or 8 bytes
#[inline]
pub fn uint_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Append the low `width` bytes of `value` in little-endian format
#[inline]
pub fn push_uint_le(value: u64, width: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_le_bytes()[..width]);
}

/// Write a u32 in little-endian format
pub fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Write an i64 in little-endian format
pub fn write_i64_le<W: Write>(writer: &mut W, value: i64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Smallest power-of-two byte width (1, 2, 4 or 8) holding `value`
#[inline]
pub fn uint_width(value: u64) -> usize {
    match value {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFFFF_FFFF => 4,
        _ => 8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint_width() {
        assert_eq!(uint_width(0), 1);
        assert_eq!(uint_width(255), 1);
        assert_eq!(uint_width(256), 2);
        assert_eq!(uint_width(70_000), 4);
        assert_eq!(uint_width(u64::MAX), 8);
    }

    #[test]
    fn test_uint_packing() {
        let mut buf = Vec::new();
        push_uint_le(0x0102, 2, &mut buf);
        push_uint_le(7, 1, &mut buf);
        assert_eq!(buf, vec![0x02, 0x01, 7]);
        assert_eq!(uint_le(&buf[..2]), 0x0102);
        assert_eq!(uint_le(&buf[2..]), 7);
    }

    #[test]
    fn test_slice_reads_out_of_bounds() {
        let buf = [1u8, 0, 0, 0, 2];
        assert_eq!(u32_le_at(&buf, 0), Some(1));
        assert_eq!(u32_le_at(&buf, 2), None);
        assert_eq!(i64_le_at(&buf, 0), None);
    }
}
