//! 32-bit FNV-1 over docno bytes.
//!
//! Zero bytes are skipped so a docno hashes the same whether or not it
//! carries fixed-width NUL padding.

pub const FNV1_32_BASIS: u32 = 2_166_136_261;
pub const FNV1_32_PRIME: u32 = 16_777_619;

/// Name recorded in the hash inverse config
pub const FNV1_32_NAME: &str = "fnv1_32";

#[inline]
pub fn fnv1_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV1_32_BASIS;
    for &byte in bytes {
        if byte != 0 {
            hash = (hash ^ byte as u32).wrapping_mul(FNV1_32_PRIME);
        }
    }
    hash
}
