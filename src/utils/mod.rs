//! Utility functions shared by the container, codecs and inverse indexes.
//!
//! - [`encoding`] - Little-endian integer packing over byte slices
//! - [`hash`] - FNV-1 hashing used by the hash inverse index
//! - [`progress`] - Progress reporting that becomes a no-op without the `progress` feature

pub mod encoding;
pub mod hash;
pub mod progress;

pub use encoding::*;
pub use hash::*;
