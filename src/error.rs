//! Error types for npids

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "File format version {found} is newer than the supported version {supported}; upgrade npids to read this file"
    )]
    UnsupportedVersion { found: u64, supported: u32 },

    #[error("Docno not found: {0:?}")]
    NotFound(String),

    #[error("Index {index} out of range for lookup of length {len}")]
    IndexOutOfRange { index: u64, len: u64 },

    #[error("Corrupt record chain: {0}")]
    CorruptChain(String),

    #[error("Corrupt data: {0}")]
    Corruption(String),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Refusing to append to version 0 file {0}")]
    LegacyAppend(PathBuf),

    #[error("Docno is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for the recoverable lookup misses (unknown docno, out-of-range index).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::IndexOutOfRange { .. })
    }

    pub(crate) fn not_found(docno: &[u8]) -> Self {
        Error::NotFound(String::from_utf8_lossy(docno).into_owned())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(Error::not_found(b"-1").is_not_found());
        assert!(Error::IndexOutOfRange { index: 5, len: 3 }.is_not_found());
        assert!(!Error::Corruption("bad".into()).is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedVersion {
            found: 7,
            supported: 1,
        };
        assert!(err.to_string().contains("version 7"));
        assert_eq!(Error::not_found(b"abc").to_string(), "Docno not found: \"abc\"");
    }
}
