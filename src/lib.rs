//! # npids - compact docno lookups
//!
//! npids stores a bidirectional mapping between dense indices `[0, N)` and
//! document identifiers ("docnos") in a single memory-mapped file. Runs of
//! docnos that follow a pattern (consecutive numbers, zero-padded numbers,
//! UUIDs, hex digests, shared prefixes) are stored in zero or a few bytes
//! each instead of as literal text.
//!
//! ## Architecture
//!
//! - [`container`] - Chained-record file format (reader and append-only writer)
//! - [`codec`] - Forward codecs that discover and encode docno patterns
//! - [`builder`] - Streaming builder choosing a codec per block
//! - [`lookup`] - Forward and inverse lookups over an opened file
//! - [`stats`] - Summaries of an opened file
//! - [`utils`] - Little-endian helpers, FNV-1, progress reporting
//!
//! ## Quick Start
//!
//! ```no_run
//! use npids::{BuildConfig, DocnoIndex};
//! use std::path::Path;
//!
//! let docnos = ["LA010189-0001", "LA010189-0002", "LA010189-0003"];
//! let index = DocnoIndex::build(docnos, Path::new("docnos.npids"), BuildConfig::default())?;
//!
//! assert_eq!(index.get(1)?, "LA010189-0002");
//! assert_eq!(index.find("LA010189-0003")?, 2);
//! assert_eq!(index.inverse(&["LA010189-0001", "missing"])?, vec![0, -1]);
//! # Ok::<(), npids::Error>(())
//! ```

pub mod builder;
pub mod codec;
pub mod container;
pub mod error;
pub mod lookup;
pub mod stats;
pub mod types;
pub mod utils;

pub use builder::ForwardBuilder;
pub use codec::DocnoBatch;
pub use error::{Error, Result};
pub use lookup::{Answer, DocnoIndex, Query, build_inverse};
pub use stats::LookupStats;
pub use types::{BuildConfig, DocIdx, NOT_FOUND};
