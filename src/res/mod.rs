//! Resource directory parsing and extraction.
//!
//! This module reads the `.hex`/`.res` resource directory container used by
//! the MX-era game data and pulls payloads out of the blob it indexes.
//!
//! ## Architecture
//!
//! The module is organized into three main components:
//!
//! - [`structures`]: format constants and the [`DirEntry`] record
//! - [`parser`]: low-level tag reading and the sequential directory parser
//! - [`extractor`]: high-level listing and payload extraction over byte
//!   sources
//!
//! ## Format Overview
//!
//! A directory file is a bare concatenation of entries with no header,
//! footer, or entry count. Each entry is four fixed-order fields:
//!
//! | Width          | Field       | Encoding      |
//! |----------------|-------------|---------------|
//! | 4 bytes        | path length | ASCII decimal |
//! | `length` bytes | path        | raw bytes     |
//! | 4 bytes        | start       | ASCII decimal |
//! | 4 bytes        | size        | ASCII decimal |
//!
//! The end of the directory is simply the end of the file; running out of
//! bytes anywhere else inside an entry is a truncation error. `start` and
//! `size` describe where the named resource lives inside a companion data
//! blob, so listing needs only the (small) directory file while extraction
//! additionally ranges into the blob.
//!
//! ## Limitations
//!
//! - No compression; payloads are stored verbatim in the blob
//! - No random access within the directory itself: entries are only
//!   reachable by scanning from the first byte

pub mod extractor;
pub mod parser;
pub mod structures;

pub use extractor::ResExtractor;
pub use parser::{DirectoryParser, IntegerPolicy, ParseError, TagReader};
pub use structures::{DirEntry, INT_TAG_WIDTH, MAX_PATH_LEN};
