//! # runres
//!
//! A Rust lister/extractor for `.res`/`.hex` resource directory containers,
//! with HTTP URL support using Range requests.
//!
//! This library reads the fixed-width tagged directory format used by the
//! MX-era game containers: a bare concatenation of entries, each carrying
//! an ASCII-decimal path length, the path bytes, and the ASCII-decimal
//! start offset and size of the resource inside a companion data blob.
//! For remote containers it uses HTTP Range requests, so listing a
//! directory or pulling a single resource out of a large remote blob does
//! not download the rest of it.
//!
//! ## Features
//!
//! - List directory entries from local files or HTTP/HTTPS URLs
//! - Extract resource payloads from a companion data blob by offset/size
//! - Lenient ASCII integer decoding matching the containers in the wild,
//!   with an opt-in strict mode for validating fresh directories
//! - Damaged directories still yield the entries before the damage
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use runres::{FileSource, ResExtractor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let directory = Arc::new(FileSource::open("types.hex".as_ref())?);
//!     let data = Arc::new(FileSource::open("types.res".as_ref())?);
//!
//!     let extractor = ResExtractor::new(directory).with_data(data);
//!
//!     for entry in extractor.entries().await? {
//!         println!("{} @ {} ({} bytes)", entry.name(), entry.start, entry.size);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod io;
pub mod res;

pub use cli::Cli;
pub use io::{ByteSource, FileSource, HttpRangeSource};
pub use res::{DirEntry, DirectoryParser, IntegerPolicy, ParseError, ResExtractor, TagReader};
