mod http;
mod local;

pub use http::HttpRangeSource;
pub use local::FileSource;

use anyhow::{Result, bail};
use async_trait::async_trait;

/// A finite, offset-addressed supply of bytes.
///
/// Implementors back the parser and extractor with container bytes, whether
/// those live in a local file or behind an HTTP server that honors Range
/// requests.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Read into `buf` starting at `offset`, returning how many bytes
    /// landed. Short reads are allowed.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Total size of the source in bytes.
    fn size(&self) -> u64;

    /// Fill `buf` completely from `offset`, failing if the source runs out
    /// first.
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .read_at(offset + filled as u64, &mut buf[filled..])
                .await?;
            if n == 0 {
                bail!(
                    "source ended after {} of {} bytes at offset {}",
                    filled,
                    buf.len(),
                    offset
                );
            }
            filled += n;
        }
        Ok(())
    }
}
