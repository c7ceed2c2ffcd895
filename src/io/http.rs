use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;

use super::ByteSource;

/// Byte source over a remote file, fetched piecewise with HTTP Range
/// requests.
///
/// Listing a directory costs one ranged GET for the directory stream;
/// extracting a resource costs one ranged GET per entry, so a single
/// payload can be pulled out of a large remote blob without downloading
/// the rest of it.
pub struct HttpRangeSource {
    client: Client,
    url: String,
    size: u64,
    bytes_fetched: AtomicU64,
    retry_limit: u32,
}

impl HttpRangeSource {
    /// Probe `url` with a HEAD request, verifying Range support and
    /// learning the remote size.
    pub async fn connect(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let resp = client.head(&url).send().await?;
        if !resp.status().is_success() {
            bail!("HEAD {} failed with status {}", url, resp.status());
        }

        let accepts_ranges = resp
            .headers()
            .get("accept-ranges")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("bytes"));
        if !accepts_ranges {
            bail!("server for {} does not accept Range requests", url);
        }

        let size = resp
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("server for {} did not report Content-Length", url))?;

        Ok(Self {
            client,
            url,
            size,
            bytes_fetched: AtomicU64::new(0),
            retry_limit: 10,
        })
    }

    /// Total bytes pulled over the network so far.
    pub fn bytes_fetched(&self) -> u64 {
        self.bytes_fetched.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ByteSource for HttpRangeSource {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let last = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let wanted = (last - offset + 1) as usize;

        let mut received = 0;
        let mut attempts = 0;

        while received < wanted {
            let range = format!("bytes={}-{}", offset + received as u64, last);
            match self
                .client
                .get(&self.url)
                .header("Range", &range)
                .send()
                .await
            {
                Ok(resp) => {
                    if resp.status() != reqwest::StatusCode::PARTIAL_CONTENT {
                        bail!("GET {} ({}) failed with status {}", self.url, range, resp.status());
                    }

                    let body = resp.bytes().await?;
                    let n = body.len().min(wanted - received);
                    buf[received..received + n].copy_from_slice(&body[..n]);
                    received += n;
                    self.bytes_fetched.fetch_add(n as u64, Ordering::Relaxed);
                }
                // Transport hiccups get retried with backoff; anything else
                // is surfaced as-is. The parse above never retries.
                Err(e) if e.is_timeout() || e.is_connect() => {
                    attempts += 1;
                    if attempts >= self.retry_limit {
                        bail!("giving up on {} after {} attempts: {}", self.url, attempts, e);
                    }
                    eprintln!("transfer error, retry {}/{}: {}", attempts, self.retry_limit, e);
                    tokio::time::sleep(Duration::from_millis(500 * u64::from(attempts))).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
