use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::io::ByteSource;

use super::parser::{DirectoryParser, IntegerPolicy, ParseError};
use super::structures::DirEntry;

/// Resource container extractor.
///
/// Built from a directory source (the `.hex`/`.res` directory file) and,
/// when payloads are wanted, a companion data source the entries' start
/// offsets point into. Listing needs only the directory.
pub struct ResExtractor {
    directory: Arc<dyn ByteSource>,
    data: Option<Arc<dyn ByteSource>>,
    policy: IntegerPolicy,
}

impl ResExtractor {
    pub fn new(directory: Arc<dyn ByteSource>) -> Self {
        Self {
            directory,
            data: None,
            policy: IntegerPolicy::default(),
        }
    }

    /// Attach the payload blob the directory indexes into.
    pub fn with_data(mut self, data: Arc<dyn ByteSource>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_policy(mut self, policy: IntegerPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetch the raw directory stream.
    ///
    /// The format has no entry count and no index, so enumerating entries
    /// means scanning the whole directory file. It is fetched in one read
    /// (a single Range request for HTTP sources) and parsed in memory.
    pub async fn read_directory(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.directory.size() as usize];
        self.directory.read_exact_at(0, &mut buf).await?;
        Ok(buf)
    }

    /// List every entry in the directory, in file order.
    pub async fn entries(&self) -> Result<Vec<DirEntry>> {
        let (entries, error) = self.entries_partial().await?;
        if let Some(err) = error {
            return Err(err.into());
        }
        Ok(entries)
    }

    /// Like [`ResExtractor::entries`], but a parse failure also hands back
    /// the entries decoded before it, so callers can show the readable
    /// prefix of a damaged directory.
    pub async fn entries_partial(&self) -> Result<(Vec<DirEntry>, Option<ParseError>)> {
        let stream = self.read_directory().await?;
        Ok(DirectoryParser::with_policy(&stream, self.policy).parse_all())
    }

    fn data_source(&self) -> Result<&Arc<dyn ByteSource>> {
        match &self.data {
            Some(data) => Ok(data),
            None => bail!("no payload source attached; pass the companion data file"),
        }
    }

    /// Extract one entry's payload to memory.
    pub async fn extract_to_memory(&self, entry: &DirEntry) -> Result<Vec<u8>> {
        let data = self.data_source()?;
        if entry.end() > data.size() {
            bail!(
                "{} spans bytes {}..{} but the payload source holds {}",
                entry.name(),
                entry.start,
                entry.end(),
                data.size()
            );
        }

        let mut buf = vec![0u8; entry.size as usize];
        data.read_exact_at(entry.start, &mut buf).await?;
        Ok(buf)
    }

    /// Extract one entry's payload to disk.
    pub async fn extract_to_file(&self, entry: &DirEntry, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let payload = self.extract_to_memory(entry).await?;

        let mut file = fs::File::create(output_path).await?;
        file.write_all(&payload).await?;

        Ok(())
    }

    /// Extract one entry's payload to stdout.
    pub async fn extract_to_stdout(&self, entry: &DirEntry) -> Result<()> {
        let payload = self.extract_to_memory(entry).await?;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(&payload).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    struct MemSource(Vec<u8>);

    #[async_trait]
    impl ByteSource for MemSource {
        async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
            let offset = offset as usize;
            if offset >= self.0.len() {
                return Ok(0);
            }
            let n = buf.len().min(self.0.len() - offset);
            buf[..n].copy_from_slice(&self.0[offset..offset + n]);
            Ok(n)
        }

        fn size(&self) -> u64 {
            self.0.len() as u64
        }
    }

    fn fixture() -> (Arc<MemSource>, Arc<MemSource>) {
        let payload = b"AAAABBBBBBCC".to_vec();
        let entries = [
            DirEntry {
                path: b"a.bin".to_vec(),
                start: 0,
                size: 4,
            },
            DirEntry {
                path: b"dir\\b.bin".to_vec(),
                start: 4,
                size: 6,
            },
            DirEntry {
                path: b"c.bin".to_vec(),
                start: 10,
                size: 2,
            },
        ];
        let mut stream = Vec::new();
        for entry in &entries {
            entry.encode(&mut stream).unwrap();
        }
        (Arc::new(MemSource(stream)), Arc::new(MemSource(payload)))
    }

    #[tokio::test]
    async fn lists_entries_from_a_source() {
        let (directory, _) = fixture();
        let extractor = ResExtractor::new(directory);

        let entries = extractor.entries().await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].relative_path(), "dir/b.bin");
        assert_eq!(entries[2].end(), 12);
    }

    #[tokio::test]
    async fn extracts_payload_slices() {
        let (directory, payload) = fixture();
        let extractor = ResExtractor::new(directory).with_data(payload);

        let entries = extractor.entries().await.unwrap();
        assert_eq!(extractor.extract_to_memory(&entries[0]).await.unwrap(), b"AAAA");
        assert_eq!(
            extractor.extract_to_memory(&entries[1]).await.unwrap(),
            b"BBBBBB"
        );
        assert_eq!(extractor.extract_to_memory(&entries[2]).await.unwrap(), b"CC");
    }

    #[tokio::test]
    async fn extraction_without_a_payload_source_fails() {
        let (directory, _) = fixture();
        let extractor = ResExtractor::new(directory);

        let entries = extractor.entries().await.unwrap();
        assert!(extractor.extract_to_memory(&entries[0]).await.is_err());
    }

    #[tokio::test]
    async fn extraction_past_the_payload_end_fails() {
        let (directory, payload) = fixture();
        let extractor = ResExtractor::new(directory).with_data(payload);

        let runaway = DirEntry {
            path: b"x".to_vec(),
            start: 8,
            size: 100,
        };
        assert!(extractor.extract_to_memory(&runaway).await.is_err());
    }

    #[tokio::test]
    async fn damaged_directory_still_lists_its_prefix() {
        let (directory, _) = fixture();
        let mut stream = directory.0.clone();
        stream.truncate(stream.len() - 3);

        let extractor = ResExtractor::new(Arc::new(MemSource(stream)));
        let (entries, error) = extractor.entries_partial().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(error, Some(ParseError::TruncatedEntry { .. })));

        assert!(extractor.entries().await.is_err());
    }
}
