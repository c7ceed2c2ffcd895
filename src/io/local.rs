use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::ByteSource;

/// Byte source over a local file, using positioned reads.
pub struct FileSource {
    file: std::fs::File,
    size: u64,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }
}

#[async_trait]
impl ByteSource for FileSource {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            Ok(self.file.read_at(buf, offset)?)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            Ok(self.file.seek_read(buf, offset)?)
        }

        #[cfg(not(any(unix, windows)))]
        {
            use std::io::{Read, Seek, SeekFrom};
            // No positioned read on this platform; seek a private handle so
            // concurrent reads don't race on a shared cursor.
            let mut file = self.file.try_clone()?;
            file.seek(SeekFrom::Start(offset))?;
            Ok(file.read(buf)?)
        }
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn positioned_reads_do_not_disturb_each_other() {
        let path = std::env::temp_dir().join(format!("runres-filesource-{}", std::process::id()));
        std::fs::write(&path, b"0123456789").unwrap();

        let source = FileSource::open(&path).unwrap();
        assert_eq!(source.size(), 10);

        let mut tail = [0u8; 4];
        source.read_exact_at(6, &mut tail).await.unwrap();
        let mut head = [0u8; 4];
        source.read_exact_at(0, &mut head).await.unwrap();

        assert_eq!(&tail, b"6789");
        assert_eq!(&head, b"0123");
        std::fs::remove_file(&path).ok();
    }
}
