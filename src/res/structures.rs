use std::borrow::Cow;

use anyhow::{Result, bail};

/// Width in bytes of every fixed-width integer tag in the directory stream.
///
/// The format carries its numbers as ASCII decimal inside windows of this
/// width. Kept as a named constant: a revised container generation with a
/// wider tag is a one-line change here.
pub const INT_TAG_WIDTH: usize = 4;

/// Upper bound on the length of an entry path, in bytes.
///
/// A length tag above this value means the stream is not a directory (or is
/// corrupt) and parsing fails before any path byte is consumed.
pub const MAX_PATH_LEN: usize = 256;

/// One record of the resource directory: where a named resource lives
/// inside the payload blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Path as stored in the container. Raw bytes, not guaranteed to be
    /// valid UTF-8.
    pub path: Vec<u8>,
    /// Offset of the first payload byte within the data blob.
    pub start: u64,
    /// Payload length in bytes.
    pub size: u64,
}

impl DirEntry {
    /// Entry path for display, lossily decoded.
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.path)
    }

    /// One past the last payload byte.
    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    /// Entry path with Windows-style separators normalized to `/`,
    /// suitable for joining onto an output directory.
    pub fn relative_path(&self) -> String {
        self.name().replace('\\', "/")
    }

    /// Serialize this entry back into the fixed-width tagged layout.
    ///
    /// Counterpart of the decoder: integer tags are rendered as zero-padded
    /// ASCII decimal. Fails if a field does not fit its tag width, since a
    /// wider rendering would desync every later field in the stream.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        if self.path.len() > MAX_PATH_LEN {
            bail!(
                "path is {} bytes, limit is {}",
                self.path.len(),
                MAX_PATH_LEN
            );
        }
        encode_int_tag(self.path.len() as u64, out)?;
        out.extend_from_slice(&self.path);
        encode_int_tag(self.start, out)?;
        encode_int_tag(self.size, out)?;
        Ok(())
    }
}

fn encode_int_tag(value: u64, out: &mut Vec<u8>) -> Result<()> {
    let rendered = format!("{:0width$}", value, width = INT_TAG_WIDTH);
    if rendered.len() > INT_TAG_WIDTH {
        bail!("value {value} does not fit a {INT_TAG_WIDTH}-byte tag");
    }
    out.extend_from_slice(rendered.as_bytes());
    Ok(())
}
