//! Low-level resource directory parser.
//!
//! This module walks the tagged byte stream of a `.hex`/`.res` directory
//! file and produces [`DirEntry`] records.
//!
//! ## Parsing Strategy
//!
//! The format has no header, footer, or entry count: the file is a plain
//! concatenation of entries, each one
//!
//! 1. a 4-byte ASCII-decimal path length,
//! 2. that many raw path bytes,
//! 3. a 4-byte ASCII-decimal start offset,
//! 4. a 4-byte ASCII-decimal payload size.
//!
//! The only way to enumerate entries is a sequential scan from the first
//! byte, so the caller fetches the whole directory region into memory once
//! and [`DirectoryParser`] walks it with a cursor. Reaching the end of the
//! stream exactly on an entry boundary is a clean stop; running out of
//! bytes anywhere inside an entry is a [`ParseError::TruncatedEntry`].

use thiserror::Error;

use super::structures::{DirEntry, INT_TAG_WIDTH, MAX_PATH_LEN};

/// Failure modes of the directory parse.
///
/// These are terminal for the parse attempt: the format is deterministic,
/// so re-reading the same bytes cannot succeed where the first pass failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A fixed-width read asked for more bytes than the stream still holds.
    #[error("unexpected end of input: needed {needed} bytes, {available} available")]
    UnexpectedEndOfInput { needed: usize, available: usize },

    /// A decoded field violates the format's bounds.
    #[error("invalid directory format: {0}")]
    InvalidFormat(String),

    /// The stream ended partway through an entry. Entries decoded before
    /// this point are still valid.
    #[error("directory truncated inside entry #{entry_index} (starting at byte {offset})")]
    TruncatedEntry { entry_index: usize, offset: usize },
}

/// How integer tags are decoded.
///
/// The containers in the wild are themselves inconsistent about padding
/// inside integer tags, so the permissive mode is the default; strict mode
/// exists for validating freshly produced directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegerPolicy {
    /// Skip leading whitespace, take an optional sign and then as many
    /// digits as present; a window with no digits decodes to 0.
    #[default]
    Permissive,
    /// The whole window, after optional leading whitespace and sign, must
    /// be digits, and at least one digit must be present.
    Strict,
}

/// Cursor over an in-memory directory stream, reading fixed-width tags.
#[derive(Debug, Clone)]
pub struct TagReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> TagReader<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte offset from the start of the stream.
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub const fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Read a raw tag of exactly `width` bytes and advance past it.
    ///
    /// The window is returned as-is; trailing NULs or padding are the
    /// producer's business, not a format guarantee.
    pub fn read_tag(&mut self, width: usize) -> Result<&'a [u8], ParseError> {
        if self.remaining() < width {
            return Err(ParseError::UnexpectedEndOfInput {
                needed: width,
                available: self.remaining(),
            });
        }
        let window = &self.data[self.pos..self.pos + width];
        self.pos += width;
        Ok(window)
    }

    /// Read a `width`-byte tag and decode it as an ASCII-decimal integer
    /// under the given policy.
    pub fn read_integer_tag(
        &mut self,
        width: usize,
        policy: IntegerPolicy,
    ) -> Result<i64, ParseError> {
        let window = self.read_tag(width)?;
        decode_ascii_int(window, policy)
    }
}

/// Decode an ASCII-decimal integer from a fixed-width tag window.
fn decode_ascii_int(window: &[u8], policy: IntegerPolicy) -> Result<i64, ParseError> {
    let mut i = 0;
    while i < window.len() && window[i].is_ascii_whitespace() {
        i += 1;
    }

    let mut negative = false;
    if i < window.len() && (window[i] == b'+' || window[i] == b'-') {
        negative = window[i] == b'-';
        i += 1;
    }

    let digits_start = i;
    let mut value: i64 = 0;
    while i < window.len() && window[i].is_ascii_digit() {
        value = value * 10 + i64::from(window[i] - b'0');
        i += 1;
    }

    if policy == IntegerPolicy::Strict && (i == digits_start || i != window.len()) {
        return Err(ParseError::InvalidFormat(format!(
            "malformed integer tag {:?}",
            String::from_utf8_lossy(window)
        )));
    }

    Ok(if negative { -value } else { value })
}

/// Sequential parser over a resource directory stream.
///
/// Yields one `Result<DirEntry, ParseError>` per entry, in file order, and
/// fuses after the first error. Entries already yielded remain with the
/// caller, which is how a truncated directory still produces its readable
/// prefix. The parse is forward-only; re-parsing needs a fresh parser over
/// the same bytes.
pub struct DirectoryParser<'a> {
    reader: TagReader<'a>,
    policy: IntegerPolicy,
    entry_index: usize,
    failed: bool,
}

impl<'a> DirectoryParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_policy(data, IntegerPolicy::default())
    }

    pub fn with_policy(data: &'a [u8], policy: IntegerPolicy) -> Self {
        Self {
            reader: TagReader::new(data),
            policy,
            entry_index: 0,
            failed: false,
        }
    }

    /// Decode the next entry at the current cursor position.
    ///
    /// Field order is fixed: path length, path bytes, start, size. The
    /// length bound is checked before any path byte is consumed, and an
    /// end-of-input failure in any field surfaces with no partial entry.
    pub fn decode_entry(&mut self) -> Result<DirEntry, ParseError> {
        let path_len = self.reader.read_integer_tag(INT_TAG_WIDTH, self.policy)?;
        if path_len < 0 || path_len as usize > MAX_PATH_LEN {
            return Err(ParseError::InvalidFormat(format!(
                "path length {path_len} outside 0..={MAX_PATH_LEN}"
            )));
        }

        let path = self.reader.read_tag(path_len as usize)?.to_vec();
        let start = self.reader.read_integer_tag(INT_TAG_WIDTH, self.policy)?;
        let size = self.reader.read_integer_tag(INT_TAG_WIDTH, self.policy)?;
        if start < 0 || size < 0 {
            return Err(ParseError::InvalidFormat(format!(
                "negative extent {start}+{size} for {:?}",
                String::from_utf8_lossy(&path)
            )));
        }

        self.entry_index += 1;
        Ok(DirEntry {
            path,
            start: start as u64,
            size: size as u64,
        })
    }

    /// Drain the parser, collecting every entry decoded before the stream
    /// ends or a parse error stops it.
    pub fn parse_all(self) -> (Vec<DirEntry>, Option<ParseError>) {
        let mut entries = Vec::new();
        let mut error = None;
        for item in self {
            match item {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    error = Some(err);
                    break;
                }
            }
        }
        (entries, error)
    }
}

impl Iterator for DirectoryParser<'_> {
    type Item = Result<DirEntry, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_empty() {
            return None;
        }

        let entry_start = self.reader.position();
        let entry_index = self.entry_index;
        match self.decode_entry() {
            Ok(entry) => Some(Ok(entry)),
            Err(ParseError::UnexpectedEndOfInput { .. }) => {
                // Bytes were present at the entry boundary but ran out
                // mid-entry, which is truncation rather than a clean end.
                self.failed = true;
                Some(Err(ParseError::TruncatedEntry {
                    entry_index,
                    offset: entry_start,
                }))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_all(entries: &[DirEntry]) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in entries {
            entry.encode(&mut out).unwrap();
        }
        out
    }

    #[test]
    fn integer_tag_decodes_plain_digits() {
        let mut reader = TagReader::new(b"1234");
        assert_eq!(
            reader
                .read_integer_tag(4, IntegerPolicy::Permissive)
                .unwrap(),
            1234
        );
        assert!(reader.is_empty());
    }

    #[test]
    fn integer_tag_stops_at_first_non_digit() {
        let mut reader = TagReader::new(b"00ab12cd");
        assert_eq!(
            reader
                .read_integer_tag(4, IntegerPolicy::Permissive)
                .unwrap(),
            0
        );
        assert_eq!(
            reader
                .read_integer_tag(4, IntegerPolicy::Permissive)
                .unwrap(),
            12
        );
    }

    #[test]
    fn integer_tag_skips_leading_whitespace() {
        let mut reader = TagReader::new(b"   5");
        assert_eq!(
            reader
                .read_integer_tag(4, IntegerPolicy::Permissive)
                .unwrap(),
            5
        );
    }

    #[test]
    fn integer_tag_handles_signs_and_empty_windows() {
        assert_eq!(
            decode_ascii_int(b"  -7", IntegerPolicy::Permissive).unwrap(),
            -7
        );
        assert_eq!(
            decode_ascii_int(b"+012", IntegerPolicy::Permissive).unwrap(),
            12
        );
        assert_eq!(
            decode_ascii_int(b"abcd", IntegerPolicy::Permissive).unwrap(),
            0
        );
    }

    #[test]
    fn strict_policy_rejects_what_permissive_tolerates() {
        assert_eq!(decode_ascii_int(b"0012", IntegerPolicy::Strict).unwrap(), 12);
        assert_eq!(decode_ascii_int(b"  34", IntegerPolicy::Strict).unwrap(), 34);
        assert!(matches!(
            decode_ascii_int(b"12ab", IntegerPolicy::Strict),
            Err(ParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            decode_ascii_int(b"    ", IntegerPolicy::Strict),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn read_tag_reports_how_much_was_missing() {
        let mut reader = TagReader::new(b"ab");
        assert_eq!(
            reader.read_tag(4),
            Err(ParseError::UnexpectedEndOfInput {
                needed: 4,
                available: 2
            })
        );
    }

    #[test]
    fn decode_entry_assembles_all_four_fields() {
        let mut parser = DirectoryParser::new(b"0003abc00100005");
        let entry = parser.decode_entry().unwrap();
        assert_eq!(entry.path, b"abc");
        assert_eq!(entry.start, 10);
        assert_eq!(entry.size, 5);
    }

    #[test]
    fn decode_entry_rejects_oversized_length_before_reading_the_path() {
        let mut parser = DirectoryParser::new(b"9999whatever follows is never touched");
        assert!(matches!(
            parser.decode_entry(),
            Err(ParseError::InvalidFormat(_))
        ));
        // Only the length tag was consumed.
        assert_eq!(parser.reader.position(), INT_TAG_WIDTH);
    }

    #[test]
    fn decode_entry_rejects_negative_length() {
        let mut parser = DirectoryParser::new(b"-001abc");
        assert!(matches!(
            parser.decode_entry(),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn empty_source_is_a_clean_end() {
        let (entries, error) = DirectoryParser::new(b"").parse_all();
        assert!(entries.is_empty());
        assert!(error.is_none());
    }

    #[test]
    fn well_formed_streams_round_trip_in_order() {
        let expected = vec![
            DirEntry {
                path: b"data\\types.ini".to_vec(),
                start: 0,
                size: 512,
            },
            DirEntry {
                path: b"data\\track01.trn".to_vec(),
                start: 512,
                size: 2048,
            },
            DirEntry {
                path: b"".to_vec(),
                start: 2560,
                size: 0,
            },
        ];
        let stream = encode_all(&expected);

        let (entries, error) = DirectoryParser::new(&stream).parse_all();
        assert!(error.is_none());
        assert_eq!(entries, expected);
    }

    #[test]
    fn short_first_length_tag_is_truncation_with_no_entries() {
        let (entries, error) = DirectoryParser::new(b"00").parse_all();
        assert!(entries.is_empty());
        assert_eq!(
            error,
            Some(ParseError::TruncatedEntry {
                entry_index: 0,
                offset: 0
            })
        );
    }

    #[test]
    fn truncation_mid_stream_keeps_the_decoded_prefix() {
        let mut stream = encode_all(&[DirEntry {
            path: b"intact".to_vec(),
            start: 0,
            size: 64,
        }]);
        // Second entry: length tag promises 8 path bytes, only 3 arrive.
        stream.extend_from_slice(b"0008abc");

        let (entries, error) = DirectoryParser::new(&stream).parse_all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, b"intact");
        assert_eq!(
            error,
            Some(ParseError::TruncatedEntry {
                entry_index: 1,
                offset: 18
            })
        );
    }

    #[test]
    fn parser_fuses_after_an_error() {
        let mut parser = DirectoryParser::new(b"00");
        assert!(matches!(
            parser.next(),
            Some(Err(ParseError::TruncatedEntry { .. }))
        ));
        assert!(parser.next().is_none());
    }
}
