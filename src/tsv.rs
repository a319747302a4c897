//! Streaming TSV line reader.
//!
//! Lines are handed out as raw bytes, terminator included, so that a
//! matching record can be written back byte-for-byte.

use crate::streaming::buffers::{DEFAULT_INPUT_BUFFER, DEFAULT_LINE_BUFFER};
use crate::streaming::parsing::{count_fields, nth_field, strip_terminator};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while tallying or filtering a TSV file.
#[derive(Error, Debug)]
pub enum TsvError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Missing field at line {line}: requested index {index}, but line has {found} field(s)")]
    MissingField {
        line: usize,
        index: usize,
        found: usize,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, TsvError>;

/// One line of the source file.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    /// 1-based line number; the header is line 1.
    pub number: usize,
    raw: &'a [u8],
}

impl<'a> Line<'a> {
    pub fn new(number: usize, raw: &'a [u8]) -> Self {
        Self { number, raw }
    }

    /// The line exactly as read, including its terminator if it had one.
    #[inline]
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// The line without its `\n` / `\r\n` terminator.
    #[inline]
    pub fn content(&self) -> &'a [u8] {
        strip_terminator(self.raw)
    }

    /// Field at `index`, or `None` if the line is too short.
    #[inline]
    pub fn field(&self, delimiter: u8, index: usize) -> Option<&'a [u8]> {
        nth_field(self.content(), delimiter, index)
    }

    /// Field at `index`, or a `MissingField` error naming this line.
    pub fn require_field(&self, delimiter: u8, index: usize) -> Result<&'a [u8]> {
        self.field(delimiter, index)
            .ok_or_else(|| TsvError::MissingField {
                line: self.number,
                index,
                found: count_fields(self.content(), delimiter),
            })
    }
}

/// A streaming TSV reader that yields one line at a time.
pub struct TsvReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: Vec<u8>,
}

impl TsvReader<File> {
    /// Open a TSV file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> TsvReader<R> {
    /// Create a new reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_INPUT_BUFFER)
    }

    /// Create a reader with custom buffer capacity.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            buffer: Vec::with_capacity(DEFAULT_LINE_BUFFER),
        }
    }

    /// Read the next line, or `None` at end of input.
    ///
    /// Empty lines are returned like any other line; the caller decides
    /// what a record with a single empty field means.
    pub fn read_line(&mut self) -> Result<Option<Line<'_>>> {
        self.buffer.clear();
        let bytes_read = self.reader.read_until(b'\n', &mut self.buffer)?;
        if bytes_read == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        Ok(Some(Line::new(self.line_number, &self.buffer)))
    }

    /// Number of lines read so far, header included.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_lines_keep_terminator() {
        let content = "id\ttype\n1\tmovie\n2\tshort";
        let mut reader = TsvReader::new(content.as_bytes());

        let header = reader.read_line().unwrap().unwrap();
        assert_eq!(header.number, 1);
        assert_eq!(header.raw(), b"id\ttype\n");
        assert_eq!(header.content(), b"id\ttype");

        let first = reader.read_line().unwrap().unwrap();
        assert_eq!(first.raw(), b"1\tmovie\n");

        let last = reader.read_line().unwrap().unwrap();
        assert_eq!(last.number, 3);
        assert_eq!(last.raw(), b"2\tshort");

        assert!(reader.read_line().unwrap().is_none());
        assert_eq!(reader.line_number(), 3);
    }

    #[test]
    fn test_field_access() {
        let line = Line::new(2, b"tt001\t1\tTitle\tUS\r\n");
        assert_eq!(line.field(b'\t', 0), Some(&b"tt001"[..]));
        assert_eq!(line.field(b'\t', 3), Some(&b"US"[..]));
        assert_eq!(line.field(b'\t', 4), None);
    }

    #[test]
    fn test_require_field_reports_line() {
        let line = Line::new(7, b"a\tb\n");
        match line.require_field(b'\t', 2) {
            Err(TsvError::MissingField { line, index, found }) => {
                assert_eq!(line, 7);
                assert_eq!(index, 2);
                assert_eq!(found, 2);
            }
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_line_is_one_empty_field() {
        let mut reader = TsvReader::new(&b"\n"[..]);
        let line = reader.read_line().unwrap().unwrap();
        assert_eq!(line.field(b'\t', 0), Some(&b""[..]));
        assert!(line.field(b'\t', 1).is_none());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = TsvReader::from_path("/nonexistent/title.basics.tsv");
        assert!(matches!(result, Err(TsvError::Io(_))));
    }
}
