//! Buffered output for streaming passes.
//!
//! Records are written back exactly as read. Counts and fractions in
//! reports use itoa and ryu to avoid allocation per row.

use crate::config::WriteMode;
use crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;
use crate::tsv::TsvError;
use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Open a destination file for a filter pass.
///
/// `Append` creates the file if missing and adds to the end; `Truncate`
/// creates or empties it first.
pub fn open_destination<P: AsRef<Path>>(path: P, mode: WriteMode) -> Result<File, TsvError> {
    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        WriteMode::Append => options.append(true),
        WriteMode::Truncate => options.write(true).truncate(true),
    };
    Ok(options.open(path)?)
}

/// Fail if `destination` already exists and is the same file as `source`.
///
/// Symlinks and `.`/`..` components are resolved, and on Unix hard links
/// are caught by comparing device and inode.
pub fn ensure_distinct<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
) -> Result<(), TsvError> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    // A destination that cannot be stat'ed is left for open_destination to report
    let Ok(dest_meta) = fs::metadata(destination) else {
        return Ok(());
    };
    let source_meta = fs::metadata(source)?;

    if same_inode(&source_meta, &dest_meta)
        || fs::canonicalize(source)? == fs::canonicalize(destination)?
    {
        return Err(TsvError::InvalidArgument(format!(
            "source and destination are the same file: {}",
            destination.display()
        )));
    }
    Ok(())
}

/// Fail if stdin is redirected from `destination`.
///
/// Only regular-file redirection can be detected; pipes and terminals
/// always pass.
#[cfg(unix)]
pub fn ensure_stdin_distinct<Q: AsRef<Path>>(destination: Q) -> Result<(), TsvError> {
    let destination = destination.as_ref();
    if let (Ok(stdin_meta), Ok(dest_meta)) =
        (fs::metadata("/dev/stdin"), fs::metadata(destination))
    {
        if same_inode(&stdin_meta, &dest_meta) {
            return Err(TsvError::InvalidArgument(format!(
                "stdin and destination are the same file: {}",
                destination.display()
            )));
        }
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn ensure_stdin_distinct<Q: AsRef<Path>>(_destination: Q) -> Result<(), TsvError> {
    Ok(())
}

#[cfg(unix)]
fn same_inode(a: &Metadata, b: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_inode(_a: &Metadata, _b: &Metadata) -> bool {
    false
}

/// Buffered, byte-exact record writer.
pub struct RecordWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl<W: Write> RecordWriter<W> {
    /// Create a new RecordWriter with the default 2MB buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    /// Create a new RecordWriter with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    /// Write a line as-is. The caller's terminator (or lack of one) is kept.
    #[inline]
    pub fn write_raw(&mut self, line: &[u8]) -> Result<(), TsvError> {
        self.writer.write_all(line)?;
        Ok(())
    }

    /// Write a tab character.
    #[inline]
    pub fn write_tab(&mut self) -> Result<(), TsvError> {
        self.writer.write_all(b"\t")?;
        Ok(())
    }

    /// Write a newline character.
    #[inline]
    pub fn write_newline(&mut self) -> Result<(), TsvError> {
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write an integer using itoa.
    #[inline]
    pub fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<(), TsvError> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        Ok(())
    }

    /// Write a float using ryu.
    #[inline]
    pub fn write_float(&mut self, f: f64) -> Result<(), TsvError> {
        self.writer.write_all(self.ryu_buf.format(f).as_bytes())?;
        Ok(())
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<(), TsvError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and release the writer.
    ///
    /// On error paths the writer is simply dropped, which releases the
    /// handle; only a successful pass needs the flush error surfaced.
    pub fn finish(mut self) -> Result<(), TsvError> {
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_write_raw_keeps_bytes() {
        let mut output = Vec::new();
        {
            let mut writer = RecordWriter::new(&mut output);
            writer.write_raw(b"1\tmovie\r\n").unwrap();
            writer.write_raw(b"2\tmovie").unwrap();
            writer.finish().unwrap();
        }
        assert_eq!(output, b"1\tmovie\r\n2\tmovie");
    }

    #[test]
    fn test_write_report_row() {
        let mut output = Vec::new();
        {
            let mut writer = RecordWriter::new(&mut output);
            writer.write_raw(b"US").unwrap();
            writer.write_tab().unwrap();
            writer.write_int(1164759u64).unwrap();
            writer.write_tab().unwrap();
            writer.write_float(0.5).unwrap();
            writer.write_newline().unwrap();
            writer.finish().unwrap();
        }
        assert_eq!(output, b"US\t1164759\t0.5\n");
    }

    #[test]
    fn test_open_destination_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");

        {
            let mut file = open_destination(&path, WriteMode::Append).unwrap();
            file.write_all(b"first\n").unwrap();
        }
        {
            let mut file = open_destination(&path, WriteMode::Append).unwrap();
            file.write_all(b"second\n").unwrap();
        }
        assert_eq!(fs::read(&path).unwrap(), b"first\nsecond\n");

        {
            let mut file = open_destination(&path, WriteMode::Truncate).unwrap();
            file.write_all(b"third\n").unwrap();
        }
        assert_eq!(fs::read(&path).unwrap(), b"third\n");
    }

    #[test]
    fn test_open_destination_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("out.tsv");
        let result = open_destination(&path, WriteMode::Truncate);
        assert!(matches!(result, Err(TsvError::Io(_))));
    }

    #[test]
    fn test_ensure_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("title.basics.tsv");
        let other = dir.path().join("out.tsv");
        fs::write(&source, "id\ttype\n").unwrap();

        assert!(ensure_distinct(&source, &other).is_ok());
        fs::write(&other, "").unwrap();
        assert!(ensure_distinct(&source, &other).is_ok());

        let aliased = dir.path().join(".").join("title.basics.tsv");
        for dest in [&source, &aliased] {
            let result = ensure_distinct(&source, dest);
            assert!(matches!(result, Err(TsvError::InvalidArgument(_))));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_distinct_hard_link() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("title.basics.tsv");
        let link = dir.path().join("link.tsv");
        fs::write(&source, "id\ttype\n").unwrap();
        fs::hard_link(&source, &link).unwrap();

        let result = ensure_distinct(&source, &link);
        assert!(matches!(result, Err(TsvError::InvalidArgument(_))));
    }
}
