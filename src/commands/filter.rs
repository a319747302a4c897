//! Streaming record filter with O(1) memory complexity.
//!
//! Copies the header and every record whose selected field satisfies a
//! predicate from a TSV source to a destination, without loading the
//! source into memory.
//!
//! # Algorithm
//!
//! 1. Copy the header line unconditionally
//! 2. For every data line, extract the field at `field_index`
//! 3. If the predicate holds, write the original line byte-for-byte,
//!    terminator included
//!
//! # Guarantees
//!
//! - Output records keep source order
//! - Each matching record is written exactly once per pass
//! - Field values and formatting are never rewritten

use crate::commands::select_field;
use crate::config::{FilterConfig, WriteMode};
use crate::predicate::Predicate;
use crate::streaming::{ensure_distinct, open_destination, RecordWriter};
use crate::tsv::{Result, TsvReader};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Streaming filter command configuration.
#[derive(Debug)]
pub struct FilterCommand {
    /// Zero-based index of the field the predicate sees
    pub field_index: usize,
    pub predicate: Predicate,
    /// Append to or truncate an existing destination
    pub write_mode: WriteMode,
    pub config: FilterConfig,
}

impl FilterCommand {
    pub fn new(field_index: usize, predicate: Predicate, write_mode: WriteMode) -> Self {
        Self {
            field_index,
            predicate,
            write_mode,
            config: FilterConfig::default(),
        }
    }

    /// Set delimiter, missing-field policy and buffer sizes.
    pub fn with_config(mut self, config: FilterConfig) -> Self {
        self.config = config;
        self
    }

    /// Filter `source` into the file at `destination`.
    ///
    /// The source is opened first, so an unreadable source never truncates
    /// an existing destination. A destination that is the source itself is
    /// rejected before it is opened.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        destination: Q,
    ) -> Result<FilterStats> {
        let source = source.as_ref();
        let destination = destination.as_ref();
        info!(
            "Filtering {} -> {} (field {} {}, {:?})",
            source.display(),
            destination.display(),
            self.field_index,
            self.predicate,
            self.write_mode
        );

        let input = File::open(source)?;
        let reader = TsvReader::with_capacity(input, self.config.buffers.input);
        ensure_distinct(source, destination)?;
        let output = open_destination(destination, self.write_mode)?;
        self.run_streaming(reader, output)
    }

    /// Filter `source` into an arbitrary writer. The write mode is not
    /// consulted.
    pub fn run_to_writer<P: AsRef<Path>, W: Write>(
        &self,
        source: P,
        output: W,
    ) -> Result<FilterStats> {
        let input = File::open(source.as_ref())?;
        let reader = TsvReader::with_capacity(input, self.config.buffers.input);
        self.run_streaming(reader, output)
    }

    /// Filter stdin into an arbitrary writer.
    pub fn run_stdin<W: Write>(&self, output: W) -> Result<FilterStats> {
        let stdin = io::stdin();
        let reader = TsvReader::with_capacity(stdin.lock(), self.config.buffers.input);
        self.run_streaming(reader, output)
    }

    /// Core filter loop.
    ///
    /// The writer is flushed on success and dropped on error; a failed pass
    /// leaves the destination in an unspecified state.
    pub fn run_streaming<R: Read, W: Write>(
        &self,
        mut reader: TsvReader<R>,
        output: W,
    ) -> Result<FilterStats> {
        let mut stats = FilterStats::default();
        let mut writer = RecordWriter::with_capacity(self.config.buffers.output, output);

        // Header passes through without evaluating the predicate
        match reader.read_line()? {
            Some(header) => writer.write_raw(header.raw())?,
            None => {
                debug!("Source is empty, nothing written");
                return Ok(stats);
            }
        }

        while let Some(line) = reader.read_line()? {
            stats.records_read += 1;

            let Some(field) = select_field(&line, self.field_index, &self.config)? else {
                stats.records_skipped += 1;
                continue;
            };

            if self.predicate.matches(field) {
                writer.write_raw(line.raw())?;
                stats.records_written += 1;
            }
        }

        writer.finish()?;
        debug!("Filter finished after {} lines: {}", reader.line_number(), stats);
        Ok(stats)
    }
}

/// Statistics from a filter pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Data records read (header excluded)
    pub records_read: usize,
    /// Data records written (header excluded)
    pub records_written: usize,
    /// Records skipped for missing the field
    pub records_skipped: usize,
}

impl FilterStats {
    /// Fraction of data records kept.
    pub fn retention(&self) -> f64 {
        if self.records_read == 0 {
            0.0
        } else {
            self.records_written as f64 / self.records_read as f64
        }
    }
}

impl std::fmt::Display for FilterStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Read: {}, Written: {}, Skipped: {}, Retention: {:.2}%",
            self.records_read,
            self.records_written,
            self.records_skipped,
            self.retention() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MissingFieldPolicy;
    use crate::tsv::TsvError;
    use std::fs;

    const TITLES: &str = "id\ttype\n1\tmovie\n2\tshort\n3\tmovie\n";

    fn filter_str(cmd: &FilterCommand, content: &str) -> (String, Result<FilterStats>) {
        let mut output = Vec::new();
        let result = cmd.run_streaming(TsvReader::new(content.as_bytes()), &mut output);
        (String::from_utf8(output).unwrap(), result)
    }

    fn movie_filter() -> FilterCommand {
        FilterCommand::new(1, Predicate::equals("movie"), WriteMode::Truncate)
    }

    #[test]
    fn test_filter_movies() {
        let (output, result) = filter_str(&movie_filter(), TITLES);
        let stats = result.unwrap();

        assert_eq!(output, "id\ttype\n1\tmovie\n3\tmovie\n");
        assert_eq!(stats.records_written, 2);
        assert_eq!(stats.records_read, 3);
    }

    #[test]
    fn test_header_copied_even_if_no_match() {
        let cmd = FilterCommand::new(1, Predicate::equals("videoGame"), WriteMode::Truncate);
        let (output, result) = filter_str(&cmd, TITLES);

        assert_eq!(output, "id\ttype\n");
        assert_eq!(result.unwrap().records_written, 0);
    }

    #[test]
    fn test_header_not_evaluated() {
        // Header would fail the predicate and has too few fields
        let content = "id\n1\tmovie\n";
        let (output, result) = filter_str(&movie_filter(), content);
        assert_eq!(output, content);
        assert_eq!(result.unwrap().records_written, 1);
    }

    #[test]
    fn test_header_only() {
        let (output, result) = filter_str(&movie_filter(), "id\ttype\n");
        assert_eq!(output, "id\ttype\n");
        assert_eq!(result.unwrap(), FilterStats::default());
    }

    #[test]
    fn test_empty_source() {
        let (output, result) = filter_str(&movie_filter(), "");
        assert!(output.is_empty());
        assert_eq!(result.unwrap().records_written, 0);
    }

    #[test]
    fn test_lines_are_byte_identical() {
        let content = "id\ttype\r\n1\tmovie\r\n2\tshort\r\n3\tmovie";
        let (output, result) = filter_str(&movie_filter(), content);

        assert_eq!(output, "id\ttype\r\n1\tmovie\r\n3\tmovie");
        assert_eq!(result.unwrap().records_written, 2);
    }

    #[test]
    fn test_order_preserved() {
        let content = "id\tregion\n5\tUS\n1\tGB\n9\tUS\n2\tUS\n7\tFR\n";
        let cmd = FilterCommand::new(1, Predicate::equals("US"), WriteMode::Truncate);
        let (output, _) = filter_str(&cmd, content);

        let ids: Vec<_> = output
            .lines()
            .skip(1)
            .map(|l| l.split('\t').next().unwrap())
            .collect();
        assert_eq!(ids, vec!["5", "9", "2"]);
    }

    #[test]
    fn test_missing_field_aborts() {
        let content = "id\ttype\n1\tmovie\n2\n";
        let (_, result) = filter_str(&movie_filter(), content);
        assert!(matches!(
            result,
            Err(TsvError::MissingField { line: 3, index: 1, found: 1 })
        ));
    }

    #[test]
    fn test_missing_field_skipped() {
        let content = "id\ttype\n1\tmovie\n2\n3\tmovie\n";
        let cmd = movie_filter()
            .with_config(FilterConfig::new().with_missing_field(MissingFieldPolicy::Skip));
        let (output, result) = filter_str(&cmd, content);
        let stats = result.unwrap();

        assert_eq!(output, "id\ttype\n1\tmovie\n3\tmovie\n");
        assert_eq!(stats.records_read, 3);
        assert_eq!(stats.records_written, 2);
        assert_eq!(stats.records_skipped, 1);
    }

    #[test]
    fn test_one_of_predicate() {
        let content = "id\ttype\n1\tmovie\n2\tshort\n3\ttvMovie\n";
        let cmd = FilterCommand::new(
            1,
            Predicate::one_of(["movie", "tvMovie"]),
            WriteMode::Truncate,
        );
        let (output, _) = filter_str(&cmd, content);
        assert_eq!(output, "id\ttype\n1\tmovie\n3\ttvMovie\n");
    }

    #[test]
    fn test_count_matches_predicate_holds() {
        let content = "id\tyear\n1\t1985\n2\t1990\n3\t\\N\n4\t2004\n5\t1999\n";
        let cmd = FilterCommand::new(
            1,
            Predicate::custom(|v| v.parse::<u32>().map(|y| y >= 1990).unwrap_or(false)),
            WriteMode::Truncate,
        );
        let (output, result) = filter_str(&cmd, content);

        assert_eq!(result.unwrap().records_written, 3);
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn test_run_truncate_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("title.basics.tsv");
        let dest = dir.path().join("filtered.tsv");
        fs::write(&source, TITLES).unwrap();

        let cmd = movie_filter();
        cmd.run(&source, &dest).unwrap();
        let first = fs::read(&dest).unwrap();
        cmd.run(&source, &dest).unwrap();
        let second = fs::read(&dest).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, b"id\ttype\n1\tmovie\n3\tmovie\n");
    }

    #[test]
    fn test_run_append_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("title.basics.tsv");
        let dest = dir.path().join("filtered.tsv");
        fs::write(&source, TITLES).unwrap();

        let cmd = FilterCommand::new(1, Predicate::equals("short"), WriteMode::Append);
        cmd.run(&source, &dest).unwrap();
        cmd.run(&source, &dest).unwrap();

        assert_eq!(
            fs::read_to_string(&dest).unwrap(),
            "id\ttype\n2\tshort\nid\ttype\n2\tshort\n"
        );
    }

    #[test]
    fn test_unreadable_source_leaves_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("filtered.tsv");
        fs::write(&dest, "keep me\n").unwrap();

        let result = movie_filter().run(dir.path().join("missing.tsv"), &dest);
        assert!(matches!(result, Err(TsvError::Io(_))));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "keep me\n");
    }

    #[test]
    fn test_destination_is_source_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("title.basics.tsv");
        let aliased = dir.path().join(".").join("title.basics.tsv");
        let content = "id\ttype\n1\tmovie\n2\tshort\n";
        fs::write(&source, content).unwrap();

        for mode in [WriteMode::Truncate, WriteMode::Append] {
            for dest in [&source, &aliased] {
                let cmd = FilterCommand::new(1, Predicate::equals("movie"), mode);
                let result = cmd.run(&source, dest);
                assert!(matches!(result, Err(TsvError::InvalidArgument(_))));
                assert_eq!(fs::read_to_string(&source).unwrap(), content);
            }
        }
    }

    #[test]
    fn test_source_not_modified() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("title.basics.tsv");
        fs::write(&source, TITLES).unwrap();

        movie_filter()
            .run(&source, dir.path().join("out.tsv"))
            .unwrap();
        assert_eq!(fs::read_to_string(&source).unwrap(), TITLES);
    }

    #[test]
    fn test_stats_display() {
        let stats = FilterStats {
            records_read: 4,
            records_written: 1,
            records_skipped: 0,
        };
        assert_eq!(
            stats.to_string(),
            "Read: 4, Written: 1, Skipped: 0, Retention: 25.00%"
        );
    }
}
