//! Streaming field tally with O(distinct values) memory.
//!
//! Counts how often each value of one positional field occurs across all
//! data records of a TSV file.
//!
//! # Algorithm
//!
//! 1. Read and discard the header line
//! 2. For every following line, extract the field at `field_index`
//! 3. Normalize the value (identity unless configured otherwise)
//! 4. Increment its count
//!
//! # Memory Complexity
//!
//! O(d) where d = number of distinct normalized values. The file itself
//! is never held in memory.

use crate::commands::select_field;
use crate::config::FilterConfig;
use crate::tally::{FieldTally, Normalizer};
use crate::tsv::{Result, TsvReader};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, info};

/// Streaming tally command configuration.
#[derive(Debug, Default)]
pub struct TallyCommand {
    /// Zero-based index of the field to count
    pub field_index: usize,
    /// Mapping applied to each value before counting
    pub normalizer: Normalizer,
    pub config: FilterConfig,
}

impl TallyCommand {
    pub fn new(field_index: usize) -> Self {
        Self {
            field_index,
            normalizer: Normalizer::Identity,
            config: FilterConfig::default(),
        }
    }

    /// Set the value normalizer.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Set delimiter, missing-field policy and buffer sizes.
    pub fn with_config(mut self, config: FilterConfig) -> Self {
        self.config = config;
        self
    }

    /// Tally a TSV file.
    pub fn run<P: AsRef<Path>>(&self, input_path: P) -> Result<(FieldTally, TallyStats)> {
        let path = input_path.as_ref();
        info!("Tallying field {} of {}", self.field_index, path.display());
        let file = File::open(path)?;
        let reader = TsvReader::with_capacity(file, self.config.buffers.input);
        self.run_streaming(reader)
    }

    /// Tally from stdin.
    pub fn run_stdin(&self) -> Result<(FieldTally, TallyStats)> {
        info!("Tallying field {} of stdin", self.field_index);
        let stdin = io::stdin();
        let reader = TsvReader::with_capacity(stdin.lock(), self.config.buffers.input);
        self.run_streaming(reader)
    }

    /// Core tally loop.
    ///
    /// Values are decoded as lossy UTF-8 before counting, so distinct
    /// invalid byte sequences that decode to the same replacement text
    /// share one key. The total is unaffected.
    pub fn run_streaming<R: Read>(
        &self,
        mut reader: TsvReader<R>,
    ) -> Result<(FieldTally, TallyStats)> {
        let mut tally = FieldTally::new();
        let mut stats = TallyStats::default();

        // Header is never counted
        if reader.read_line()?.is_none() {
            debug!("Source is empty, no header found");
            return Ok((tally, stats));
        }

        while let Some(line) = reader.read_line()? {
            stats.records_read += 1;

            let Some(field) = select_field(&line, self.field_index, &self.config)? else {
                stats.records_skipped += 1;
                continue;
            };

            let value = String::from_utf8_lossy(field);
            tally.add(&self.normalizer.apply(&value));
        }

        stats.distinct_values = tally.len();
        debug!("Tally finished after {} lines: {}", reader.line_number(), stats);
        Ok((tally, stats))
    }
}

/// Statistics from a tally pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TallyStats {
    /// Data records read (header excluded)
    pub records_read: usize,
    /// Records skipped for missing the field
    pub records_skipped: usize,
    /// Distinct values after normalization
    pub distinct_values: usize,
}

impl TallyStats {
    /// Records that contributed to the tally.
    pub fn records_counted(&self) -> usize {
        self.records_read - self.records_skipped
    }
}

impl std::fmt::Display for TallyStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Read: {}, Skipped: {}, Distinct: {}",
            self.records_read, self.records_skipped, self.distinct_values
        )
    }
}
