//! Pass configuration.
//!
//! Every tally or filter pass is driven by a [`FilterConfig`]. Nothing is
//! global: two passes with different delimiters can run in one process.

use crate::streaming::buffers::BufferSizes;
use crate::tsv::{Result, TsvError};

/// Default field delimiter.
pub const DEFAULT_DELIMITER: u8 = b'\t';

/// How a filter pass treats an existing destination file.
///
/// Has no default. Appending to the output of an earlier run duplicates
/// its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Keep existing content and add to the end.
    Append,
    /// Empty the destination before writing.
    Truncate,
}

/// What to do with a record that has too few fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingFieldPolicy {
    /// Abort the pass with `TsvError::MissingField`.
    #[default]
    Abort,
    /// Skip the record and log a warning.
    Skip,
}

/// Settings shared by tally and filter passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    pub delimiter: u8,
    pub missing_field: MissingFieldPolicy,
    pub buffers: BufferSizes,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterConfig {
    pub fn new() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            missing_field: MissingFieldPolicy::Abort,
            buffers: BufferSizes::default(),
        }
    }

    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the policy for records with too few fields.
    pub fn with_missing_field(mut self, policy: MissingFieldPolicy) -> Self {
        self.missing_field = policy;
        self
    }

    /// Use smaller I/O buffers.
    pub fn with_low_memory(mut self, low_memory: bool) -> Self {
        self.buffers = BufferSizes::new(low_memory);
        self
    }
}

/// Parse a delimiter given on the command line.
///
/// Accepts a single ASCII character, `\t`, or `tab`. `\n` is rejected
/// since it would collide with the record terminator.
pub fn parse_delimiter(s: &str) -> Result<u8> {
    let byte = match s {
        "\\t" | "tab" => b'\t',
        _ if s.len() == 1 && s.is_ascii() => s.as_bytes()[0],
        _ => {
            return Err(TsvError::InvalidArgument(format!(
                "delimiter must be a single ASCII character, got '{}'",
                s
            )))
        }
    };
    if byte == b'\n' || byte == b'\r' {
        return Err(TsvError::InvalidArgument(
            "delimiter cannot be a line terminator".to_string(),
        ));
    }
    Ok(byte)
}
