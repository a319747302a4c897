//! Command implementations for tsv-sieve.

pub mod filter;
pub mod tally;

pub use filter::{FilterCommand, FilterStats};
pub use tally::{TallyCommand, TallyStats};

use crate::config::{FilterConfig, MissingFieldPolicy};
use crate::tsv::{Line, Result};
use tracing::warn;

/// Extract the selected field of a data line, honoring the missing-field
/// policy.
///
/// Returns `Ok(None)` when the line is short and the policy is `Skip`.
pub(crate) fn select_field<'a>(
    line: &Line<'a>,
    field_index: usize,
    config: &FilterConfig,
) -> Result<Option<&'a [u8]>> {
    match line.field(config.delimiter, field_index) {
        Some(field) => Ok(Some(field)),
        None => match config.missing_field {
            MissingFieldPolicy::Abort => line.require_field(config.delimiter, field_index).map(Some),
            MissingFieldPolicy::Skip => {
                warn!(
                    "Skipping line {}: no field at index {}",
                    line.number, field_index
                );
                Ok(None)
            }
        },
    }
}
