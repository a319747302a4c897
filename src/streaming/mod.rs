//! Centralized streaming utilities.
//!
//! This module provides the shared pieces every pass is built from:
//! - Zero-allocation field extraction
//! - Byte-exact buffered output
//! - Buffer sizing
//!
//! Filtering keeps one line in flight; tallying holds one entry per
//! distinct value.

pub mod buffers;
pub mod output;
pub mod parsing;

pub use output::{ensure_distinct, ensure_stdin_distinct, open_destination, RecordWriter};
pub use parsing::{count_fields, nth_field, strip_terminator};
