//! Zero-allocation field extraction.
//!
//! Fields are located with memchr and returned as byte slices into the
//! original line; nothing is split into a Vec.

use memchr::{memchr, memchr_iter};

/// Strip a trailing `\n` or `\r\n` from a line.
#[inline(always)]
pub fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Return the zero-based `index`-th field of an unterminated line.
///
/// Returns None if the line has fewer than `index + 1` fields. An empty
/// line has exactly one (empty) field.
#[inline(always)]
pub fn nth_field(line: &[u8], delimiter: u8, index: usize) -> Option<&[u8]> {
    let mut rest = line;
    for _ in 0..index {
        let pos = memchr(delimiter, rest)?;
        rest = &rest[pos + 1..];
    }
    let end = memchr(delimiter, rest).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Number of fields in an unterminated line.
#[inline]
pub fn count_fields(line: &[u8], delimiter: u8) -> usize {
    memchr_iter(delimiter, line).count() + 1
}
