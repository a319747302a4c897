//! Buffer sizing for streaming passes.
//!
//! Input buffers are sized for sequential reads of multi-gigabyte dumps;
//! output buffers batch the (usually much smaller) filtered subset.

/// Default output buffer size (2 MB).
pub const DEFAULT_OUTPUT_BUFFER: usize = 2 * 1024 * 1024;

/// Low-memory output buffer size (256 KB).
pub const LOW_MEMORY_OUTPUT_BUFFER: usize = 256 * 1024;

/// Default input buffer size (256 KB).
pub const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// Low-memory input buffer size (64 KB).
pub const LOW_MEMORY_INPUT_BUFFER: usize = 64 * 1024;

/// Initial line buffer capacity (1 KB).
/// Title dump lines are rarely longer than a few hundred bytes.
pub const DEFAULT_LINE_BUFFER: usize = 1024;

/// Input/output buffer capacities for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSizes {
    pub input: usize,
    pub output: usize,
}

impl BufferSizes {
    /// Pick sizes for normal or memory-constrained runs.
    pub const fn new(low_memory: bool) -> Self {
        if low_memory {
            Self {
                input: LOW_MEMORY_INPUT_BUFFER,
                output: LOW_MEMORY_OUTPUT_BUFFER,
            }
        } else {
            Self {
                input: DEFAULT_INPUT_BUFFER,
                output: DEFAULT_OUTPUT_BUFFER,
            }
        }
    }
}

impl Default for BufferSizes {
    fn default() -> Self {
        Self::new(false)
    }
}
