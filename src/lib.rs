//! tsv-sieve: streaming tally and filter for large TSV dumps
//!
//! This library reads tab-separated files one line at a time, so that
//! multi-gigabyte dumps (such as the IMDb title files) can be profiled and
//! cut down without ever being loaded whole.
//!
//! # Features
//!
//! - **Tally**: exact frequency counts of one positional field, with an
//!   optional normalizer (e.g. collapse every region except `US` into `Other`)
//! - **Filter**: copy the header plus every record whose field satisfies a
//!   predicate, byte-for-byte and in source order
//! - **Constant memory**: one line in flight while filtering, one entry per
//!   distinct value while tallying
//!
//! # Example
//!
//! ```rust,no_run
//! use tsv_sieve::prelude::*;
//!
//! // How are title types distributed?
//! let (types, _) = TallyCommand::new(1).run("rawdata/title.basics.tsv").unwrap();
//! println!("movies: {}", types.get("movie"));
//!
//! // Keep only the movies.
//! let cmd = FilterCommand::new(1, Predicate::equals("movie"), WriteMode::Truncate);
//! let stats = cmd
//!     .run("rawdata/title.basics.tsv", "filterdata/title.basics.tsv")
//!     .unwrap();
//! println!("kept {} records", stats.records_written);
//! ```

pub mod commands;
pub mod config;
pub mod predicate;
pub mod streaming;
pub mod tally;
pub mod tsv;

// Re-export commonly used types
pub use config::{FilterConfig, MissingFieldPolicy, WriteMode};
pub use predicate::Predicate;
pub use tally::{FieldTally, Normalizer};
pub use tsv::{Result, TsvError, TsvReader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::commands::{FilterCommand, FilterStats, TallyCommand, TallyStats};
    pub use crate::config::{FilterConfig, MissingFieldPolicy, WriteMode};
    pub use crate::predicate::Predicate;
    pub use crate::tally::{FieldTally, Normalizer, ReportOrder};
    pub use crate::tsv::{TsvError, TsvReader};
}
