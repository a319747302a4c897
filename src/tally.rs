//! Field value frequency counts.

use crate::streaming::RecordWriter;
use crate::tsv::TsvError;
use rustc_hash::{FxHashMap, FxHashSet};
use std::borrow::Cow;
use std::io::Write;

/// Bucket name used by [`Normalizer::keep_or_other`] when none is given.
pub const DEFAULT_OTHER_BUCKET: &str = "Other";

/// Mapping applied to each field value before it is counted.
#[derive(Default)]
pub enum Normalizer {
    /// Count values as they appear.
    #[default]
    Identity,
    /// Count listed values as themselves and everything else as `other`.
    KeepOrOther {
        keep: FxHashSet<String>,
        other: String,
    },
    /// Arbitrary mapping.
    Custom(Box<dyn Fn(&str) -> String>),
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Normalizer::Identity => write!(f, "Identity"),
            Normalizer::KeepOrOther { keep, other } => f
                .debug_struct("KeepOrOther")
                .field("keep", keep)
                .field("other", other)
                .finish(),
            Normalizer::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl Normalizer {
    /// Collapse every value not in `keep` into the `Other` bucket.
    pub fn keep_or_other<I, S>(keep: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::keep_or_bucket(keep, DEFAULT_OTHER_BUCKET)
    }

    /// Collapse every value not in `keep` into a named bucket.
    pub fn keep_or_bucket<I, S>(keep: I, other: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Normalizer::KeepOrOther {
            keep: keep.into_iter().map(Into::into).collect(),
            other: other.into(),
        }
    }

    /// Wrap a closure.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + 'static,
    {
        Normalizer::Custom(Box::new(f))
    }

    /// Apply the mapping to one value.
    pub fn apply<'a>(&'a self, value: &'a str) -> Cow<'a, str> {
        match self {
            Normalizer::Identity => Cow::Borrowed(value),
            Normalizer::KeepOrOther { keep, other } => {
                if keep.contains(value) {
                    Cow::Borrowed(value)
                } else {
                    Cow::Borrowed(other.as_str())
                }
            }
            Normalizer::Custom(f) => Cow::Owned(f(value)),
        }
    }
}

/// Frequency count of distinct field values over one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTally {
    counts: FxHashMap<String, u64>,
    total: u64,
}

impl FieldTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `value`.
    pub fn add(&mut self, value: &str) {
        self.add_n(value, 1);
    }

    /// Count `n` occurrences of `value`. Adding zero is a no-op.
    pub fn add_n(&mut self, value: &str, n: u64) {
        if n == 0 {
            return;
        }
        if let Some(count) = self.counts.get_mut(value) {
            *count += n;
        } else {
            self.counts.insert(value.to_string(), n);
        }
        self.total += n;
    }

    /// Occurrences of `value` (0 if never seen).
    pub fn get(&self, value: &str) -> u64 {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// Sum of all counts; equals the number of records tallied.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Fraction of all records carrying `value`, in `[0, 1]`.
    ///
    /// Returns 0.0 for an empty tally.
    pub fn share(&self, value: &str) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.get(value) as f64 / self.total as f64
        }
    }

    /// Iterate over `(value, count)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Entries by descending count; ties broken by value.
    pub fn sorted_by_count(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Entries by ascending value.
    pub fn sorted_by_value(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Consume the tally and return the plain mapping.
    pub fn into_map(self) -> FxHashMap<String, u64> {
        self.counts
    }

    /// Write a `value\tcount\tfraction` report, header first.
    pub fn write_report<W: Write>(
        &self,
        output: W,
        order: ReportOrder,
    ) -> Result<(), TsvError> {
        let entries = match order {
            ReportOrder::Count => self.sorted_by_count(),
            ReportOrder::Value => self.sorted_by_value(),
        };

        let mut writer = RecordWriter::new(output);
        writer.write_raw(b"value\tcount\tfraction\n")?;
        for (value, count) in entries {
            writer.write_raw(value.as_bytes())?;
            writer.write_tab()?;
            writer.write_int(count)?;
            writer.write_tab()?;
            writer.write_float(self.share(value))?;
            writer.write_newline()?;
        }
        writer.finish()
    }
}

/// Row order of a tally report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportOrder {
    /// Most frequent first.
    #[default]
    Count,
    /// Alphabetical.
    Value,
}
