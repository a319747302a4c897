//! Record selection predicates.
//!
//! A predicate sees only the extracted field value and keeps no state
//! between records.

use rustc_hash::FxHashSet;
use std::fmt;

/// Boolean test on a single field value.
pub enum Predicate {
    /// Field equals the value exactly.
    Equals(String),
    /// Field differs from the value.
    NotEquals(String),
    /// Field is one of the listed values.
    OneOf(FxHashSet<String>),
    /// Arbitrary test. Non-UTF-8 bytes reach it as U+FFFD.
    Custom(Box<dyn Fn(&str) -> bool>),
}

impl Predicate {
    pub fn equals(value: impl Into<String>) -> Self {
        Predicate::Equals(value.into())
    }

    pub fn not_equals(value: impl Into<String>) -> Self {
        Predicate::NotEquals(value.into())
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        Predicate::Custom(Box::new(f))
    }

    /// Evaluate against raw field bytes.
    ///
    /// The exact-match variants compare bytes and never allocate.
    #[inline]
    pub fn matches(&self, field: &[u8]) -> bool {
        match self {
            Predicate::Equals(v) => field == v.as_bytes(),
            Predicate::NotEquals(v) => field != v.as_bytes(),
            Predicate::OneOf(set) => match std::str::from_utf8(field) {
                Ok(s) => set.contains(s),
                Err(_) => false,
            },
            Predicate::Custom(f) => f(&String::from_utf8_lossy(field)),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equals(v) => write!(f, "Equals({:?})", v),
            Predicate::NotEquals(v) => write!(f, "NotEquals({:?})", v),
            Predicate::OneOf(set) => {
                let mut values: Vec<_> = set.iter().collect();
                values.sort();
                write!(f, "OneOf({:?})", values)
            }
            Predicate::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equals(v) => write!(f, "== '{}'", v),
            Predicate::NotEquals(v) => write!(f, "!= '{}'", v),
            Predicate::OneOf(set) => {
                let mut values: Vec<_> = set.iter().map(String::as_str).collect();
                values.sort_unstable();
                write!(f, "in [{}]", values.join(", "))
            }
            Predicate::Custom(_) => write!(f, "custom"),
        }
    }
}
