//! Caller-supplied orderings.
//!
//! A [`Comparator`] is a two-argument ordering over [`Value`]s. Plain
//! closures of type `Fn(&Value, &Value) -> Ordering` are comparators; named
//! comparators such as [`FloatComparator`] also describe themselves for
//! diagnostics.

use std::cmp::Ordering;
use std::fmt;

use verity_types::Value;

use crate::error::{PolicyError, PolicyResult};

/// A two-argument ordering over values.
pub trait Comparator: Send + Sync {
    /// Order `left` relative to `right`.
    fn compare(&self, left: &Value, right: &Value) -> PolicyResult<Ordering>;

    /// A short description used in diagnostics.
    fn describe(&self) -> String {
        String::from("custom comparator")
    }
}

impl<F> Comparator for F
where
    F: Fn(&Value, &Value) -> Ordering + Send + Sync,
{
    fn compare(&self, left: &Value, right: &Value) -> PolicyResult<Ordering> {
        Ok(self(left, right))
    }
}

/// Attach a description to any comparator.
pub struct DescribedComparator<C> {
    description: String,
    inner: C,
}

impl<C: Comparator> DescribedComparator<C> {
    pub fn new(description: impl Into<String>, inner: C) -> Self {
        Self {
            description: description.into(),
            inner,
        }
    }
}

impl<C: Comparator> Comparator for DescribedComparator<C> {
    fn compare(&self, left: &Value, right: &Value) -> PolicyResult<Ordering> {
        self.inner.compare(left, right)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

impl<C> fmt::Debug for DescribedComparator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescribedComparator")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Orders numbers, treating two numbers within `precision` of each other as
/// equal.
///
/// Both `Int` and `Float` values are accepted. Bit-identical values and two
/// NaNs are always equal; otherwise values further apart than `precision`
/// are ordered by IEEE total order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatComparator {
    precision: f64,
}

impl FloatComparator {
    /// Default tolerance for double-precision values.
    pub const DEFAULT_PRECISION: f64 = 1e-15;

    /// Create a comparator with the given tolerance.
    ///
    /// Returns [`PolicyError::InvalidPrecision`] for negative or NaN values.
    pub fn new(precision: f64) -> PolicyResult<Self> {
        if precision.is_nan() || precision < 0.0 {
            return Err(PolicyError::InvalidPrecision(precision));
        }
        Ok(Self { precision })
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    fn close_enough(&self, a: f64, b: f64) -> bool {
        a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()) || (a - b).abs() <= self.precision
    }
}

impl Default for FloatComparator {
    fn default() -> Self {
        Self {
            precision: Self::DEFAULT_PRECISION,
        }
    }
}

impl Comparator for FloatComparator {
    fn compare(&self, left: &Value, right: &Value) -> PolicyResult<Ordering> {
        match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) if self.close_enough(a, b) => Ok(Ordering::Equal),
            (Some(a), Some(b)) => Ok(a.total_cmp(&b)),
            _ => Err(PolicyError::NotComparable {
                left: left.type_name().to_string(),
                right: right.type_name().to_string(),
            }),
        }
    }

    fn describe(&self) -> String {
        format!("FloatComparator[precision={}]", self.precision)
    }
}
